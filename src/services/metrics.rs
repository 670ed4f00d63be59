use lazy_static::lazy_static;
use prometheus::{register_int_counter, IntCounter};

lazy_static! {
    // ── Event counters (increment on each event) ────────────────────────────
    pub static ref DINNERS_CREATED_COUNTER: IntCounter = register_int_counter!(
        "api_dinners_created_total",
        "Dinners created through the API"
    ).unwrap();

    pub static ref DINNERS_DELETED_COUNTER: IntCounter = register_int_counter!(
        "api_dinners_deleted_total",
        "Dinners deleted through the API"
    ).unwrap();

    pub static ref DINNERS_SEEDED_COUNTER: IntCounter = register_int_counter!(
        "api_dinners_seeded_total",
        "Example dinners inserted into an empty catalog"
    ).unwrap();

    pub static ref ASSIGNMENTS_WRITTEN_COUNTER: IntCounter = register_int_counter!(
        "api_assignments_written_total",
        "Assignments created or reassigned"
    ).unwrap();

    pub static ref ASSIGNMENTS_DELETED_COUNTER: IntCounter = register_int_counter!(
        "api_assignments_deleted_total",
        "Assignments removed by date, clear or dinner deletion"
    ).unwrap();
}
