pub mod assignments;
pub mod dinners;
pub mod metrics;
