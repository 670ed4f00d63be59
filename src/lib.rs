// Library exports for the API binary, tools and tests
pub mod config;
pub mod db;
pub mod models;
pub mod routes;
pub mod services;

use sqlx::SqlitePool;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
}
