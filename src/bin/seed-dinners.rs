//! Example catalog seed script
//!
//! Applies migrations to a Dinnerfy database and inserts the five example
//! dinners if the catalog is empty. A populated catalog is left untouched.
//!
//! Usage:
//!   seed-dinners [--database-url URL]
//!
//! Environment variables:
//!   DATABASE_URL — SQLite connection string (default: sqlite://instance/dinnerfy.db)

use anyhow::Result;
use clap::Parser;

use dinnerfy_api::{db, services::dinners::DinnerService};

#[derive(Parser)]
#[command(name = "seed-dinners", about = "Seed a Dinnerfy database with example dinners")]
struct Args {
    /// SQLite database to seed
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://instance/dinnerfy.db")]
    database_url: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = Args::parse();

    let pool = db::create_pool(&args.database_url, 1).await?;
    db::run_migrations(&pool).await?;

    let inserted = DinnerService::seed_if_empty(&pool).await?;
    if inserted == 0 {
        tracing::info!("{} already has dinners, nothing to seed", args.database_url);
    } else {
        tracing::info!("Seeded {} with {} dinners", args.database_url, inserted);
    }

    Ok(())
}
