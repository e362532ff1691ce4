//! # Database Persistence Layer
//!
//! Optional Postgres persistence via SQLx. When a database URL is
//! configured, grievances and their comments are written through after each
//! accepted mutation and loaded back into the in-memory store on startup.
//! Without one, the API runs in-memory only (development and tests).

pub mod grievances;

use sqlx::postgres::{PgPool, PgPoolOptions};

/// Connect to Postgres and run embedded migrations.
///
/// Returns `None` if no URL is configured (in-memory-only mode).
/// Returns `Err` if the URL is set but the connection or migration fails.
pub async fn init_pool(database_url: Option<&str>) -> Result<Option<PgPool>, sqlx::Error> {
    let url = match database_url {
        Some(url) => url,
        None => {
            tracing::warn!(
                "DATABASE_URL not set, running in-memory only mode. \
                 State will not survive restarts."
            );
            return Ok(None);
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(url)
        .await?;

    tracing::info!("Connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(Some(pool))
}
