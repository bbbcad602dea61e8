//! Embedded schema migrations.

use diesel::Connection;
use diesel::pg::PgConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::info;

use crate::domain::ports::UserPersistenceError;

/// Migrations compiled from the `backend/migrations` directory.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

fn run_blocking(database_url: &str) -> Result<Vec<String>, UserPersistenceError> {
    let mut conn = PgConnection::establish(database_url)
        .map_err(|err| UserPersistenceError::connection(err.to_string()))?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|err| UserPersistenceError::query(format!("migration failed: {err}")))?;
    Ok(applied.iter().map(ToString::to_string).collect())
}

/// Apply every pending migration.
///
/// Diesel migrations need a synchronous connection, so the work runs on the
/// blocking pool.
pub async fn run_pending_migrations(database_url: &str) -> Result<(), UserPersistenceError> {
    let url = database_url.to_owned();
    let applied = tokio::task::spawn_blocking(move || run_blocking(&url))
        .await
        .map_err(|err| UserPersistenceError::query(format!("migration task failed: {err}")))??;
    if applied.is_empty() {
        info!("database schema up to date");
    } else {
        info!(migrations = ?applied, "applied database migrations");
    }
    Ok(())
}
