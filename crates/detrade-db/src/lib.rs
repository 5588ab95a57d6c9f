pub mod errors;
pub mod models;
pub mod pool;
pub mod schema;
pub mod store;

use deadpool_diesel::postgres::{Manager, Pool};
use deadpool_diesel::Runtime;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

pub use errors::{DatabaseError, ErrorKind};
pub use pool::DetradePool;
pub use store::{
    EventFilter, EventStore, InMemoryEventStore, InMemoryVaultRegistry, PostgresStore, VaultRegistry,
};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub fn init_pool(app_name: &str, database_url: &str) -> Result<Pool, ErrorKind> {
    let manager = Manager::new(database_url, Runtime::Tokio1);

    let pool = Pool::builder(manager)
        .build()
        .map_err(|e| ErrorKind::Pool(format!("{app_name}: {e}")))?;

    tracing::info!(app_name, "Database pool initialized");
    Ok(pool)
}

pub async fn run_migrations(pool: &Pool) -> Result<(), ErrorKind> {
    let conn = pool
        .get()
        .await
        .map_err(|e| ErrorKind::Migration(e.to_string()))?;

    let applied = conn
        .interact(|conn| {
            conn.run_pending_migrations(MIGRATIONS)
                .map(|versions| versions.len())
                .map_err(|e| e.to_string())
        })
        .await
        .map_err(|e| ErrorKind::Migration(e.to_string()))?
        .map_err(ErrorKind::Migration)?;

    tracing::info!(applied, "Database migrations up to date");
    Ok(())
}
