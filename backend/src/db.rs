use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PoolError};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

pub type PgPool = Pool<ConnectionManager<PgConnection>>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub fn establish_pool(database_url: &str, max_size: u32) -> Result<PgPool, PoolError> {
    log::info!("Opening database pool with up to {} connections", max_size);
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    match Pool::builder().max_size(max_size).build(manager) {
        Ok(pool) => {
            log::info!("Database connection established successfully");
            Ok(pool)
        }
        Err(e) => {
            log::error!("Failed to establish database connection: {}", e);
            Err(e)
        }
    }
}

/// Applies any migration the database has not seen yet.
pub fn run_migrations(pool: &PgPool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut conn = pool.get()?;
    let applied = conn.run_pending_migrations(MIGRATIONS)?;
    for version in applied {
        log::info!("Applied migration {}", version);
    }
    Ok(())
}
