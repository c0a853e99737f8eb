use std::error::Error;
use std::sync::Arc;

use rental_marketplace::config::AppConfig;
use rental_marketplace::store::{MemoryStore, PgStore, Store};
use rental_marketplace::{db, router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let config = AppConfig::load()?;
    log::info!("Loaded config: {:?}", config);

    let store: Arc<dyn Store> = match &config.database_url {
        Some(url) => {
            let pool = db::establish_pool(url, config.database_pool_size)?;
            db::run_migrations(&pool)?;
            Arc::new(PgStore::new(pool))
        }
        None => {
            log::warn!("DATABASE_URL is not set; using the in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    let addr = format!("{}:{}", config.host, config.port);
    let app = router(AppState::new(config, store));

    log::info!("Server running on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
