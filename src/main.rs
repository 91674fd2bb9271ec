//! Proxypool - Entry Point
//!
//! Opens and migrates the proxy store, then reports the state of the pool.

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use proxypool::{Config, Database, ProxyStore};

#[tokio::main]
async fn main() -> proxypool::Result<()> {
    // Load configuration before logging so LOG_LEVEL/LOG_FORMAT apply
    let config = Config::from_env()?;
    init_tracing(&config);

    info!("Starting proxypool");

    // A store that cannot be opened or migrated is fatal
    let db = Database::new(&config).await?;
    db.run_migrations().await?;

    let latency = db.health_check().await?;
    let stats = db.pool_stats();
    info!(?latency, size = stats.size, idle = stats.idle, "Database healthy");

    let store = ProxyStore::new(db.pool().clone());
    let summary = store.summary().await?;
    info!(
        total = summary.total,
        available = summary.available,
        bypass = summary.bypass,
        "Proxy pool loaded"
    );

    let strategy = config.selection.strategy;
    let region = config.selection.region;
    match store.select(strategy, region).await {
        Ok(url) => info!(strategy = %strategy, region = %region, url = %url, "Next proxy"),
        Err(e) if e.is_empty_pool() => {
            warn!(strategy = %strategy, region = %region, "No eligible proxy in pool")
        }
        Err(e) => return Err(e),
    }

    db.close().await;
    info!("Proxypool stopped");
    Ok(())
}

fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("proxypool={}", config.log.level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if config.json_logs() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer().pretty()).init();
    }
}
