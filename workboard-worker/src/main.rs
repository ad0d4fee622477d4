//! # Workboard Worker
//!
//! Runs the daily maintenance job against the Workboard database.
//!
//! ## Usage
//!
//! ```bash
//! # Stay running and fire on MAINTENANCE_SCHEDULE
//! cargo run -p workboard-worker
//!
//! # Run maintenance once and exit
//! cargo run -p workboard-worker -- --once
//! ```

use chrono::Utc;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use workboard_shared::db::{
    migrations::run_migrations,
    pool::{close_pool, create_pool, DatabaseConfig},
};
use workboard_shared::store::PgStore;
use workboard_worker::{
    config::WorkerConfig, jobs::run_maintenance, scheduler::MaintenanceScheduler,
};

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "workboard_worker=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    if std::env::var("LOG_FORMAT").is_ok_and(|format| format == "json") {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = WorkerConfig::from_env()?;
    init_tracing();

    tracing::info!(
        "Workboard Worker v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let pool = create_pool(
        DatabaseConfig::new(config.database_url.clone())
            .with_max_connections(config.max_connections),
    )
    .await?;
    run_migrations(&pool).await?;

    let store = Arc::new(PgStore::new(pool.clone()));

    if std::env::args().skip(1).any(|arg| arg == "--once") {
        let report = run_maintenance(store.as_ref(), Utc::now()).await;
        close_pool(pool).await;

        if !report.is_complete() {
            anyhow::bail!("Maintenance run finished with failed steps");
        }
        return Ok(());
    }

    let scheduler = MaintenanceScheduler::new(store, &config.schedule)?;
    let shutdown = scheduler.shutdown_token();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
        }
        tracing::info!("Shutdown signal received");
        shutdown.cancel();
    });

    tracing::info!(schedule = %config.schedule, "Worker ready");
    let runs = scheduler.run().await;

    close_pool(pool).await;
    tracing::info!(runs, "Worker stopped");

    Ok(())
}
