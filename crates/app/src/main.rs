use std::sync::Arc;

use migration::{Migrator, MigratorTrait};
use settings::Database;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "spendcap={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let db = parse_database(&settings.database).await?;
    let clock = settings.engine.clock()?;
    tracing::info!(timezone = ?clock.timezone(), "using system clock");

    let engine = engine::Engine::builder()
        .database(db)
        .clock(Arc::new(clock))
        .lock_timeout(settings.engine.lock_timeout())
        .retry_policy(settings.engine.retry_policy())
        .build()
        .await?;

    let mut tasks =
        engine::Scheduler::new(Arc::new(engine), settings.scheduler.config()).spawn();
    if tasks.is_empty() {
        tracing::warn!("every sweep is disabled, nothing to schedule");
    }

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(err) = result {
                tracing::error!("failed to listen for shutdown signal: {err}");
            }
            tracing::info!("shutting down");
        }
        Some(result) = tasks.join_next() => {
            if let Err(err) = result {
                tracing::error!("scheduler task stopped: {err}");
            }
        }
    }
    tasks.shutdown().await;

    Ok(())
}

async fn parse_database(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    tracing::info!("database ready");
    Ok(database)
}
