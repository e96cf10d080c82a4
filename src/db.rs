use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;
use tracing::{info, instrument};
use crate::configuration::Settings;

#[instrument(skip(settings))]
pub async fn init_db(settings: &Settings) -> anyhow::Result<DatabaseConnection> {
    info!("configuring database connection");

    let mut options = ConnectOptions::new(settings.database_url.clone());
    options
        .max_connections(settings.db_max_connections)
        .min_connections(settings.db_min_connections)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(300))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Debug);

    let db = Database::connect(options).await?;
    info!("database connection established");

    Ok(db)
}
