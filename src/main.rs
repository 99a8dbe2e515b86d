use color_eyre::eyre::Result;
use dotenv::dotenv;
use shiftboard_api::config::ApiConfig;
use shiftboard_db::{create_pool, schema::initialize_database};
use tracing::info;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    dotenv().ok();

    let config = ApiConfig::from_env()?;
    tracing::subscriber::set_global_default(
        FmtSubscriber::builder()
            .with_max_level(config.log_level)
            .finish(),
    )?;

    info!(
        "Starting {} {} on {} (CORS origins: {})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        config.server_addr(),
        config
            .cors_origins
            .as_ref()
            .map(|origins| origins.join(", "))
            .unwrap_or_else(|| "none".to_string())
    );

    let db_pool = create_pool(&config.database_url).await?;
    initialize_database(&db_pool).await?;
    info!("Database schema ready");

    shiftboard_api::start_server(config, db_pool).await?;

    Ok(())
}
