use anyhow::Result;

use rship_matrix_panel::{Config, MatrixPanelService};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize logger
    env_logger::init();

    let config = Config::from_env()?;

    log::info!("Starting rship-matrix-panel executor");
    log::info!("Videohub: {}:{}", config.videohub_host, config.videohub_port);
    log::info!("Rship: {}:{}", config.rship_address, config.rship_port);

    let service = MatrixPanelService::new(config).await?;
    service.start().await?;

    Ok(())
}
