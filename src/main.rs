use smoothie_order::config::AppConfig;
use smoothie_order::lifecycle::{setup_tracing, OrderService};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    let config = AppConfig::load().map_err(|e| {
        error!(error = %e, "Configuration rejected");
        e.to_string()
    })?;
    info!(bind = %config.server.bind, "Starting smoothie order form");

    let service = OrderService::new(&config).map_err(|e| e.to_string())?;
    service.warm_up().await;
    service.run().await.map_err(|e| e.to_string())?;

    info!("Stopped");
    Ok(())
}
