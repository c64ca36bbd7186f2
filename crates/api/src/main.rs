//! Sentinel - Main Entry Point

use api::{init_logging, init_metrics, run_server};
use pipeline::Settings;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load()?;
    init_logging(&settings.log_level, settings.log_format)?;
    let metrics = init_metrics()?;

    info!("=== Sentinel v{} ===", env!("CARGO_PKG_VERSION"));
    info!("Model backend: {:?}", settings.model.backend);

    run_server(settings, Some(metrics)).await
}
