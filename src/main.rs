mod app;
mod audio;
mod config;
mod error;
mod messages;
mod platform;
mod services;

use app::App;
use config::Config;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting pitchfx");

    let config = Config::load()?;
    config.validate()?;

    // Capture streams and output sinks are !Send, so everything runs on one LocalSet
    let local = tokio::task::LocalSet::new();

    local
        .run_until(async move { App::new(config)?.run().await })
        .await
}
