use std::sync::Arc;

use anyhow::{Context, Result};
use log::info;

use studyflow::models::DEFAULT_PROFILE_ID;
use studyflow::notify::LogNotifier;
use studyflow::App;

/// Headless runner: a recency-only engine for the default profile, useful
/// for exercising the timer from a terminal. Frontends embed the library
/// and supply their own notifier and classifier instead.
#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    info!("studyflow starting up...");

    let data_dir = dirs::data_dir()
        .context("no platform data directory available")?
        .join("studyflow");

    let app = App::init(&data_dir, DEFAULT_PROFILE_ID, Arc::new(LogNotifier), None).await?;
    app.engine.start().await?;

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;

    app.shutdown().await;
    info!("studyflow stopped");
    Ok(())
}
