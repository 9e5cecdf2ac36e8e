use anyhow::Result;
use rollcalld::config::Config;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "rollcalld starting");

    let config = Config::load()?;
    tracing::debug!(
        addr = %config.addr,
        data_dir = %config.data_dir.display(),
        present_threshold = config.present_threshold,
        face_present_threshold = config.face_present_threshold,
        "configuration loaded"
    );

    rollcalld::run(config).await
}
