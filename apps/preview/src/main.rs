use ln_logger::Logger;
use ln_preview::{Preview, PreviewConfig};
use lnkit::kernel::config::load_config;
use tracing::warn;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _log = Logger::builder().name(env!("CARGO_PKG_NAME")).init()?;

    let cfg = load_config::<PreviewConfig>(Some("preview")).unwrap_or_else(|err| {
        warn!(error = %err, "No usable preview config; using defaults");
        PreviewConfig::default()
    });

    Preview::builder().config(cfg).build().run().await
}
