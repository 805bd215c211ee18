use std::sync::Arc;

use tgf_core::config::Config;
use tgf_http::HttpForwarderApi;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tgf_core::logging::init("tgf")?;

    let cfg = Config::load()?;
    let api = Arc::new(HttpForwarderApi::from_config(&cfg)?);
    tracing::info!(api = %api.base_url(), "forwarding service configured");

    tgf_console::run(&cfg, api).await
}
