use crate::{Error, Result};

/// Initialize logging/tracing for the client.
///
/// Logs go to stderr so they never interleave with the console's stdout view.
pub fn init(service_name: &str) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    // Default: info for our crates, warn for everything else.
    // Can be overridden with `RUST_LOG`.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,tgf=info,tgf_core=info,tgf_http=info,tgf_console=info,{service_name}=info"
        ))
    });

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| Error::External(format!("logging init failed: {e}")))
}
