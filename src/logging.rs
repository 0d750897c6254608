use tracing_subscriber::EnvFilter;

/// Sets up the global tracing subscriber with a fmt formatter and env filter.
///
/// `default_filter` is used when `RUST_LOG` is not set, so the binary logs
/// something sensible out of the box.
pub fn init(default_filter: &str) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))
}
