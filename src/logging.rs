use tracing_subscriber::EnvFilter;

/// Installs the tracing subscriber, defaulting to `info` when `RUST_LOG` is
/// unset. Safe to call when the embedding host already installed one.
pub fn init() {
    let result = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .try_init();
    if result.is_err() {
        // tracing was already initialised; continue silently
    }
}
