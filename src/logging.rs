use tracing_subscriber::EnvFilter;

/// `RUST_LOG` wins when set; otherwise the settings debug flag picks the
/// default level.
pub fn init(debug: bool) {
    let fallback = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
