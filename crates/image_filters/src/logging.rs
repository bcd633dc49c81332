use tracing_subscriber::EnvFilter;

pub const DEFAULT_LOG_DIRECTIVES: &str = "info";

/// `RUST_LOG` directives when set and valid, `info` otherwise
pub fn env_filter() -> EnvFilter {
    env_filter_from(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref())
}

pub fn env_filter_from(directives: Option<&str>) -> EnvFilter {
    directives
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_DIRECTIVES))
}
