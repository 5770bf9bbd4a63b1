//! Configuration loading and resolution.

/// Environment variable consulted for the log filter.
pub const LOG_ENV: &str = "LSPKIT_LOG";

pub const DEFAULT_LOG_FILTER: &str = "info";

/// Resolve the tracing filter directive: explicit flag, then `LSPKIT_LOG`,
/// then `info`.
pub fn resolve_log_filter(explicit: Option<&str>) -> String {
    resolve_log_filter_from(explicit, std::env::var(LOG_ENV).ok())
}

fn resolve_log_filter_from(explicit: Option<&str>, env: Option<String>) -> String {
    if let Some(filter) = explicit.filter(|f| !f.trim().is_empty()) {
        return filter.to_string();
    }

    if let Some(filter) = env.filter(|f| !f.trim().is_empty()) {
        return filter;
    }

    DEFAULT_LOG_FILTER.to_string()
}

/// What the server reports about itself in the `initialize` result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub name: String,
    pub version: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: Some(env!("CARGO_PKG_VERSION").to_string()),
        }
    }
}
