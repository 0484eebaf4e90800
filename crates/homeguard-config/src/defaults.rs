use crate::logging::LogFormat;

/// Interface bound when no host is configured.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Port the original home controller clients connect to.
pub const DEFAULT_PORT: u16 = 12345;

/// Default log filter expression used by the server.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Owned default host, used where serde needs an allocation.
#[must_use]
pub fn default_host() -> String {
    DEFAULT_HOST.to_owned()
}

/// Default listener port.
#[must_use]
pub const fn default_port() -> u16 {
    DEFAULT_PORT
}

/// Default log filter expression.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Default logging format.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}
