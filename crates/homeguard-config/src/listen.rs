use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// TCP address the command listener binds to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ListenAddress {
    host: String,
    port: u16,
}

impl ListenAddress {
    /// Builds an address from a host name (or IP literal) and port.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Host name or IP literal.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Port number; `0` asks the OS for an ephemeral port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for ListenAddress {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(formatter, "[{}]:{}", self.host, self.port)
        } else {
            write!(formatter, "{}:{}", self.host, self.port)
        }
    }
}

impl FromStr for ListenAddress {
    type Err = ListenAddressParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let (host, port) = input
            .rsplit_once(':')
            .ok_or_else(|| ListenAddressParseError::MissingPort(input.to_owned()))?;
        let host = host.trim_start_matches('[').trim_end_matches(']');
        if host.is_empty() {
            return Err(ListenAddressParseError::MissingHost(input.to_owned()));
        }
        let port = port
            .parse::<u16>()
            .map_err(|_| ListenAddressParseError::InvalidPort(port.to_owned()))?;
        Ok(Self::new(host, port))
    }
}

/// Errors encountered while parsing a [`ListenAddress`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ListenAddressParseError {
    /// No `:port` suffix was present.
    #[error("missing port in '{0}'")]
    MissingPort(String),
    /// The host portion was empty.
    #[error("missing host in '{0}'")]
    MissingHost(String),
    /// The port was not a number in `0..=65535`.
    #[error("invalid port '{0}'")]
    InvalidPort(String),
}
