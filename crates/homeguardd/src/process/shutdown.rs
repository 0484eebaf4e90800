//! Signal handling that ends the server's main loop.
//!
//! The main thread parks in [`ShutdownSignal::wait`] while the accept and
//! session threads serve clients. Once it returns, the launcher closes the
//! server, which disconnects every client and joins their threads.

use std::io;

use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::Signals;
use signal_hook::low_level::signal_name;
use thiserror::Error;
use tracing::info;

use super::PROCESS_TARGET;

/// Signals that stop the server.
pub const TERMINATION_SIGNALS: [i32; 4] = [SIGTERM, SIGINT, SIGQUIT, SIGHUP];

/// Parks the caller until the server should stop serving clients.
pub trait ShutdownSignal: Send + Sync {
    /// Returns once clients should be disconnected.
    ///
    /// # Errors
    ///
    /// Returns [`ShutdownError`] if the notification mechanism fails.
    fn wait(&self) -> Result<(), ShutdownError>;
}

/// Errors reported while waiting for a stop request.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Installing signal handlers failed.
    #[error("failed to install signal handlers: {source}")]
    Install {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The signal stream closed without delivering a signal.
    #[error("signal stream closed before a termination signal arrived")]
    StreamClosed,
}

/// Stops the server on any of [`TERMINATION_SIGNALS`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemShutdownSignal;

impl ShutdownSignal for SystemShutdownSignal {
    fn wait(&self) -> Result<(), ShutdownError> {
        let mut signals =
            Signals::new(TERMINATION_SIGNALS).map_err(|source| ShutdownError::Install { source })?;
        let signal = signals
            .forever()
            .next()
            .ok_or(ShutdownError::StreamClosed)?;
        info!(
            target: PROCESS_TARGET,
            signal,
            name = signal_name(signal).unwrap_or("unknown"),
            "termination signal received, disconnecting clients"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn termination_signals_have_names() {
        let names: Vec<_> = TERMINATION_SIGNALS
            .iter()
            .map(|signal| signal_name(*signal))
            .collect();
        assert_eq!(
            names,
            [Some("SIGTERM"), Some("SIGINT"), Some("SIGQUIT"), Some("SIGHUP")]
        );
    }
}
