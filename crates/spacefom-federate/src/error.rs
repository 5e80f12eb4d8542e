//! Federate error types.

use std::fmt;

use spacefom_core::{ConfigError, DiscoveryTimeoutError, StartupError};

use crate::loopback::LoopbackError;

/// Errors that can end a federate run.
#[derive(Debug)]
pub enum FederateError {
    /// Invalid command-line options
    Options(String),

    /// Configuration was rejected before or at `initialize()`
    Config(ConfigError),

    /// The start-up barrier failed
    Startup(StartupError),

    /// Required federates or frames did not show up in time
    Timeout(DiscoveryTimeoutError),

    /// The operator stopped the federate during start-up
    Cancelled(String),

    /// The RTI connection failed
    Rti(LoopbackError),
}

impl FederateError {
    /// Whether this run ended because the operator asked it to.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}

impl fmt::Display for FederateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Options(msg) => write!(f, "invalid options: {msg}"),
            Self::Config(err) => write!(f, "configuration error: {err}"),
            Self::Startup(err) => write!(f, "start-up error: {err}"),
            Self::Timeout(err) => write!(f, "{err}"),
            Self::Cancelled(reason) => write!(f, "start-up cancelled: {reason}"),
            Self::Rti(err) => write!(f, "RTI error: {err}"),
        }
    }
}

impl std::error::Error for FederateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Startup(err) => Some(err),
            Self::Timeout(err) => Some(err),
            Self::Rti(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ConfigError> for FederateError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<StartupError> for FederateError {
    fn from(err: StartupError) -> Self {
        Self::Startup(err)
    }
}

impl From<DiscoveryTimeoutError> for FederateError {
    fn from(err: DiscoveryTimeoutError) -> Self {
        Self::Timeout(err)
    }
}

impl From<LoopbackError> for FederateError {
    fn from(err: LoopbackError) -> Self {
        Self::Rti(err)
    }
}

#[cfg(test)]
mod tests {
    use std::{error::Error, time::Duration};

    use super::*;

    #[test]
    fn timeout_keeps_source() {
        let err = FederateError::from(DiscoveryTimeoutError {
            missing_federates: vec!["Pacing".to_string()],
            inactive_frames: Vec::new(),
            waited: Duration::from_secs(1),
        });
        assert!(err.source().is_some());
        assert!(!err.is_cancellation());
    }

    #[test]
    fn rti_failure_keeps_source() {
        let err = FederateError::from(LoopbackError::NotJoined);
        assert_eq!(err.to_string(), "RTI error: no declaration submitted, federate has not joined");
        assert!(err.source().is_some());
    }

    #[test]
    fn config_display() {
        let err = FederateError::from(ConfigError::MissingRootFrame);
        assert_eq!(err.to_string(), "configuration error: root reference frame not set");
    }
}
