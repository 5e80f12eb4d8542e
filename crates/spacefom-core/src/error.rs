//! Configuration error types.

use thiserror::Error;

use crate::frame::FrameError;

/// Errors raised while assembling or initializing a federate configuration.
///
/// Every variant is fatal: the federate must not hand control to the
/// federation runtime while any of these is outstanding.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Lookahead is negative, not finite, or zero on a regulating federate.
    #[error("invalid lookahead {seconds}s: {reason}")]
    InvalidLookahead {
        /// Requested lookahead in seconds.
        seconds: f64,
        /// Why the value was rejected.
        reason: &'static str,
    },

    /// `initialize()` was called without a root reference frame.
    #[error("root reference frame not set")]
    MissingRootFrame,

    /// A second root frame was offered.
    #[error("root reference frame already set to {existing}")]
    RootFrameAlreadySet {
        /// Name of the root frame already in place.
        existing: String,
    },

    /// Two known-federate entries share a name.
    #[error("duplicate known federate: {name}")]
    DuplicateKnownFederate {
        /// The repeated federate name.
        name: String,
    },

    /// Two reference frames share a name.
    #[error("duplicate reference frame: {name}")]
    DuplicateFrame {
        /// The repeated frame name.
        name: String,
    },

    /// Two simulation objects share a name.
    #[error("duplicate sim object: {name}")]
    DuplicateSimObject {
        /// The repeated sim object name.
        name: String,
    },

    /// A name was empty.
    #[error("empty {what} name")]
    EmptyName {
        /// What kind of name was empty.
        what: &'static str,
    },

    /// The known federate list is non-empty but does not list this federate.
    #[error("federate {federate} is missing from its own known federate list")]
    SelfNotKnown {
        /// This federate's name.
        federate: String,
    },

    /// Strict role mode is on and the federate holds more than one role.
    #[error("federate holds multiple roles in strict mode: {roles}")]
    RoleConflict {
        /// The combined roles.
        roles: String,
    },

    /// Execution timing parameters are inconsistent.
    #[error("invalid execution timing: {reason}")]
    InvalidTiming {
        /// Description of the violated constraint.
        reason: String,
    },

    /// Initial frame data does not match its frame.
    #[error("invalid frame data for {frame}: {reason}")]
    InvalidFrameData {
        /// Frame the data was attached to.
        frame: String,
        /// Description of the mismatch.
        reason: String,
    },

    /// A setter was called after `initialize()`.
    #[error("configuration is frozen: {operation} rejected after initialize()")]
    Frozen {
        /// The rejected operation.
        operation: &'static str,
    },

    /// `initialize()` was called a second time.
    #[error("initialize() already called")]
    AlreadyInitialized,

    /// An operation that needs a frozen configuration ran before
    /// `initialize()`.
    #[error("configuration not initialized")]
    NotInitialized,

    /// The federation runtime refused the declaration.
    #[error("runtime rejected declaration: {reason}")]
    Rejected {
        /// Runtime-supplied reason.
        reason: String,
    },

    /// A reference frame refused a lifecycle transition.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),
}
