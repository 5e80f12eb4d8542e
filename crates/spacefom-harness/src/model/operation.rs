//! Operations for model-based testing.
//!
//! Operations represent every configuration call a federate can make. They
//! are generated randomly by proptest and applied to both the model and the
//! real `FederateConfig`.

use arbitrary::Arbitrary;
use spacefom_core::{ConfigError, Confirmation, FrameError};

/// Federate identifier (index into [`FEDERATE_NAMES`], modulo its length).
pub type FederateSlot = u8;

/// Frame identifier (index into [`FRAME_NAMES`], modulo its length).
pub type FrameSlot = u8;

/// Federates of the model world.
pub const FEDERATE_NAMES: [&str; 4] = ["Master", "Pacing", "RRFP", "Other"];

/// Frame names operations can refer to.
pub const FRAME_NAMES: [&str; 3] = ["RootFrame", "FrameA", "FrameB"];

/// Granularity of every generated interval, in microseconds.
///
/// A sixteenth of a second is exact in binary, so second-based setters and
/// the model agree on the microsecond value.
pub const STEP_MICROS: i64 = 62_500;

/// Granularity of every generated interval, in seconds.
pub const STEP_SECONDS: f64 = 0.0625;

/// Resolve a federate slot to its name.
pub fn federate_name(slot: FederateSlot) -> &'static str {
    FEDERATE_NAMES[usize::from(slot) % FEDERATE_NAMES.len()]
}

/// Resolve a frame slot to its name.
pub fn frame_name(slot: FrameSlot) -> &'static str {
    FRAME_NAMES[usize::from(slot) % FRAME_NAMES.len()]
}

/// Special roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Arbitrary)]
pub enum ModelRole {
    /// Master.
    Master,
    /// Pacing.
    Pacing,
    /// Root Reference Frame Publisher.
    Rrfp,
}

/// Runtime confirmations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Arbitrary)]
pub enum ModelConfirmation {
    /// Published frame discovered.
    Discovery,
    /// Subscribed frame matched.
    SubscriptionMatch,
}

impl From<ModelConfirmation> for Confirmation {
    fn from(confirmation: ModelConfirmation) -> Self {
        match confirmation {
            ModelConfirmation::Discovery => Self::Discovery,
            ModelConfirmation::SubscriptionMatch => Self::SubscriptionMatch,
        }
    }
}

/// Operations that can be applied to the system.
///
/// Each operation targets one federate of the world. Intervals are counted
/// in steps of [`STEP_MICROS`], so zero exercises the rejection paths.
#[derive(Debug, Clone, Arbitrary)]
pub enum Operation {
    /// Set or clear a role.
    SetRole {
        /// Federate.
        federate: FederateSlot,
        /// Role.
        role: ModelRole,
        /// Set or clear.
        on: bool,
    },

    /// Turn strict roles on or off.
    SetStrictRoles {
        /// Federate.
        federate: FederateSlot,
        /// On or off.
        on: bool,
    },

    /// Enable or disable the federate.
    SetEnabled {
        /// Federate.
        federate: FederateSlot,
        /// On or off.
        on: bool,
    },

    /// Append a known federate.
    AddKnownFederate {
        /// Federate whose list grows.
        federate: FederateSlot,
        /// Federate listed.
        known: FederateSlot,
        /// Whether start-up waits for it.
        required: bool,
    },

    /// Set the lookahead.
    SetLookahead {
        /// Federate.
        federate: FederateSlot,
        /// Lookahead in steps.
        steps: u8,
    },

    /// Set time-regulating.
    SetRegulating {
        /// Federate.
        federate: FederateSlot,
        /// On or off.
        on: bool,
    },

    /// Set time-constrained.
    SetConstrained {
        /// Federate.
        federate: FederateSlot,
        /// On or off.
        on: bool,
    },

    /// Set the least common time step.
    SetLeastCommonTimeStep {
        /// Federate.
        federate: FederateSlot,
        /// Step in steps.
        steps: u8,
    },

    /// Set the mode transition padding.
    SetTimePadding {
        /// Federate.
        federate: FederateSlot,
        /// Padding in steps.
        steps: u8,
    },

    /// Designate the root frame.
    SetRootFrame {
        /// Federate.
        federate: FederateSlot,
        /// Frame.
        frame: FrameSlot,
        /// Publish or subscribe.
        publish: bool,
    },

    /// Add a non-root frame.
    AddFrame {
        /// Federate.
        federate: FederateSlot,
        /// Frame.
        frame: FrameSlot,
        /// Publish or subscribe.
        publish: bool,
    },

    /// Validate, submit and freeze.
    Initialize {
        /// Federate.
        federate: FederateSlot,
    },

    /// Deliver a runtime confirmation for a frame.
    Confirm {
        /// Federate.
        federate: FederateSlot,
        /// Frame.
        frame: FrameSlot,
        /// Confirmation kind.
        confirmation: ModelConfirmation,
    },
}

impl Operation {
    /// Federate the operation targets.
    pub fn federate(&self) -> FederateSlot {
        match self {
            Self::SetRole { federate, .. }
            | Self::SetStrictRoles { federate, .. }
            | Self::SetEnabled { federate, .. }
            | Self::AddKnownFederate { federate, .. }
            | Self::SetLookahead { federate, .. }
            | Self::SetRegulating { federate, .. }
            | Self::SetConstrained { federate, .. }
            | Self::SetLeastCommonTimeStep { federate, .. }
            | Self::SetTimePadding { federate, .. }
            | Self::SetRootFrame { federate, .. }
            | Self::AddFrame { federate, .. }
            | Self::Initialize { federate }
            | Self::Confirm { federate, .. } => *federate,
        }
    }
}

/// Result of applying an operation.
///
/// Used to compare model and real system behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationResult {
    /// Operation succeeded.
    Ok,

    /// Operation failed with expected error.
    Error(OperationError),
}

impl OperationResult {
    /// Check if operation succeeded.
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Check if operation failed.
    pub fn is_err(&self) -> bool {
        !self.is_ok()
    }
}

/// Expected errors that can occur during operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationError {
    /// Mutation after `initialize()`.
    Frozen,
    /// Lookahead rejected.
    InvalidLookahead,
    /// Execution timing rejected.
    InvalidTiming,
    /// Known federate listed twice.
    DuplicateKnownFederate,
    /// Frame name already managed.
    DuplicateFrame,
    /// Root frame already designated.
    RootFrameAlreadySet,
    /// `initialize()` without a root frame.
    MissingRootFrame,
    /// Known list does not name the federate itself.
    SelfNotKnown,
    /// More than one role under strict roles.
    RoleConflict,
    /// Second `initialize()`.
    AlreadyInitialized,
    /// Confirmation before `initialize()`.
    NotInitialized,
    /// Confirmation for a frame the federate does not manage.
    UnknownFrame,
    /// Confirmation through the wrong direction.
    DirectionMismatch,
    /// Confirmation for a frame that is already active.
    InvalidTransition,
    /// Anything the model never produces.
    Unexpected(String),
}

impl From<&ConfigError> for OperationError {
    fn from(err: &ConfigError) -> Self {
        match err {
            ConfigError::Frozen { .. } => Self::Frozen,
            ConfigError::InvalidLookahead { .. } => Self::InvalidLookahead,
            ConfigError::InvalidTiming { .. } => Self::InvalidTiming,
            ConfigError::DuplicateKnownFederate { .. } => Self::DuplicateKnownFederate,
            ConfigError::DuplicateFrame { .. } => Self::DuplicateFrame,
            ConfigError::RootFrameAlreadySet { .. } => Self::RootFrameAlreadySet,
            ConfigError::MissingRootFrame => Self::MissingRootFrame,
            ConfigError::SelfNotKnown { .. } => Self::SelfNotKnown,
            ConfigError::RoleConflict { .. } => Self::RoleConflict,
            ConfigError::AlreadyInitialized => Self::AlreadyInitialized,
            ConfigError::NotInitialized => Self::NotInitialized,
            ConfigError::Frame(FrameError::UnknownFrame { .. }) => Self::UnknownFrame,
            ConfigError::Frame(FrameError::DirectionMismatch { .. }) => Self::DirectionMismatch,
            ConfigError::Frame(FrameError::InvalidTransition { .. }) => Self::InvalidTransition,
            other => Self::Unexpected(other.to_string()),
        }
    }
}

impl From<Result<(), ConfigError>> for OperationResult {
    fn from(result: Result<(), ConfigError>) -> Self {
        match result {
            Ok(()) => Self::Ok,
            Err(e) => Self::Error(OperationError::from(&e)),
        }
    }
}
