//! Reference frame objects.
//!
//! A reference frame is a named coordinate frame shared across the
//! federation. Exactly one federate publishes it; the rest subscribe.
//!
//! # Lifecycle
//!
//! ```text
//! Configured ──(added to FederateConfig)──▶ Registered ──(runtime confirms)──▶ Active
//! ```
//!
//! A publishing frame is activated only by discovery of its own publication,
//! a subscribing frame only by a subscription match. There are no backward
//! transitions.

use std::fmt;

use thiserror::Error;

use crate::{error::ConfigError, frame_data::RefFrameData};

/// Opaque reference to the externally owned packing state of a frame.
///
/// The configuration model never dereferences it; the runtime resolves it
/// together with the qualified name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PackingHandle(u64);

impl PackingHandle {
    /// Wrap a runtime-assigned handle value.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw handle value.
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Whether this federate owns or mirrors a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// This federate is authoritative for the frame.
    Publish,
    /// This federate mirrors the frame from its publisher.
    Subscribe,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Publish => f.write_str("published"),
            Self::Subscribe => f.write_str("subscribed"),
        }
    }
}

/// Frame lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FrameState {
    /// Constructed, not yet handed to a federate configuration.
    Configured,
    /// Part of a federate configuration, awaiting runtime confirmation.
    Registered,
    /// Confirmed by the runtime.
    Active,
}

impl fmt::Display for FrameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Configured => "CONFIGURED",
            Self::Registered => "REGISTERED",
            Self::Active => "ACTIVE",
        };
        f.write_str(name)
    }
}

/// Runtime confirmation that activates a registered frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Confirmation {
    /// The runtime discovered this federate's own publication.
    Discovery,
    /// The runtime matched this federate's subscription to a publisher.
    SubscriptionMatch,
}

impl Confirmation {
    /// The only frame direction this confirmation may activate.
    pub fn applies_to(self) -> Direction {
        match self {
            Self::Discovery => Direction::Publish,
            Self::SubscriptionMatch => Direction::Subscribe,
        }
    }
}

impl fmt::Display for Confirmation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Discovery => f.write_str("discovery"),
            Self::SubscriptionMatch => f.write_str("subscription match"),
        }
    }
}

/// Errors from frame lifecycle transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// The transition is not part of the lifecycle.
    #[error("frame {frame}: illegal transition {from} -> {to}")]
    InvalidTransition {
        /// Frame name.
        frame: String,
        /// Current state.
        from: FrameState,
        /// Requested state.
        to: FrameState,
    },

    /// A confirmation arrived through the code path of the other direction.
    #[error("frame {frame}: {confirmation} cannot activate a {direction} frame")]
    DirectionMismatch {
        /// Frame name.
        frame: String,
        /// The frame's direction.
        direction: Direction,
        /// The offending confirmation.
        confirmation: Confirmation,
    },

    /// No frame with this name is managed by the configuration.
    #[error("unknown frame: {name}")]
    UnknownFrame {
        /// Requested frame name.
        name: String,
    },
}

/// Frame as it appears in a frozen federate declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameDeclaration {
    /// Frame name.
    pub name: String,
    /// Qualified name used for cross-federate identity matching.
    pub qualified_name: String,
    /// Packing state handle.
    pub packing: PackingHandle,
    /// Publish or subscribe intent.
    pub direction: Direction,
    /// Debug output flag.
    pub debug: bool,
    /// Parent frame named by the initial data, if any.
    pub parent_name: Option<String>,
}

impl FrameDeclaration {
    /// Whether this federate publishes the frame.
    pub fn publishes(&self) -> bool {
        self.direction == Direction::Publish
    }
}

/// A reference frame managed by a federate.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceFrameObject {
    name: String,
    packing: PackingHandle,
    qualified_name: String,
    direction: Direction,
    debug: bool,
    state: FrameState,
    initial_data: Option<RefFrameData>,
}

impl ReferenceFrameObject {
    /// Create a frame in the `Configured` state.
    ///
    /// For the root frame `publishes` is normally the federate's RRFP flag;
    /// for every other frame it is the caller's decision.
    pub fn new(
        publishes: bool,
        name: impl Into<String>,
        packing: PackingHandle,
        qualified_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            packing,
            qualified_name: qualified_name.into(),
            direction: if publishes { Direction::Publish } else { Direction::Subscribe },
            debug: false,
            state: FrameState::Configured,
            initial_data: None,
        }
    }

    /// Attach the data a publisher seeds the frame with.
    #[must_use]
    pub fn with_initial_data(mut self, data: RefFrameData) -> Self {
        self.initial_data = Some(data);
        self
    }

    /// Frame name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Qualified name.
    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    /// Packing state handle.
    pub fn packing(&self) -> PackingHandle {
        self.packing
    }

    /// Publish or subscribe intent.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Whether this federate publishes the frame.
    pub fn publishes(&self) -> bool {
        self.direction == Direction::Publish
    }

    /// Debug output flag.
    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Enable or disable debug output for this frame.
    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    /// Lifecycle state.
    pub fn state(&self) -> FrameState {
        self.state
    }

    /// Whether the runtime has confirmed the frame.
    pub fn is_active(&self) -> bool {
        self.state == FrameState::Active
    }

    /// Initial data, if attached.
    pub fn initial_data(&self) -> Option<&RefFrameData> {
        self.initial_data.as_ref()
    }

    /// Move `Configured -> Registered`.
    pub fn mark_registered(&mut self) -> Result<(), FrameError> {
        self.transition(FrameState::Configured, FrameState::Registered)
    }

    /// Move `Registered -> Active` on a runtime confirmation.
    ///
    /// # Errors
    ///
    /// Returns `FrameError::DirectionMismatch` when the confirmation belongs
    /// to the other direction, and `FrameError::InvalidTransition` when the
    /// frame is not `Registered`. The state is unchanged on error.
    pub fn confirm(&mut self, confirmation: Confirmation) -> Result<(), FrameError> {
        if confirmation.applies_to() != self.direction {
            return Err(FrameError::DirectionMismatch {
                frame: self.name.clone(),
                direction: self.direction,
                confirmation,
            });
        }
        self.transition(FrameState::Registered, FrameState::Active)
    }

    /// Activate a published frame after the runtime discovered it.
    pub fn confirm_discovery(&mut self) -> Result<(), FrameError> {
        self.confirm(Confirmation::Discovery)
    }

    /// Activate a subscribed frame after the runtime matched a publisher.
    pub fn confirm_subscription(&mut self) -> Result<(), FrameError> {
        self.confirm(Confirmation::SubscriptionMatch)
    }

    /// Check initial data against this frame.
    ///
    /// Only publishers seed data. The data must name this frame, a root frame
    /// has no parent, any other frame has one that is not itself, and the
    /// coordinate state must be finite with a unit attitude quaternion.
    pub fn validate_initial_data(&self, is_root: bool) -> Result<(), ConfigError> {
        let Some(data) = &self.initial_data else {
            return Ok(());
        };

        let reason = if !self.publishes() {
            Some("subscribed frames do not carry initial data".to_string())
        } else if data.name != self.name {
            Some(format!("data is for frame {}", data.name))
        } else {
            match (is_root, data.parent_name.as_deref()) {
                (true, Some(parent)) => Some(format!("root frame has parent {parent}")),
                (false, None) => Some("non-root frame has no parent".to_string()),
                (false, Some(parent)) if parent == self.name => {
                    Some("frame is its own parent".to_string())
                },
                _ if !data.state.is_valid() => Some("coordinate state is invalid".to_string()),
                _ => None,
            }
        };

        match reason {
            Some(reason) => Err(ConfigError::InvalidFrameData { frame: self.name.clone(), reason }),
            None => Ok(()),
        }
    }

    /// Snapshot for a frozen declaration.
    pub fn declaration(&self) -> FrameDeclaration {
        FrameDeclaration {
            name: self.name.clone(),
            qualified_name: self.qualified_name.clone(),
            packing: self.packing,
            direction: self.direction,
            debug: self.debug,
            parent_name: self.initial_data.as_ref().and_then(|data| data.parent_name.clone()),
        }
    }

    fn transition(&mut self, from: FrameState, to: FrameState) -> Result<(), FrameError> {
        if self.state != from {
            return Err(FrameError::InvalidTransition {
                frame: self.name.clone(),
                from: self.state,
                to,
            });
        }
        tracing::debug!(frame = %self.name, %from, %to, "reference frame transition");
        self.state = to;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::frame_data::SpaceTimeCoordinate;

    fn frame(publishes: bool) -> ReferenceFrameObject {
        ReferenceFrameObject::new(
            publishes,
            "RootFrame",
            PackingHandle::new(1),
            "root_ref_frame.frame_packing",
        )
    }

    #[test]
    fn new_frame_is_configured() {
        let root = frame(true);
        assert_eq!(root.state(), FrameState::Configured);
        assert!(root.publishes());
        assert!(!frame(false).publishes());
    }

    #[test]
    fn publisher_activates_through_discovery_only() {
        let mut root = frame(true);
        root.mark_registered().unwrap();

        let err = root.confirm_subscription().unwrap_err();
        assert!(matches!(err, FrameError::DirectionMismatch { .. }));
        assert_eq!(root.state(), FrameState::Registered);

        root.confirm_discovery().unwrap();
        assert!(root.is_active());
    }

    #[test]
    fn subscriber_activates_through_subscription_only() {
        let mut mirrored = frame(false);
        mirrored.mark_registered().unwrap();

        assert!(mirrored.confirm_discovery().is_err());
        assert_eq!(mirrored.state(), FrameState::Registered);

        mirrored.confirm_subscription().unwrap();
        assert!(mirrored.is_active());
    }

    #[test]
    fn confirmation_before_registration_is_rejected() {
        let mut root = frame(true);
        let err = root.confirm_discovery().unwrap_err();
        assert_eq!(
            err,
            FrameError::InvalidTransition {
                frame: "RootFrame".to_string(),
                from: FrameState::Configured,
                to: FrameState::Active,
            }
        );
    }

    #[test]
    fn no_backward_or_repeated_transitions() {
        let mut root = frame(true);
        root.mark_registered().unwrap();
        assert!(root.mark_registered().is_err());

        root.confirm_discovery().unwrap();
        assert!(root.confirm_discovery().is_err());
        assert!(root.mark_registered().is_err());
        assert_eq!(root.state(), FrameState::Active);
    }

    #[test]
    fn error_display() {
        let mut mirrored = frame(false);
        mirrored.mark_registered().unwrap();
        let err = mirrored.confirm_discovery().unwrap_err();
        insta::assert_snapshot!(
            err.to_string(),
            @"frame RootFrame: discovery cannot activate a subscribed frame"
        );
    }

    #[test]
    fn initial_data_checks() {
        let root = frame(true)
            .with_initial_data(RefFrameData::root("RootFrame", SpaceTimeCoordinate::IDENTITY));
        assert!(root.validate_initial_data(true).is_ok());
        assert!(root.validate_initial_data(false).is_err());

        let misnamed = frame(true)
            .with_initial_data(RefFrameData::root("Other", SpaceTimeCoordinate::IDENTITY));
        assert!(misnamed.validate_initial_data(true).is_err());

        let subscriber = frame(false)
            .with_initial_data(RefFrameData::root("RootFrame", SpaceTimeCoordinate::IDENTITY));
        assert!(subscriber.validate_initial_data(true).is_err());
    }

    #[test]
    fn declaration_carries_parent() {
        let child = ReferenceFrameObject::new(true, "FrameA", PackingHandle::new(2), "ref_frame_A")
            .with_initial_data(RefFrameData::child(
                "FrameA",
                "RootFrame",
                SpaceTimeCoordinate::at_position([10.0, 10.0, 10.0]),
            ));

        let declaration = child.declaration();
        assert!(declaration.publishes());
        assert_eq!(declaration.parent_name.as_deref(), Some("RootFrame"));
    }
}
