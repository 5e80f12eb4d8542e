//! SpaceFOM federate roles.
//!
//! A federate holds independent Master, Pacing and Root Reference Frame
//! Publisher (RRFP) flags. Uniqueness of each role holder is a federation-wide
//! property; see [`crate::FederationAudit`].

use std::{collections::BTreeSet, fmt};

use bitflags::bitflags;

use crate::error::ConfigError;

bitflags! {
    /// Raw role flags carried in a declaration.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RoleFlags: u8 {
        /// Drives mode transitions and owns the execution configuration.
        const MASTER = 0b0000_0001;
        /// Paces the federation against wall-clock time.
        const PACING = 0b0000_0010;
        /// Publishes the root reference frame.
        const RRFP = 0b0000_0100;
    }
}

/// A single role, used for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    /// Master federate.
    Master,
    /// Pacing federate.
    Pacing,
    /// Root Reference Frame Publisher.
    Rrfp,
    /// No special role.
    Other,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Master => "Master",
            Self::Pacing => "Pacing",
            Self::Rrfp => "RRFP",
            Self::Other => "Other",
        };
        f.write_str(name)
    }
}

/// Per-federate role declaration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoleAssignment {
    flags: RoleFlags,
}

impl RoleAssignment {
    /// Create an assignment with no roles (an "Other" federate).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an assignment from raw flags.
    pub fn from_flags(flags: RoleFlags) -> Self {
        Self { flags }
    }

    /// Raw flags.
    pub fn flags(&self) -> RoleFlags {
        self.flags
    }

    /// Set or clear the Master role.
    pub fn set_master_role(&mut self, on: bool) {
        self.flags.set(RoleFlags::MASTER, on);
    }

    /// Set or clear the Pacing role.
    pub fn set_pacing_role(&mut self, on: bool) {
        self.flags.set(RoleFlags::PACING, on);
    }

    /// Set or clear the RRFP role.
    pub fn set_rrfp_role(&mut self, on: bool) {
        self.flags.set(RoleFlags::RRFP, on);
    }

    /// Whether this federate is the Master.
    pub fn is_master(&self) -> bool {
        self.flags.contains(RoleFlags::MASTER)
    }

    /// Whether this federate is the Pacing federate.
    pub fn is_pacing(&self) -> bool {
        self.flags.contains(RoleFlags::PACING)
    }

    /// Whether this federate publishes the root reference frame.
    pub fn is_rrfp(&self) -> bool {
        self.flags.contains(RoleFlags::RRFP)
    }

    /// Roles held, or `{Other}` when no flag is set.
    pub fn effective_role(&self) -> BTreeSet<Role> {
        let mut roles = BTreeSet::new();
        if self.is_master() {
            roles.insert(Role::Master);
        }
        if self.is_pacing() {
            roles.insert(Role::Pacing);
        }
        if self.is_rrfp() {
            roles.insert(Role::Rrfp);
        }
        if roles.is_empty() {
            roles.insert(Role::Other);
        }
        roles
    }

    /// Reject assignments holding more than one role.
    ///
    /// Only applied when a federation opts into strict role checking.
    pub fn check_exclusive(&self) -> Result<(), ConfigError> {
        if self.flags.bits().count_ones() > 1 {
            return Err(ConfigError::RoleConflict { roles: self.to_string() });
        }
        Ok(())
    }
}

impl fmt::Display for RoleAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.effective_role().iter().map(ToString::to_string).collect();
        f.write_str(&names.join("+"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_flags_is_other() {
        let roles = RoleAssignment::new();
        assert_eq!(roles.effective_role(), BTreeSet::from([Role::Other]));
    }

    #[test]
    fn setters_toggle_independently() {
        let mut roles = RoleAssignment::new();
        roles.set_rrfp_role(true);
        roles.set_master_role(true);
        roles.set_master_role(false);

        assert!(roles.is_rrfp());
        assert!(!roles.is_master());
        assert!(!roles.is_pacing());
        assert_eq!(roles.effective_role(), BTreeSet::from([Role::Rrfp]));
    }

    #[test]
    fn combined_roles_are_allowed_locally() {
        let mut roles = RoleAssignment::new();
        roles.set_master_role(true);
        roles.set_rrfp_role(true);

        assert_eq!(roles.effective_role(), BTreeSet::from([Role::Master, Role::Rrfp]));
        insta::assert_snapshot!(roles.to_string(), @"Master+RRFP");
    }

    #[test]
    fn strict_mode_rejects_combinations() {
        let mut roles = RoleAssignment::from_flags(RoleFlags::MASTER | RoleFlags::PACING);
        assert!(matches!(roles.check_exclusive(), Err(ConfigError::RoleConflict { .. })));

        roles.set_pacing_role(false);
        assert!(roles.check_exclusive().is_ok());
        assert!(RoleAssignment::new().check_exclusive().is_ok());
    }
}
