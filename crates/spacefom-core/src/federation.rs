//! Federation-level consistency audit.
//!
//! Some invariants span federates: one Master, one Pacing federate, one
//! RRFP, one publisher per frame. No single federate can see the others'
//! declarations, so these are checked here, over a set of declarations
//! gathered by whoever can see the whole federation (a test harness, a
//! launcher, an operator tool). Nothing calls the audit implicitly.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use crate::{
    federate::FederateDeclaration,
    role::{Role, RoleFlags},
};

/// A federation-wide misconfiguration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FederationConsistencyError {
    /// A role that must be unique is held by several federates.
    #[error("role {role} held by multiple federates: {}", .holders.join(", "))]
    DuplicateRoleHolder {
        /// The contested role.
        role: Role,
        /// Federates holding it, sorted.
        holders: Vec<String>,
    },

    /// A frame is published by several federates.
    #[error("frame {frame} published by multiple federates: {}", .publishers.join(", "))]
    DuplicatePublisher {
        /// Frame name.
        frame: String,
        /// Publishing federates, sorted.
        publishers: Vec<String>,
    },

    /// A frame is subscribed but nobody publishes it.
    #[error("frame {frame} has no publisher; subscribed by {}", .subscribers.join(", "))]
    OrphanSubscription {
        /// Frame name.
        frame: String,
        /// Subscribing federates, sorted.
        subscribers: Vec<String>,
    },

    /// A federate requires a peer that is not part of the federation.
    #[error("federate {federate} requires {missing}, which is not in the federation")]
    MissingRequiredFederate {
        /// The waiting federate.
        federate: String,
        /// The absent peer.
        missing: String,
    },

    /// Published frame data names a parent frame nobody declares.
    #[error("frame {frame} has undeclared parent {parent}")]
    UnknownParentFrame {
        /// Child frame.
        frame: String,
        /// Parent frame name.
        parent: String,
    },

    /// Two federates share a name.
    #[error("federate name {name} declared more than once")]
    DuplicateFederate {
        /// The repeated name.
        name: String,
    },

    /// Declarations name different federation executions.
    #[error("federate {federate} declares federation {found}, expected {expected}")]
    FederationMismatch {
        /// The outlier.
        federate: String,
        /// Federation of the first declaration.
        expected: String,
        /// Federation of the outlier.
        found: String,
    },
}

#[derive(Default)]
struct FrameUsage {
    publishers: BTreeSet<String>,
    subscribers: BTreeSet<String>,
}

/// Advisory validator over a set of federate declarations.
pub struct FederationAudit;

impl FederationAudit {
    /// Check a federation and return every finding.
    ///
    /// Disabled declarations are skipped entirely: they neither count as
    /// role holders nor satisfy anyone's requirements. Findings are ordered
    /// by kind, then by name.
    pub fn check(declarations: &[FederateDeclaration]) -> Vec<FederationConsistencyError> {
        let active: Vec<&FederateDeclaration> =
            declarations.iter().filter(|declaration| declaration.enabled).collect();

        let mut findings = Vec::new();
        check_identity(&active, &mut findings);
        check_roles(&active, &mut findings);
        check_frames(&active, &mut findings);
        check_requirements(&active, &mut findings);
        findings
    }

    /// Whether the federation passes the audit.
    pub fn is_consistent(declarations: &[FederateDeclaration]) -> bool {
        Self::check(declarations).is_empty()
    }
}

fn check_identity(
    active: &[&FederateDeclaration],
    findings: &mut Vec<FederationConsistencyError>,
) {
    let mut seen = BTreeSet::new();
    for declaration in active {
        if !seen.insert(declaration.federate.as_str()) {
            findings.push(FederationConsistencyError::DuplicateFederate {
                name: declaration.federate.clone(),
            });
        }
    }

    if let Some((first, rest)) = active.split_first() {
        for declaration in rest.iter().filter(|d| d.federation != first.federation) {
            findings.push(FederationConsistencyError::FederationMismatch {
                federate: declaration.federate.clone(),
                expected: first.federation.clone(),
                found: declaration.federation.clone(),
            });
        }
    }
}

fn check_roles(
    active: &[&FederateDeclaration],
    findings: &mut Vec<FederationConsistencyError>,
) {
    let unique_roles = [
        (Role::Master, RoleFlags::MASTER),
        (Role::Pacing, RoleFlags::PACING),
        (Role::Rrfp, RoleFlags::RRFP),
    ];

    for (role, flag) in unique_roles {
        let mut holders: Vec<String> = active
            .iter()
            .filter(|declaration| declaration.roles.contains(flag))
            .map(|declaration| declaration.federate.clone())
            .collect();

        if holders.len() > 1 {
            holders.sort();
            findings.push(FederationConsistencyError::DuplicateRoleHolder { role, holders });
        }
    }
}

fn check_frames(
    active: &[&FederateDeclaration],
    findings: &mut Vec<FederationConsistencyError>,
) {
    let mut usage: BTreeMap<&str, FrameUsage> = BTreeMap::new();
    for declaration in active {
        for frame in declaration.all_frames() {
            let entry = usage.entry(frame.name.as_str()).or_default();
            if frame.publishes() {
                entry.publishers.insert(declaration.federate.clone());
            } else {
                entry.subscribers.insert(declaration.federate.clone());
            }
        }
    }

    for (frame, entry) in &usage {
        if entry.publishers.len() > 1 {
            findings.push(FederationConsistencyError::DuplicatePublisher {
                frame: (*frame).to_string(),
                publishers: entry.publishers.iter().cloned().collect(),
            });
        }
        if entry.publishers.is_empty() && !entry.subscribers.is_empty() {
            findings.push(FederationConsistencyError::OrphanSubscription {
                frame: (*frame).to_string(),
                subscribers: entry.subscribers.iter().cloned().collect(),
            });
        }
    }

    let mut reported = BTreeSet::new();
    for declaration in active {
        for frame in declaration.all_frames().filter(|frame| frame.publishes()) {
            let Some(parent) = &frame.parent_name else { continue };
            if !usage.contains_key(parent.as_str()) && reported.insert(frame.name.as_str()) {
                findings.push(FederationConsistencyError::UnknownParentFrame {
                    frame: frame.name.clone(),
                    parent: parent.clone(),
                });
            }
        }
    }
}

fn check_requirements(
    active: &[&FederateDeclaration],
    findings: &mut Vec<FederationConsistencyError>,
) {
    let present: BTreeSet<&str> =
        active.iter().map(|declaration| declaration.federate.as_str()).collect();

    for declaration in active {
        for required in declaration.required_federates() {
            if !present.contains(required) {
                findings.push(FederationConsistencyError::MissingRequiredFederate {
                    federate: declaration.federate.clone(),
                    missing: required.to_string(),
                });
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::convert::Infallible;

    use super::*;
    use crate::{
        federate::FederateConfig,
        frame::{PackingHandle, ReferenceFrameObject},
        runtime::FederationRuntime,
    };

    struct Accepting;

    impl FederationRuntime for Accepting {
        type Error = Infallible;

        fn submit(&mut self, _declaration: &FederateDeclaration) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    fn declare(name: &str, rrfp: bool, extra: &[(&str, bool)]) -> FederateDeclaration {
        let mut config = FederateConfig::new("SpaceFOM_Roles_Test", name);
        config.set_rrfp_role(rrfp).unwrap();
        let root = config.new_root_frame("RootFrame", PackingHandle::new(0), "root_ref_frame");
        config.set_root_frame(root).unwrap();
        for (index, (frame, publishes)) in (1u64..).zip(extra) {
            config
                .add_fed_object(ReferenceFrameObject::new(
                    *publishes,
                    *frame,
                    PackingHandle::new(index),
                    format!("{frame}.packing"),
                ))
                .unwrap();
        }
        config.initialize(&mut Accepting).unwrap().clone()
    }

    #[test]
    fn single_publisher_federation_is_consistent() {
        let federation = [
            declare("RRFP", true, &[("FrameA", true)]),
            declare("Other", false, &[("FrameA", false)]),
        ];
        assert!(FederationAudit::is_consistent(&federation));
    }

    #[test]
    fn two_rrfps_are_reported() {
        let federation = [declare("A", true, &[]), declare("B", true, &[])];
        let findings = FederationAudit::check(&federation);

        assert!(findings.contains(&FederationConsistencyError::DuplicateRoleHolder {
            role: Role::Rrfp,
            holders: vec!["A".to_string(), "B".to_string()],
        }));
        assert!(findings.contains(&FederationConsistencyError::DuplicatePublisher {
            frame: "RootFrame".to_string(),
            publishers: vec!["A".to_string(), "B".to_string()],
        }));
    }

    #[test]
    fn subscription_without_publisher_is_orphaned() {
        let federation = [declare("Other", false, &[])];
        assert_eq!(
            FederationAudit::check(&federation),
            vec![FederationConsistencyError::OrphanSubscription {
                frame: "RootFrame".to_string(),
                subscribers: vec!["Other".to_string()],
            }]
        );
    }

    #[test]
    fn disabled_federates_do_not_count() {
        let mut disabled = declare("RRFP", true, &[]);
        disabled.enabled = false;
        let federation = [disabled, declare("Other", false, &[])];
        assert!(!FederationAudit::is_consistent(&federation));
    }

    #[test]
    fn finding_display() {
        let finding = FederationConsistencyError::DuplicateRoleHolder {
            role: Role::Master,
            holders: vec!["Alpha".to_string(), "Bravo".to_string()],
        };
        insta::assert_snapshot!(
            finding.to_string(),
            @"role Master held by multiple federates: Alpha, Bravo"
        );
    }
}
