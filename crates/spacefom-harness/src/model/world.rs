//! Model world - one model federate per slot.
//!
//! The world is the top-level container that routes operations to model
//! federates. It's the oracle against which the real configuration model is
//! verified.

use super::{
    federate::{ModelFederate, ModelFrame},
    operation::{FEDERATE_NAMES, Operation, OperationResult, federate_name, frame_name},
};

/// Observable state of one federate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FederateState {
    /// Whether `initialize()` succeeded.
    pub initialized: bool,
    /// (master, pacing, rrfp).
    pub roles: (bool, bool, bool),
    /// Known federates with their required flags.
    pub known: Vec<(String, bool)>,
    /// Lookahead in microseconds.
    pub lookahead: i64,
    /// (regulating, constrained).
    pub time_flags: (bool, bool),
    /// Least common time step in microseconds.
    pub least_common_time_step: Option<i64>,
    /// Effective padding in microseconds.
    pub padding: i64,
    /// Root frame.
    pub root: Option<ModelFrame>,
    /// Non-root frames.
    pub frames: Vec<ModelFrame>,
}

/// Observable state for oracle comparison.
///
/// This is the subset of world state that can be compared
/// against the real implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservableState {
    /// Per-federate state, indexed like [`FEDERATE_NAMES`].
    pub federates: Vec<FederateState>,
}

/// Model world - the reference implementation.
#[derive(Debug, Clone)]
pub struct ModelWorld {
    federates: Vec<ModelFederate>,
}

impl Default for ModelWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelWorld {
    /// One fresh model federate per name in [`FEDERATE_NAMES`].
    pub fn new() -> Self {
        Self { federates: FEDERATE_NAMES.iter().map(|name| ModelFederate::new(name)).collect() }
    }

    /// Get a federate by name.
    pub fn federate(&self, name: &str) -> Option<&ModelFederate> {
        self.federates.iter().find(|federate| federate.name() == name)
    }

    /// Apply an operation and return the result.
    ///
    /// This is the main entry point for model-based testing.
    /// The result should match the real implementation's result.
    pub fn apply(&mut self, op: &Operation) -> OperationResult {
        let name = federate_name(op.federate());
        let Some(federate) = self.federates.iter_mut().find(|federate| federate.name() == name)
        else {
            return OperationResult::Ok;
        };

        match op {
            Operation::SetRole { role, on, .. } => federate.set_role(*role, *on),
            Operation::SetStrictRoles { on, .. } => federate.set_strict_roles(*on),
            Operation::SetEnabled { on, .. } => federate.set_enabled(*on),
            Operation::AddKnownFederate { known, required, .. } => {
                federate.add_known_federate(federate_name(*known), *required)
            },
            Operation::SetLookahead { steps, .. } => federate.set_lookahead(*steps),
            Operation::SetRegulating { on, .. } => federate.set_regulating(*on),
            Operation::SetConstrained { on, .. } => federate.set_constrained(*on),
            Operation::SetLeastCommonTimeStep { steps, .. } => {
                federate.set_least_common_time_step(*steps)
            },
            Operation::SetTimePadding { steps, .. } => federate.set_time_padding(*steps),
            Operation::SetRootFrame { frame, publish, .. } => {
                federate.set_root_frame(frame_name(*frame), *publish)
            },
            Operation::AddFrame { frame, publish, .. } => {
                federate.add_frame(frame_name(*frame), *publish)
            },
            Operation::Initialize { .. } => federate.initialize(),
            Operation::Confirm { frame, confirmation, .. } => {
                federate.confirm(frame_name(*frame), *confirmation)
            },
        }
    }

    /// Extract observable state for comparison.
    pub fn observable_state(&self) -> ObservableState {
        let federates = self
            .federates
            .iter()
            .map(|federate| FederateState {
                initialized: federate.is_initialized(),
                roles: federate.roles(),
                known: federate.known().to_vec(),
                lookahead: federate.lookahead(),
                time_flags: federate.time_flags(),
                least_common_time_step: federate.least_common_time_step(),
                padding: federate.padding(),
                root: federate.root().cloned(),
                frames: federate.frames().to_vec(),
            })
            .collect();

        ObservableState { federates }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::operation::{ModelConfirmation, ModelRole, OperationError};

    const RRFP: u8 = 2;

    #[test]
    fn rrfp_initializes_and_activates() {
        let mut world = ModelWorld::new();
        let ops = [
            Operation::SetRole { federate: RRFP, role: ModelRole::Rrfp, on: true },
            Operation::SetRootFrame { federate: RRFP, frame: 0, publish: true },
            Operation::AddFrame { federate: RRFP, frame: 1, publish: true },
            Operation::Initialize { federate: RRFP },
            Operation::Confirm {
                federate: RRFP,
                frame: 0,
                confirmation: ModelConfirmation::Discovery,
            },
        ];
        for op in &ops {
            assert_eq!(world.apply(op), OperationResult::Ok, "{op:?}");
        }

        let state = world.observable_state();
        let rrfp = &state.federates[usize::from(RRFP)];
        assert!(rrfp.initialized);
        assert_eq!(rrfp.root, Some(("RootFrame".to_string(), true, true)));
        assert_eq!(rrfp.frames, vec![("FrameA".to_string(), true, false)]);
    }

    #[test]
    fn mutation_after_initialize_is_frozen() {
        let mut world = ModelWorld::new();
        world.apply(&Operation::SetRootFrame { federate: 3, frame: 0, publish: false });
        assert!(world.apply(&Operation::Initialize { federate: 3 }).is_ok());

        let result = world.apply(&Operation::SetLookahead { federate: 3, steps: 4 });
        assert_eq!(result, OperationResult::Error(OperationError::Frozen));
    }

    #[test]
    fn master_needs_a_time_step() {
        let mut world = ModelWorld::new();
        world.apply(&Operation::SetRole { federate: 0, role: ModelRole::Master, on: true });
        world.apply(&Operation::SetRootFrame { federate: 0, frame: 0, publish: false });

        let result = world.apply(&Operation::Initialize { federate: 0 });
        assert_eq!(result, OperationResult::Error(OperationError::InvalidTiming));

        // 4 steps is 0.25 s; the default 1 s padding spans four of them.
        world.apply(&Operation::SetLeastCommonTimeStep { federate: 0, steps: 4 });
        assert!(world.apply(&Operation::Initialize { federate: 0 }).is_ok());
    }
}
