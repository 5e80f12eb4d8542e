//! Model federate - reference configuration state.

use super::operation::{
    ModelConfirmation, ModelRole, OperationError, OperationResult, STEP_MICROS,
};

/// Padding assumed when none is configured, in microseconds.
const DEFAULT_PADDING_MICROS: i64 = 1_000_000;

/// Least common time steps the padding must span.
const MIN_PADDING_STEPS: i64 = 3;

/// Observable view of one frame: name, publishes, active.
pub type ModelFrame = (String, bool, bool);

/// Model of one federate's configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelFederate {
    name: String,
    enabled: bool,
    strict_roles: bool,
    master: bool,
    pacing: bool,
    rrfp: bool,
    known: Vec<(String, bool)>,
    lookahead: i64,
    regulating: bool,
    constrained: bool,
    least_common_time_step: Option<i64>,
    padding: Option<i64>,
    root: Option<ModelFrame>,
    frames: Vec<ModelFrame>,
    initialized: bool,
}

impl ModelFederate {
    /// Fresh enabled federate with no roles.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            enabled: true,
            strict_roles: false,
            master: false,
            pacing: false,
            rrfp: false,
            known: Vec::new(),
            lookahead: 0,
            regulating: false,
            constrained: false,
            least_common_time_step: None,
            padding: None,
            root: None,
            frames: Vec::new(),
            initialized: false,
        }
    }

    /// Federate name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether `initialize()` succeeded.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Role flags as (master, pacing, rrfp).
    pub fn roles(&self) -> (bool, bool, bool) {
        (self.master, self.pacing, self.rrfp)
    }

    /// Known federates with their required flags.
    pub fn known(&self) -> &[(String, bool)] {
        &self.known
    }

    /// Lookahead in microseconds.
    pub fn lookahead(&self) -> i64 {
        self.lookahead
    }

    /// (regulating, constrained).
    pub fn time_flags(&self) -> (bool, bool) {
        (self.regulating, self.constrained)
    }

    /// Least common time step in microseconds.
    pub fn least_common_time_step(&self) -> Option<i64> {
        self.least_common_time_step
    }

    /// Effective padding in microseconds.
    pub fn padding(&self) -> i64 {
        self.padding.unwrap_or(DEFAULT_PADDING_MICROS)
    }

    /// Root frame.
    pub fn root(&self) -> Option<&ModelFrame> {
        self.root.as_ref()
    }

    /// Non-root frames in insertion order.
    pub fn frames(&self) -> &[ModelFrame] {
        &self.frames
    }

    /// Set or clear a role.
    pub fn set_role(&mut self, role: ModelRole, on: bool) -> OperationResult {
        self.mutate(|federate| {
            match role {
                ModelRole::Master => federate.master = on,
                ModelRole::Pacing => federate.pacing = on,
                ModelRole::Rrfp => federate.rrfp = on,
            }
            Ok(())
        })
    }

    /// Turn strict roles on or off.
    pub fn set_strict_roles(&mut self, on: bool) -> OperationResult {
        self.mutate(|federate| {
            federate.strict_roles = on;
            Ok(())
        })
    }

    /// Enable or disable.
    pub fn set_enabled(&mut self, on: bool) -> OperationResult {
        self.mutate(|federate| {
            federate.enabled = on;
            Ok(())
        })
    }

    /// Append a known federate.
    pub fn add_known_federate(&mut self, name: &str, required: bool) -> OperationResult {
        self.mutate(|federate| {
            if federate.known.iter().any(|(known, _)| known == name) {
                return Err(OperationError::DuplicateKnownFederate);
            }
            federate.known.push((name.to_string(), required));
            Ok(())
        })
    }

    /// Set the lookahead in steps.
    pub fn set_lookahead(&mut self, steps: u8) -> OperationResult {
        self.mutate(|federate| {
            if federate.regulating && steps == 0 {
                return Err(OperationError::InvalidLookahead);
            }
            federate.lookahead = i64::from(steps) * STEP_MICROS;
            Ok(())
        })
    }

    /// Set time-regulating.
    pub fn set_regulating(&mut self, on: bool) -> OperationResult {
        self.mutate(|federate| {
            if on && federate.lookahead == 0 {
                return Err(OperationError::InvalidLookahead);
            }
            federate.regulating = on;
            Ok(())
        })
    }

    /// Set time-constrained.
    pub fn set_constrained(&mut self, on: bool) -> OperationResult {
        self.mutate(|federate| {
            federate.constrained = on;
            Ok(())
        })
    }

    /// Set the least common time step in steps.
    pub fn set_least_common_time_step(&mut self, steps: u8) -> OperationResult {
        self.mutate(|federate| {
            if steps == 0 {
                return Err(OperationError::InvalidTiming);
            }
            federate.least_common_time_step = Some(i64::from(steps) * STEP_MICROS);
            Ok(())
        })
    }

    /// Set the padding in steps.
    pub fn set_time_padding(&mut self, steps: u8) -> OperationResult {
        self.mutate(|federate| {
            if steps == 0 {
                return Err(OperationError::InvalidTiming);
            }
            federate.padding = Some(i64::from(steps) * STEP_MICROS);
            Ok(())
        })
    }

    /// Designate the root frame.
    pub fn set_root_frame(&mut self, name: &str, publish: bool) -> OperationResult {
        self.mutate(|federate| {
            if federate.root.is_some() {
                return Err(OperationError::RootFrameAlreadySet);
            }
            if federate.frames.iter().any(|(frame, ..)| frame == name) {
                return Err(OperationError::DuplicateFrame);
            }
            federate.root = Some((name.to_string(), publish, false));
            Ok(())
        })
    }

    /// Add a non-root frame.
    pub fn add_frame(&mut self, name: &str, publish: bool) -> OperationResult {
        self.mutate(|federate| {
            if federate.all_frames().any(|(frame, ..)| frame == name) {
                return Err(OperationError::DuplicateFrame);
            }
            federate.frames.push((name.to_string(), publish, false));
            Ok(())
        })
    }

    /// Validate and freeze.
    pub fn initialize(&mut self) -> OperationResult {
        match self.check_initialize() {
            Ok(()) => {
                self.initialized = true;
                OperationResult::Ok
            },
            Err(e) => OperationResult::Error(e),
        }
    }

    /// Apply a runtime confirmation.
    pub fn confirm(&mut self, name: &str, confirmation: ModelConfirmation) -> OperationResult {
        if !self.initialized {
            return OperationResult::Error(OperationError::NotInitialized);
        }

        let Some(frame) =
            self.root.iter_mut().chain(self.frames.iter_mut()).find(|(frame, ..)| frame == name)
        else {
            return OperationResult::Error(OperationError::UnknownFrame);
        };

        let publishes = frame.1;
        if publishes != (confirmation == ModelConfirmation::Discovery) {
            return OperationResult::Error(OperationError::DirectionMismatch);
        }
        if frame.2 {
            return OperationResult::Error(OperationError::InvalidTransition);
        }

        frame.2 = true;
        OperationResult::Ok
    }

    fn check_initialize(&self) -> Result<(), OperationError> {
        if self.initialized {
            return Err(OperationError::AlreadyInitialized);
        }
        if self.root.is_none() {
            return Err(OperationError::MissingRootFrame);
        }
        if !self.known.is_empty() && !self.known.iter().any(|(known, _)| *known == self.name) {
            return Err(OperationError::SelfNotKnown);
        }
        let role_count = [self.master, self.pacing, self.rrfp].iter().filter(|on| **on).count();
        if self.strict_roles && role_count > 1 {
            return Err(OperationError::RoleConflict);
        }
        if self.master {
            self.check_master_timing()?;
        }
        Ok(())
    }

    fn check_master_timing(&self) -> Result<(), OperationError> {
        let lcts = self.least_common_time_step.ok_or(OperationError::InvalidTiming)?;
        if self.lookahead > 0 && (self.lookahead > lcts || lcts % self.lookahead != 0) {
            return Err(OperationError::InvalidTiming);
        }

        let padding = self.padding();
        if padding % lcts != 0 || padding < MIN_PADDING_STEPS * lcts {
            return Err(OperationError::InvalidTiming);
        }
        Ok(())
    }

    fn all_frames(&self) -> impl Iterator<Item = &ModelFrame> {
        self.root.iter().chain(self.frames.iter())
    }

    fn mutate(
        &mut self,
        change: impl FnOnce(&mut Self) -> Result<(), OperationError>,
    ) -> OperationResult {
        if self.initialized {
            return OperationResult::Error(OperationError::Frozen);
        }
        match change(self) {
            Ok(()) => OperationResult::Ok,
            Err(e) => OperationResult::Error(e),
        }
    }
}
