//! The federate configuration aggregate.
//!
//! A `FederateConfig` is assembled through setters, validated and submitted
//! once by [`FederateConfig::initialize`], and frozen from then on. After the
//! commit point only runtime confirmations for its frames are accepted.
//!
//! ```text
//!  setters ──▶ initialize(runtime) ──▶ frozen
//!                 │                       │
//!                 ├─ validate             └─ confirm_frame(name, confirmation)
//!                 ├─ snapshot declaration
//!                 └─ runtime.submit()
//! ```

use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use crate::{
    error::ConfigError,
    execution::ExecutionTiming,
    frame::{Confirmation, FrameDeclaration, FrameError, PackingHandle, ReferenceFrameObject},
    known::{KnownFederate, KnownFederateSet},
    role::{Role, RoleAssignment, RoleFlags},
    runtime::FederationRuntime,
    time::{TimeManagementConfig, TimeMode},
};

/// Auxiliary simulation entity tracked for enable/disable bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimObject {
    /// Object name.
    pub name: String,
    /// Whether the object takes part in the run.
    pub enabled: bool,
}

/// Frozen snapshot of a federate configuration.
///
/// Produced by [`FederateConfig::initialize`] and handed to the federation
/// runtime. This is also the unit the federation audit works on.
#[derive(Debug, Clone, PartialEq)]
pub struct FederateDeclaration {
    /// Federation execution name.
    pub federation: String,
    /// This federate's name.
    pub federate: String,
    /// Whether the federate takes part in the run.
    pub enabled: bool,
    /// Role flags.
    pub roles: RoleFlags,
    /// Known federates, in insertion order.
    pub known: Vec<KnownFederate>,
    /// Time management parameters.
    pub time: TimeManagementConfig,
    /// Execution timing parameters.
    pub timing: ExecutionTiming,
    /// The root reference frame.
    pub root_frame: FrameDeclaration,
    /// Non-root reference frames, in insertion order.
    pub frames: Vec<FrameDeclaration>,
    /// Auxiliary simulation objects.
    pub sim_objects: Vec<SimObject>,
}

impl FederateDeclaration {
    /// Roles as an assignment.
    pub fn role_assignment(&self) -> RoleAssignment {
        RoleAssignment::from_flags(self.roles)
    }

    /// Root frame followed by every non-root frame.
    pub fn all_frames(&self) -> impl Iterator<Item = &FrameDeclaration> {
        std::iter::once(&self.root_frame).chain(&self.frames)
    }

    /// Look up a frame declaration by name.
    pub fn frame(&self, name: &str) -> Option<&FrameDeclaration> {
        self.all_frames().find(|frame| frame.name == name)
    }

    /// Names of required known federates.
    pub fn required_federates(&self) -> impl Iterator<Item = &str> {
        self.known.iter().filter(|entry| entry.required).map(|entry| entry.name.as_str())
    }
}

/// Configuration of a single federate.
#[derive(Debug, Clone)]
pub struct FederateConfig {
    federation: String,
    federate: String,
    enabled: bool,
    strict_roles: bool,
    roles: RoleAssignment,
    known: KnownFederateSet,
    time: TimeManagementConfig,
    timing: ExecutionTiming,
    root_frame: Option<ReferenceFrameObject>,
    frames: Vec<ReferenceFrameObject>,
    sim_objects: Vec<SimObject>,
    declaration: Option<FederateDeclaration>,
}

impl FederateConfig {
    /// Create an enabled "Other" federate with nothing else configured.
    pub fn new(federation: impl Into<String>, federate: impl Into<String>) -> Self {
        Self {
            federation: federation.into(),
            federate: federate.into(),
            enabled: true,
            strict_roles: false,
            roles: RoleAssignment::new(),
            known: KnownFederateSet::new(),
            time: TimeManagementConfig::default(),
            timing: ExecutionTiming::new(),
            root_frame: None,
            frames: Vec::new(),
            sim_objects: Vec::new(),
            declaration: None,
        }
    }

    /// Federation execution name.
    pub fn federation(&self) -> &str {
        &self.federation
    }

    /// This federate's name.
    pub fn name(&self) -> &str {
        &self.federate
    }

    /// Whether the federate takes part in the run.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Include or exclude this federate from the run.
    ///
    /// A disabled configuration still validates and freezes, but nothing is
    /// submitted to the runtime.
    pub fn set_enabled(&mut self, enabled: bool) -> Result<(), ConfigError> {
        self.ensure_mutable("set_enabled")?;
        self.enabled = enabled;
        Ok(())
    }

    /// Reject holding more than one role at `initialize()`.
    pub fn set_strict_roles(&mut self, strict: bool) -> Result<(), ConfigError> {
        self.ensure_mutable("set_strict_roles")?;
        self.strict_roles = strict;
        Ok(())
    }

    /// Set or clear the Master role.
    pub fn set_master_role(&mut self, on: bool) -> Result<(), ConfigError> {
        self.ensure_mutable("set_master_role")?;
        self.roles.set_master_role(on);
        Ok(())
    }

    /// Set or clear the Pacing role.
    pub fn set_pacing_role(&mut self, on: bool) -> Result<(), ConfigError> {
        self.ensure_mutable("set_pacing_role")?;
        self.roles.set_pacing_role(on);
        Ok(())
    }

    /// Set or clear the RRFP role.
    pub fn set_rrfp_role(&mut self, on: bool) -> Result<(), ConfigError> {
        self.ensure_mutable("set_rrfp_role")?;
        self.roles.set_rrfp_role(on);
        Ok(())
    }

    /// Append a known federate.
    pub fn add_known_federate(
        &mut self,
        required: bool,
        name: impl Into<String>,
    ) -> Result<(), ConfigError> {
        self.ensure_mutable("add_known_federate")?;
        self.known.add_known_federate(required, name)
    }

    /// Set the lookahead in seconds.
    pub fn set_lookahead_time(&mut self, seconds: f64) -> Result<(), ConfigError> {
        self.ensure_mutable("set_lookahead_time")?;
        self.time.set_lookahead_time(seconds)
    }

    /// Set time-regulating.
    pub fn set_time_regulating(&mut self, on: bool) -> Result<(), ConfigError> {
        self.ensure_mutable("set_time_regulating")?;
        self.time.set_time_regulating(on)
    }

    /// Set time-constrained.
    pub fn set_time_constrained(&mut self, on: bool) -> Result<(), ConfigError> {
        self.ensure_mutable("set_time_constrained")?;
        self.time.set_time_constrained(on);
        Ok(())
    }

    /// Replace the whole time management triple.
    pub fn set_time_management(&mut self, time: TimeManagementConfig) -> Result<(), ConfigError> {
        self.ensure_mutable("set_time_management")?;
        time.validate()?;
        self.time = time;
        Ok(())
    }

    /// Set the least common time step in microseconds.
    pub fn set_least_common_time_step(&mut self, micros: i64) -> Result<(), ConfigError> {
        self.ensure_mutable("set_least_common_time_step")?;
        self.timing.set_least_common_time_step(micros)
    }

    /// Set the mode transition padding in seconds.
    pub fn set_time_padding(&mut self, seconds: f64) -> Result<(), ConfigError> {
        self.ensure_mutable("set_time_padding")?;
        self.timing.set_time_padding(seconds)
    }

    /// Set the scenario timeline epoch.
    pub fn set_scenario_timeline_epoch(&mut self, seconds: f64) -> Result<(), ConfigError> {
        self.ensure_mutable("set_scenario_timeline_epoch")?;
        self.timing.set_scenario_timeline_epoch(seconds)
    }

    /// Select the CTE timeline.
    pub fn set_cte_timeline(&mut self, on: bool) -> Result<(), ConfigError> {
        self.ensure_mutable("set_cte_timeline")?;
        self.timing.set_cte_timeline(on);
        Ok(())
    }

    /// Build a root frame whose direction follows this federate's RRFP role.
    pub fn new_root_frame(
        &self,
        name: impl Into<String>,
        packing: PackingHandle,
        qualified_name: impl Into<String>,
    ) -> ReferenceFrameObject {
        ReferenceFrameObject::new(self.roles.is_rrfp(), name, packing, qualified_name)
    }

    /// Designate the root reference frame and register it.
    ///
    /// # Errors
    ///
    /// - `ConfigError::RootFrameAlreadySet` if a root frame is in place
    /// - `ConfigError::DuplicateFrame` if a non-root frame has the same name
    /// - `ConfigError::Frame` if the frame is not `Configured`
    pub fn set_root_frame(&mut self, mut frame: ReferenceFrameObject) -> Result<(), ConfigError> {
        self.ensure_mutable("set_root_frame")?;
        check_frame_names(&frame)?;
        if let Some(existing) = &self.root_frame {
            return Err(ConfigError::RootFrameAlreadySet { existing: existing.name().to_string() });
        }
        if self.has_frame(frame.name()) {
            return Err(ConfigError::DuplicateFrame { name: frame.name().to_string() });
        }

        frame.mark_registered()?;
        self.root_frame = Some(frame);
        Ok(())
    }

    /// Add a non-root reference frame and register it.
    ///
    /// # Errors
    ///
    /// - `ConfigError::DuplicateFrame` if any managed frame, the root
    ///   included, has the same name
    /// - `ConfigError::Frame` if the frame is not `Configured`
    pub fn add_fed_object(&mut self, mut frame: ReferenceFrameObject) -> Result<(), ConfigError> {
        self.ensure_mutable("add_fed_object")?;
        check_frame_names(&frame)?;
        if self.has_frame(frame.name()) {
            return Err(ConfigError::DuplicateFrame { name: frame.name().to_string() });
        }

        frame.mark_registered()?;
        self.frames.push(frame);
        Ok(())
    }

    /// Register an auxiliary simulation object.
    pub fn add_sim_object(
        &mut self,
        name: impl Into<String>,
        enabled: bool,
    ) -> Result<(), ConfigError> {
        self.ensure_mutable("add_sim_object")?;
        let name = name.into();
        if name.is_empty() {
            return Err(ConfigError::EmptyName { what: "sim object" });
        }
        if self.sim_objects.iter().any(|object| object.name == name) {
            return Err(ConfigError::DuplicateSimObject { name });
        }

        self.sim_objects.push(SimObject { name, enabled });
        Ok(())
    }

    /// Validate, submit and freeze.
    ///
    /// Checks run in this order:
    ///
    /// 1. not already initialized, federate name not empty
    /// 2. root frame set
    /// 3. time management consistent
    /// 4. known federates list this federate, unless empty
    /// 5. single role, when strict roles are on
    /// 6. execution timing, for the Master
    /// 7. initial frame data
    ///
    /// The declaration is then submitted to `runtime` unless the federate is
    /// disabled. The configuration freezes only if every step succeeds.
    pub fn initialize<R>(&mut self, runtime: &mut R) -> Result<&FederateDeclaration, ConfigError>
    where
        R: FederationRuntime + ?Sized,
    {
        if self.declaration.is_some() {
            return Err(ConfigError::AlreadyInitialized);
        }
        if self.federate.is_empty() {
            return Err(ConfigError::EmptyName { what: "federate" });
        }

        let root = self.root_frame.as_ref().ok_or(ConfigError::MissingRootFrame)?;
        self.time.validate()?;
        self.known.check_self_registered(&self.federate)?;
        if self.strict_roles {
            self.roles.check_exclusive()?;
        }
        if self.roles.is_master() {
            self.timing.validate_for_master(self.time.lookahead())?;
        }
        root.validate_initial_data(true)?;
        for frame in &self.frames {
            frame.validate_initial_data(false)?;
        }

        if self.time.time_mode() == TimeMode::Decoupled {
            warn!(
                federate = %self.federate,
                "federate is neither time-regulating nor time-constrained; no causal ordering"
            );
        }

        let declaration = FederateDeclaration {
            federation: self.federation.clone(),
            federate: self.federate.clone(),
            enabled: self.enabled,
            roles: self.roles.flags(),
            known: self.known.iter().cloned().collect(),
            time: self.time,
            timing: self.timing,
            root_frame: root.declaration(),
            frames: self.frames.iter().map(ReferenceFrameObject::declaration).collect(),
            sim_objects: self.sim_objects.clone(),
        };

        if self.enabled {
            runtime
                .submit(&declaration)
                .map_err(|e| ConfigError::Rejected { reason: e.to_string() })?;
        } else {
            debug!(federate = %self.federate, "federate disabled; declaration not submitted");
        }

        info!(
            federation = %self.federation,
            federate = %self.federate,
            roles = %self.roles,
            lookahead = %self.time.lookahead(),
            frames = self.frames.len() + 1,
            "federate configuration initialized"
        );

        Ok(self.declaration.insert(declaration))
    }

    /// Apply a runtime confirmation to a managed frame.
    ///
    /// # Errors
    ///
    /// - `ConfigError::NotInitialized` before `initialize()`
    /// - `ConfigError::Frame` for an unknown frame or a rejected transition
    pub fn confirm_frame(
        &mut self,
        name: &str,
        confirmation: Confirmation,
    ) -> Result<(), ConfigError> {
        if self.declaration.is_none() {
            return Err(ConfigError::NotInitialized);
        }

        let frame = self
            .root_frame
            .iter_mut()
            .chain(self.frames.iter_mut())
            .find(|frame| frame.name() == name)
            .ok_or_else(|| FrameError::UnknownFrame { name: name.to_string() })?;

        frame.confirm(confirmation)?;
        Ok(())
    }

    /// Whether `initialize()` has succeeded.
    pub fn is_initialized(&self) -> bool {
        self.declaration.is_some()
    }

    /// The frozen declaration, once initialized.
    pub fn declaration(&self) -> Option<&FederateDeclaration> {
        self.declaration.as_ref()
    }

    /// Role assignment.
    pub fn roles(&self) -> RoleAssignment {
        self.roles
    }

    /// Roles held, `Other` when none.
    pub fn effective_role(&self) -> BTreeSet<Role> {
        self.roles.effective_role()
    }

    /// Whether this federate is the Master.
    pub fn is_master(&self) -> bool {
        self.roles.is_master()
    }

    /// Whether this federate paces the federation.
    pub fn is_pacing(&self) -> bool {
        self.roles.is_pacing()
    }

    /// Whether this federate publishes the root reference frame.
    pub fn is_rrfp(&self) -> bool {
        self.roles.is_rrfp()
    }

    /// Known federates.
    pub fn known_federates(&self) -> &KnownFederateSet {
        &self.known
    }

    /// Time management parameters.
    pub fn time_management(&self) -> &TimeManagementConfig {
        &self.time
    }

    /// Execution timing parameters.
    pub fn execution_timing(&self) -> &ExecutionTiming {
        &self.timing
    }

    /// The root reference frame, if set.
    pub fn root_frame(&self) -> Option<&ReferenceFrameObject> {
        self.root_frame.as_ref()
    }

    /// Non-root reference frames, in insertion order.
    pub fn frames(&self) -> &[ReferenceFrameObject] {
        &self.frames
    }

    /// Look up any managed frame, the root included.
    pub fn frame(&self, name: &str) -> Option<&ReferenceFrameObject> {
        self.all_frames().find(|frame| frame.name() == name)
    }

    /// Root frame (if set) followed by every non-root frame.
    pub fn all_frames(&self) -> impl Iterator<Item = &ReferenceFrameObject> {
        self.root_frame.iter().chain(&self.frames)
    }

    /// Names of managed frames that are not yet active.
    pub fn inactive_frames(&self) -> Vec<String> {
        self.all_frames()
            .filter(|frame| !frame.is_active())
            .map(|frame| frame.name().to_string())
            .collect()
    }

    /// Auxiliary simulation objects.
    pub fn sim_objects(&self) -> &[SimObject] {
        &self.sim_objects
    }

    fn has_frame(&self, name: &str) -> bool {
        self.all_frames().any(|frame| frame.name() == name)
    }

    fn ensure_mutable(&self, operation: &'static str) -> Result<(), ConfigError> {
        if self.declaration.is_some() {
            return Err(ConfigError::Frozen { operation });
        }
        Ok(())
    }
}

fn check_frame_names(frame: &ReferenceFrameObject) -> Result<(), ConfigError> {
    if frame.name().is_empty() {
        return Err(ConfigError::EmptyName { what: "reference frame" });
    }
    if frame.qualified_name().is_empty() {
        return Err(ConfigError::EmptyName { what: "qualified frame" });
    }
    Ok(())
}
