//! Reference run profiles of the SpaceFOM role test.
//!
//! Four federates make up the role test federation: the Master, the Pacing
//! federate, the Root Reference Frame Publisher and one federate with no
//! special role. Each profile assembles the configuration that federate
//! runs with.

use std::{convert::Infallible, fmt};

use clap::ValueEnum;
use spacefom_core::{
    ConfigError, FederateConfig, FederateDeclaration, FederationRuntime, PackingHandle,
    RefFrameData, ReferenceFrameObject, SpaceTimeCoordinate,
};

/// Federation execution name used by the role test.
pub const DEFAULT_FEDERATION: &str = "SpaceFOM_Roles_Test";

/// Root reference frame name.
pub const ROOT_FRAME: &str = "RootFrame";

/// The one non-root frame of the test.
pub const FRAME_A: &str = "FrameA";

const ROOT_FRAME_PACKING: PackingHandle = PackingHandle::new(1);
const FRAME_A_PACKING: PackingHandle = PackingHandle::new(2);

const ROOT_FRAME_QUALIFIED: &str = "root_ref_frame.frame_packing";
const FRAME_A_QUALIFIED: &str = "ref_frame_A.frame_packing";

/// Lookahead shared by every role test federate, in seconds.
const LOOKAHEAD_SECONDS: f64 = 0.25;

/// Master least common time step, in microseconds.
const LEAST_COMMON_TIME_STEP: i64 = 250_000;

/// Master mode transition padding, in seconds.
const TIME_PADDING_SECONDS: f64 = 1.0;

/// Scenario epoch: TJD 18487.75 in seconds, UTC shifted to TT (37 s + 32.184 s).
const SCENARIO_EPOCH_TT: f64 = 18_487.75 * 86_400.0 + 37.0 + 32.184;

/// Which federate of the role test to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum RunProfile {
    /// Master federate: owns execution control and waits for the others.
    Master,
    /// Pacing federate.
    Pacing,
    /// Root Reference Frame Publisher.
    Rrfp,
    /// Federate with no special role.
    Other,
}

impl RunProfile {
    /// Every profile, in federation start order.
    pub const ALL: [Self; 4] = [Self::Master, Self::Pacing, Self::Rrfp, Self::Other];

    /// Federate name this profile joins with.
    pub fn federate_name(self) -> &'static str {
        match self {
            Self::Master => "Master",
            Self::Pacing => "Pacing",
            Self::Rrfp => "RRFP",
            Self::Other => "Other",
        }
    }

    /// Assemble the profile's configuration, not yet initialized.
    pub fn build(self, federation: &str) -> Result<FederateConfig, ConfigError> {
        let mut config = FederateConfig::new(federation, self.federate_name());
        match self {
            Self::Master => build_master(&mut config)?,
            Self::Pacing => build_pacing(&mut config)?,
            Self::Rrfp => build_rrfp(&mut config)?,
            Self::Other => build_other(&mut config)?,
        }
        Ok(config)
    }

    /// Build and initialize the profile offline, returning its declaration.
    ///
    /// Used to describe the rest of the federation to a loopback runtime.
    pub fn declare(self, federation: &str) -> Result<FederateDeclaration, ConfigError> {
        let mut config = self.build(federation)?;
        Ok(config.initialize(&mut Offline)?.clone())
    }
}

impl fmt::Display for RunProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.federate_name())
    }
}

/// Accepts any declaration without contacting a federation.
struct Offline;

impl FederationRuntime for Offline {
    type Error = Infallible;

    fn submit(&mut self, _declaration: &FederateDeclaration) -> Result<(), Self::Error> {
        Ok(())
    }
}

fn build_master(config: &mut FederateConfig) -> Result<(), ConfigError> {
    config.set_master_role(true)?;
    config.set_pacing_role(false)?;
    config.set_rrfp_role(false)?;

    config.add_known_federate(true, "Master")?;
    config.add_known_federate(true, "Pacing")?;
    config.add_known_federate(true, "RRFP")?;

    config.set_scenario_timeline_epoch(SCENARIO_EPOCH_TT)?;
    config.set_lookahead_time(LOOKAHEAD_SECONDS)?;
    config.set_least_common_time_step(LEAST_COMMON_TIME_STEP)?;
    config.set_time_padding(TIME_PADDING_SECONDS)?;
    config.set_time_regulating(true)?;
    config.set_time_constrained(true)?;
    config.set_cte_timeline(true)?;

    set_root_frame(config)?;
    add_standard_sim_objects(config)
}

fn build_pacing(config: &mut FederateConfig) -> Result<(), ConfigError> {
    config.set_master_role(false)?;
    config.set_pacing_role(true)?;
    config.set_rrfp_role(false)?;

    config.set_lookahead_time(LOOKAHEAD_SECONDS)?;
    config.set_time_regulating(true)?;
    config.set_time_constrained(true)?;
    config.set_cte_timeline(true)?;

    // Pacing does not model the frame tree; it only mirrors the root.
    set_root_frame(config)?;
    config.add_sim_object("THLA", true)?;
    config.add_sim_object("THLA_INIT", true)?;
    config.add_sim_object("ref_frame_tree", false)?;
    config.add_sim_object("root_ref_frame", false)?;
    config.add_sim_object("ref_frame_A", false)
}

fn build_rrfp(config: &mut FederateConfig) -> Result<(), ConfigError> {
    config.set_master_role(false)?;
    config.set_pacing_role(false)?;
    config.set_rrfp_role(true)?;

    config.add_known_federate(true, "Master")?;
    config.add_known_federate(true, "Pacing")?;
    config.add_known_federate(true, "RRFP")?;

    config.set_lookahead_time(LOOKAHEAD_SECONDS)?;
    config.set_time_regulating(false)?;
    config.set_time_constrained(true)?;

    let mut root = config.new_root_frame(ROOT_FRAME, ROOT_FRAME_PACKING, ROOT_FRAME_QUALIFIED);
    root.set_debug(true);
    config.set_root_frame(
        root.with_initial_data(RefFrameData::root(ROOT_FRAME, SpaceTimeCoordinate::IDENTITY)),
    )?;

    let mut frame_a = ReferenceFrameObject::new(true, FRAME_A, FRAME_A_PACKING, FRAME_A_QUALIFIED);
    frame_a.set_debug(true);
    config.add_fed_object(frame_a.with_initial_data(RefFrameData::child(
        FRAME_A,
        ROOT_FRAME,
        SpaceTimeCoordinate::at_position([10.0, 10.0, 10.0]),
    )))?;

    add_standard_sim_objects(config)
}

fn build_other(config: &mut FederateConfig) -> Result<(), ConfigError> {
    config.set_master_role(false)?;
    config.set_pacing_role(false)?;
    config.set_rrfp_role(false)?;

    config.add_known_federate(true, "Other")?;
    config.add_known_federate(true, "Master")?;
    config.add_known_federate(true, "Pacing")?;
    config.add_known_federate(true, "RRFP")?;

    config.set_lookahead_time(LOOKAHEAD_SECONDS)?;
    config.set_time_regulating(false)?;
    config.set_time_constrained(true)?;

    set_root_frame(config)?;
    let mut frame_a =
        ReferenceFrameObject::new(false, FRAME_A, FRAME_A_PACKING, FRAME_A_QUALIFIED);
    frame_a.set_debug(true);
    config.add_fed_object(frame_a)?;

    add_standard_sim_objects(config)
}

fn set_root_frame(config: &mut FederateConfig) -> Result<(), ConfigError> {
    let mut root = config.new_root_frame(ROOT_FRAME, ROOT_FRAME_PACKING, ROOT_FRAME_QUALIFIED);
    root.set_debug(true);
    config.set_root_frame(root)
}

fn add_standard_sim_objects(config: &mut FederateConfig) -> Result<(), ConfigError> {
    for name in ["THLA", "THLA_INIT", "root_ref_frame", "ref_frame_A"] {
        config.add_sim_object(name, true)?;
    }
    Ok(())
}
