//! Deterministic simulation harness for SpaceFOM federate start-up.
//!
//! Everything here runs on a virtual clock:
//!
//! - `SimFederation` plans a seeded federation start-up and can step every
//!   member's start-up session without any runtime
//! - `SimEnv` and `SimRti` replay the same plan through the real async
//!   driver inside a turmoil simulation
//! - `Scenario` wraps a run with oracles
//!
//! # Model-Based Testing
//!
//! The `model` module provides a reference implementation of the federate
//! configuration rules. Operations are applied to both the model and
//! `FederateConfig`, and their observable states are compared.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod model;
pub mod scenario;
pub mod sim_env;
pub mod sim_federation;
pub mod sim_rti;

pub use model::{
    FederateSlot, FederateState, FrameSlot, ModelConfirmation, ModelFederate, ModelRole,
    ModelWorld, ObservableState, Operation, OperationError, OperationResult,
};
pub use scenario::{Oracle, Scenario};
pub use sim_env::SimEnv;
pub use sim_federation::{MemberPlan, ScheduledEvent, SimFederation, SimOutcome, StartupReport};
pub use sim_rti::SimRti;
