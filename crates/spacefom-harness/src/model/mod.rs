//! Reference model for model-based testing.
//!
//! The model is a simplified implementation that captures the rules of the
//! federate configuration model without its types: frames are tuples,
//! intervals are integers and roles are three booleans. It serves as the
//! oracle against which `FederateConfig` is verified.
//!
//! # Design Principles
//!
//! - Simplicity: The model should be obviously correct
//! - Rules not implementation: Captures WHAT, not HOW
//! - Deterministic: Same inputs produce same outputs

mod federate;
pub mod operation;
mod world;

pub use federate::{ModelFederate, ModelFrame};
pub use operation::{
    FEDERATE_NAMES, FRAME_NAMES, FederateSlot, FrameSlot, ModelConfirmation, ModelRole, Operation,
    OperationError, OperationResult, STEP_MICROS, STEP_SECONDS, federate_name, frame_name,
};
pub use world::{FederateState, ModelWorld, ObservableState};
