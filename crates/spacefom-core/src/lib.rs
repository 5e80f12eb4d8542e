//! SpaceFOM Core
//!
//! Sans-IO configuration model for one federate of a SpaceFOM federation:
//! the roles it holds, the peers it waits for, how it takes part in time
//! management, and the reference frames it publishes or subscribes to.
//!
//! # Architecture
//!
//! ```text
//! RoleAssignment        ─┐
//! KnownFederateSet      ─┤
//! TimeManagementConfig  ─┼─▶ FederateConfig ──initialize()──▶ FederateDeclaration
//! ExecutionTiming       ─┤         │                                  │
//! ReferenceFrameObject  ─┘         │                  FederationRuntime::submit()
//!                                  ▼
//!                           StartupSession ◀── RuntimeEvent (joins, confirmations, ticks)
//!                                  │
//!                                  └──▶ StartupAction (BeginExecution | Terminate)
//! ```
//!
//! The crate never performs I/O. A driver owns the RTI connection and the
//! clock, submits declarations through [`FederationRuntime`], and feeds
//! runtime events into [`StartupSession`].
//!
//! # Components
//!
//! - [`FederateConfig`]: the aggregate and its single commit point
//! - [`ReferenceFrameObject`]: frame lifecycle CONFIGURED -> REGISTERED ->
//!   ACTIVE
//! - [`StartupSession`]: start-up barrier with deadline and cancellation
//! - [`FederationAudit`]: federation-wide consistency checks

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod env;
pub mod error;
pub mod execution;
pub mod federate;
pub mod federation;
pub mod frame;
pub mod frame_data;
pub mod known;
pub mod role;
pub mod runtime;
pub mod startup;
pub mod time;

pub use env::Environment;
pub use error::ConfigError;
pub use execution::ExecutionTiming;
pub use federate::{FederateConfig, FederateDeclaration, SimObject};
pub use federation::{FederationAudit, FederationConsistencyError};
pub use frame::{
    Confirmation, Direction, FrameDeclaration, FrameError, FrameState, PackingHandle,
    ReferenceFrameObject,
};
pub use frame_data::{RefFrameData, SpaceTimeCoordinate};
pub use known::{KnownFederate, KnownFederateSet};
pub use role::{Role, RoleAssignment, RoleFlags};
pub use runtime::FederationRuntime;
pub use startup::{
    DiscoveryTimeoutError, RuntimeEvent, StartupAction, StartupError, StartupPhase,
    StartupSession, TerminateCause,
};
pub use time::{HlaInterval, TimeManagementConfig, TimeMode};
