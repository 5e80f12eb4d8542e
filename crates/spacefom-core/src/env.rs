//! Environment abstraction for deterministic testing.
//!
//! The `Environment` trait decouples federate start-up logic from the system
//! clock. This enables:
//!
//! - Deterministic Simulation: the harness supplies a virtual clock, so a
//!   start-up deadline can be crossed without waiting in wall-clock time.
//!
//! - Production Runtime: the federate binary uses the real clock and tokio
//!   timers without any change to the configuration model.
//!
//! # Invariants
//!
//! - Monotonicity: `env.now()` must never go backwards
//! - Isolation: Implementations must not share global state

use std::{
    fmt,
    ops::{Add, Sub},
    time::Duration,
};

/// Abstract environment providing time and async sleeping.
///
/// The configuration model itself never calls `sleep`; only drivers do. Pure
/// state machines such as [`crate::StartupSession`] take instants as
/// arguments instead of holding an environment.
pub trait Environment: Clone + Send + Sync + 'static {
    /// Instant type produced by this environment.
    type Instant: Copy
        + Ord
        + fmt::Debug
        + Send
        + Sync
        + Sub<Output = Duration>
        + Add<Duration, Output = Self::Instant>;

    /// Returns the current time.
    ///
    /// # Invariants
    ///
    /// - Monotonicity: This method MUST return values that never decrease
    ///   within a single execution context.
    fn now(&self) -> Self::Instant;

    /// Sleeps for the specified duration.
    ///
    /// This is the ONLY async method in the trait, and it should only be used
    /// by driver code (not configuration logic).
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;
}
