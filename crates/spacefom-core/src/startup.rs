//! Start-up barrier.
//!
//! After `initialize()` a federate must not enter the federation time loop
//! until every required known federate has joined and every one of its
//! reference frames is ACTIVE. The wait is bounded by a deadline and can be
//! cancelled by the operator.
//!
//! `StartupSession` is a pure state machine: the driver feeds it
//! [`RuntimeEvent`]s (including clock ticks) and executes the returned
//! [`StartupAction`]s.
//!
//! ```text
//!            ┌── all required joined, all frames ACTIVE ──▶ Ready
//! Waiting ───┼── Tick past deadline ───────────────────────▶ TimedOut
//!            └── Shutdown ─────────────────────────────────▶ Cancelled
//! ```

use std::{collections::BTreeSet, fmt, ops::Sub, time::Duration};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    error::ConfigError,
    federate::FederateConfig,
    frame::{Confirmation, FrameError},
};

/// Input from the federation runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeEvent<I> {
    /// A federate joined the federation execution.
    FederateJoined {
        /// Federate name.
        name: String,
    },
    /// The runtime discovered one of this federate's published frames.
    FrameDiscovered {
        /// Frame name.
        name: String,
    },
    /// The runtime matched one of this federate's subscribed frames.
    SubscriptionMatched {
        /// Frame name.
        name: String,
    },
    /// Clock tick, used for deadline checks.
    Tick {
        /// Current time.
        now: I,
    },
    /// The operator asked the federate to stop.
    Shutdown {
        /// Why.
        reason: String,
    },
}

/// What the driver must do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartupAction {
    /// The barrier is released; start the federation time loop.
    BeginExecution,
    /// Give up on the federation execution.
    Terminate {
        /// Why start-up ended.
        cause: TerminateCause,
    },
}

/// Why start-up ended without releasing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminateCause {
    /// The deadline passed.
    DiscoveryTimeout(DiscoveryTimeoutError),
    /// The operator cancelled the wait.
    Cancelled {
        /// Operator-supplied reason.
        reason: String,
    },
}

impl fmt::Display for TerminateCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DiscoveryTimeout(e) => write!(f, "{e}"),
            Self::Cancelled { reason } => write!(f, "start-up cancelled: {reason}"),
        }
    }
}

/// Barrier phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupPhase {
    /// Waiting for federates and frames.
    Waiting,
    /// Released.
    Ready,
    /// Deadline passed before release.
    TimedOut,
    /// Cancelled by the operator.
    Cancelled,
}

impl StartupPhase {
    /// Whether no further transitions can happen.
    pub fn is_terminal(self) -> bool {
        self != Self::Waiting
    }
}

impl fmt::Display for StartupPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Waiting => "waiting",
            Self::Ready => "ready",
            Self::TimedOut => "timed out",
            Self::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Required federates and frames still outstanding at the deadline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "start-up timed out after {waited:?}: missing federates [{}], inactive frames [{}]",
    .missing_federates.join(", "),
    .inactive_frames.join(", ")
)]
pub struct DiscoveryTimeoutError {
    /// Required federates that never joined.
    pub missing_federates: Vec<String>,
    /// Frames still REGISTERED.
    pub inactive_frames: Vec<String>,
    /// Time spent waiting.
    pub waited: Duration,
}

/// Errors from the start-up session.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StartupError {
    /// The session was built from a configuration that was never
    /// initialized.
    #[error("start-up requires an initialized configuration")]
    NotInitialized,

    /// A confirmation arrived after the barrier reached a terminal phase.
    #[error("start-up already {phase}")]
    Finished {
        /// The terminal phase.
        phase: StartupPhase,
    },

    /// A frame confirmation was refused.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl StartupError {
    /// Returns true if this error is fatal (unrecoverable).
    ///
    /// A confirmation through the wrong direction means the runtime and the
    /// declaration disagree. Late, repeated or unknown confirmations are
    /// logged and dropped by the driver.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::NotInitialized => true,
            Self::Config(ConfigError::Frame(FrameError::DirectionMismatch { .. })) => true,

            Self::Finished { .. } | Self::Config(_) => false,
        }
    }
}

/// Sans-IO start-up barrier for one initialized federate.
#[derive(Debug, Clone)]
pub struct StartupSession<I> {
    config: FederateConfig,
    joined: BTreeSet<String>,
    started_at: I,
    timeout: Duration,
    phase: StartupPhase,
}

impl<I> StartupSession<I>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    /// Start waiting at `now` for at most `timeout`.
    ///
    /// # Errors
    ///
    /// Returns `StartupError::NotInitialized` unless `config` has been
    /// through `initialize()`.
    pub fn new(config: FederateConfig, now: I, timeout: Duration) -> Result<Self, StartupError> {
        if !config.is_initialized() {
            return Err(StartupError::NotInitialized);
        }
        Ok(Self {
            config,
            joined: BTreeSet::new(),
            started_at: now,
            timeout,
            phase: StartupPhase::Waiting,
        })
    }

    /// Process an event and return resulting actions.
    ///
    /// # Errors
    ///
    /// Returns `StartupError` if a join or frame confirmation cannot be
    /// applied. Ticks and shutdowns after a terminal phase are no-ops.
    ///
    /// A tick releases a session whose barrier was already met when it was
    /// created.
    pub fn handle(&mut self, event: RuntimeEvent<I>) -> Result<Vec<StartupAction>, StartupError> {
        if self.phase.is_terminal() {
            return match event {
                RuntimeEvent::Tick { .. } | RuntimeEvent::Shutdown { .. } => Ok(Vec::new()),
                _ => Err(StartupError::Finished { phase: self.phase }),
            };
        }

        match event {
            RuntimeEvent::FederateJoined { name } => self.handle_joined(name),
            RuntimeEvent::FrameDiscovered { name } => {
                self.handle_confirmation(&name, Confirmation::Discovery)
            },
            RuntimeEvent::SubscriptionMatched { name } => {
                self.handle_confirmation(&name, Confirmation::SubscriptionMatch)
            },
            RuntimeEvent::Tick { now } => Ok(self.handle_tick(now)),
            RuntimeEvent::Shutdown { reason } => Ok(self.handle_shutdown(reason)),
        }
    }

    /// Current phase.
    pub fn phase(&self) -> StartupPhase {
        self.phase
    }

    /// The configuration whose frames this session activates.
    pub fn config(&self) -> &FederateConfig {
        &self.config
    }

    /// Hand the configuration back, frames in their current state.
    pub fn into_config(self) -> FederateConfig {
        self.config
    }

    /// Known federates that have joined so far.
    pub fn joined(&self) -> impl Iterator<Item = &str> {
        self.joined.iter().map(String::as_str)
    }

    /// Required federates that have not joined, in known-list order.
    pub fn missing_federates(&self) -> Vec<String> {
        self.config
            .known_federates()
            .required_names()
            .filter(|name| !self.joined.contains(*name))
            .map(ToString::to_string)
            .collect()
    }

    /// Whether the barrier condition holds.
    pub fn is_satisfied(&self) -> bool {
        self.missing_federates().is_empty() && self.config.inactive_frames().is_empty()
    }

    /// Configured timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn handle_joined(&mut self, name: String) -> Result<Vec<StartupAction>, StartupError> {
        if !self.config.known_federates().contains(&name) {
            warn!(
                federate = %self.config.name(),
                joined = %name,
                "ignoring join of unknown federate"
            );
            return Ok(Vec::new());
        }

        debug!(federate = %self.config.name(), joined = %name, "known federate joined");
        self.joined.insert(name);
        Ok(self.try_release())
    }

    fn handle_confirmation(
        &mut self,
        name: &str,
        confirmation: Confirmation,
    ) -> Result<Vec<StartupAction>, StartupError> {
        self.config.confirm_frame(name, confirmation)?;
        Ok(self.try_release())
    }

    fn handle_tick(&mut self, now: I) -> Vec<StartupAction> {
        // A session can be built from a config that already satisfies the barrier.
        let released = self.try_release();
        if !released.is_empty() {
            return released;
        }

        let waited = self.elapsed(now);
        if waited < self.timeout {
            return Vec::new();
        }

        let error = DiscoveryTimeoutError {
            missing_federates: self.missing_federates(),
            inactive_frames: self.config.inactive_frames(),
            waited,
        };
        warn!(federate = %self.config.name(), %error, "start-up deadline passed");

        self.phase = StartupPhase::TimedOut;
        vec![StartupAction::Terminate { cause: TerminateCause::DiscoveryTimeout(error) }]
    }

    fn handle_shutdown(&mut self, reason: String) -> Vec<StartupAction> {
        info!(federate = %self.config.name(), %reason, "start-up cancelled");
        self.phase = StartupPhase::Cancelled;
        vec![StartupAction::Terminate { cause: TerminateCause::Cancelled { reason } }]
    }

    fn try_release(&mut self) -> Vec<StartupAction> {
        if !self.is_satisfied() {
            return Vec::new();
        }

        info!(
            federate = %self.config.name(),
            joined = self.joined.len(),
            "start-up barrier released"
        );
        self.phase = StartupPhase::Ready;
        vec![StartupAction::BeginExecution]
    }

    fn elapsed(&self, now: I) -> Duration {
        if now <= self.started_at { Duration::ZERO } else { now - self.started_at }
    }
}
