//! Async driver for the start-up barrier and the execution phase.
//!
//! The driver owns the I/O: it pulls notifications from an [`RtiConnection`],
//! ticks the clock through the [`Environment`], watches for an operator
//! shutdown, and feeds all three into a [`StartupSession`]. The session
//! decides; the driver only executes its actions.

use std::{future::Future, time::Duration};

use spacefom_core::{
    Environment, FederateConfig, RuntimeEvent, StartupAction, StartupSession, TerminateCause,
};

use crate::{error::FederateError, loopback::RtiConnection, options::RunOptions};

/// Driver timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverConfig {
    /// How long start-up may wait for federates and frames.
    pub startup_timeout: Duration,
    /// Deadline check interval.
    pub tick_interval: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self { startup_timeout: Duration::from_secs(60), tick_interval: Duration::from_millis(100) }
    }
}

/// How the execution phase ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// The configured run duration elapsed.
    Completed,
    /// The operator stopped the run.
    Interrupted,
}

/// Drives one federate through start-up.
pub struct StartupDriver<E: Environment, C: RtiConnection> {
    env: E,
    connection: C,
    config: DriverConfig,
}

impl<E: Environment, C: RtiConnection> StartupDriver<E, C> {
    /// Create a driver.
    pub fn new(env: E, connection: C, config: DriverConfig) -> Self {
        Self { env, connection, config }
    }

    /// Wait at the start-up barrier.
    ///
    /// Returns the configuration, frames activated, once the barrier
    /// releases. `shutdown` resolving cancels the wait.
    ///
    /// # Errors
    ///
    /// - `FederateError::Timeout` if the deadline passes first
    /// - `FederateError::Cancelled` if `shutdown` resolves first
    /// - `FederateError::Startup` for a fatal session error, or if `federate`
    ///   was never initialized
    pub async fn run<S>(
        &mut self,
        federate: FederateConfig,
        shutdown: S,
    ) -> Result<FederateConfig, FederateError>
    where
        S: Future<Output = ()>,
    {
        let mut session =
            StartupSession::new(federate, self.env.now(), self.config.startup_timeout)?;
        tracing::info!(
            federate = %session.config().name(),
            timeout = ?self.config.startup_timeout,
            "waiting for federation start-up"
        );

        tokio::pin!(shutdown);
        let mut connection_open = true;

        loop {
            let mut events = Vec::with_capacity(2);

            tokio::select! {
                event = self.connection.next_event(), if connection_open => {
                    match event? {
                        Some(event) => events.push(event.into_runtime_event()),
                        None => {
                            tracing::debug!("RTI connection has no more notifications");
                            connection_open = false;
                        },
                    }
                    events.push(RuntimeEvent::Tick { now: self.env.now() });
                },
                () = self.env.sleep(self.config.tick_interval) => {
                    events.push(RuntimeEvent::Tick { now: self.env.now() });
                },
                () = &mut shutdown => {
                    events.push(RuntimeEvent::Shutdown { reason: "operator shutdown".to_string() });
                },
            }

            for event in events {
                let actions = match session.handle(event) {
                    Ok(actions) => actions,
                    Err(e) if e.is_fatal() => return Err(e.into()),
                    Err(e) => {
                        tracing::warn!("Dropping runtime notification: {}", e);
                        continue;
                    },
                };

                for action in actions {
                    match action {
                        StartupAction::BeginExecution => return Ok(session.into_config()),
                        StartupAction::Terminate { cause: TerminateCause::DiscoveryTimeout(e) } => {
                            return Err(FederateError::Timeout(e));
                        },
                        StartupAction::Terminate {
                            cause: TerminateCause::Cancelled { reason },
                        } => {
                            return Err(FederateError::Cancelled(reason));
                        },
                    }
                }
            }
        }
    }
}

/// Run the execution phase for the configured duration.
///
/// Without a run duration this waits for `shutdown` alone.
pub async fn run_execution<E, S>(env: &E, options: &RunOptions, shutdown: S) -> ExecutionOutcome
where
    E: Environment,
    S: Future<Output = ()>,
{
    let Some(duration) = options.duration() else {
        shutdown.await;
        return ExecutionOutcome::Interrupted;
    };

    tokio::select! {
        () = env.sleep(duration) => ExecutionOutcome::Completed,
        () = shutdown => ExecutionOutcome::Interrupted,
    }
}
