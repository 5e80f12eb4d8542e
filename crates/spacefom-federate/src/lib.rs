//! SpaceFOM role-test federate.
//!
//! This crate runs one federate of the SpaceFOM role test:
//! - Reference run profiles for the Master, Pacing, RRFP and Other federates
//! - A loopback RTI that plays the rest of the federation in-process
//! - A tokio driver for the start-up barrier and the execution phase
//!
//! ## Architecture
//!
//! ```text
//! spacefom-federate
//!   ├─ RunProfile     (reference federate configurations)
//!   ├─ LoopbackRti    (FederationRuntime + RtiConnection)
//!   ├─ StartupDriver  (drives spacefom_core::StartupSession)
//!   ├─ SystemEnv      (production Environment impl)
//!   └─ RunOptions     (--stop / --nostop)
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod driver;
mod error;
mod loopback;
mod options;
pub mod profiles;
mod system_env;

use std::future::Future;

pub use driver::{DriverConfig, ExecutionOutcome, StartupDriver, run_execution};
pub use error::FederateError;
pub use loopback::{FederationEvent, LoopbackError, LoopbackRti, RtiConnection};
pub use options::{DEFAULT_RUN_DURATION_SECONDS, RunOptions};
pub use profiles::RunProfile;
use spacefom_core::{Environment, FederateConfig};
pub use system_env::SystemEnv;

/// Everything needed to run one reference federate against the loopback RTI.
#[derive(Debug, Clone)]
pub struct FederateRun {
    /// Federate to run.
    pub profile: RunProfile,
    /// Federation execution name.
    pub federation: String,
    /// Execution phase options.
    pub options: RunOptions,
    /// Start-up timing.
    pub driver: DriverConfig,
    /// Shuffle loopback notifications with this seed.
    pub seed: Option<u64>,
}

impl FederateRun {
    /// Run `profile` with the reference federation and default timing.
    pub fn new(profile: RunProfile) -> Self {
        Self {
            profile,
            federation: profiles::DEFAULT_FEDERATION.to_string(),
            options: RunOptions::default(),
            driver: DriverConfig::default(),
            seed: None,
        }
    }

    /// Build the loopback federation from every other reference profile.
    pub fn loopback<E: Environment>(&self, env: E) -> Result<LoopbackRti<E>, FederateError> {
        let peers = RunProfile::ALL
            .into_iter()
            .filter(|profile| *profile != self.profile)
            .map(|profile| profile.declare(&self.federation))
            .collect::<Result<Vec<_>, _>>()?;

        let rti = LoopbackRti::new(env, self.federation.clone(), peers);
        Ok(match self.seed {
            Some(seed) => rti.with_seed(seed),
            None => rti,
        })
    }

    /// Configure, initialize, wait at the start-up barrier and execute.
    ///
    /// `shutdown` is called once per phase to obtain the operator stop
    /// signal for it.
    pub async fn execute<E, F, S>(
        &self,
        env: E,
        mut shutdown: F,
    ) -> Result<(FederateConfig, ExecutionOutcome), FederateError>
    where
        E: Environment,
        F: FnMut() -> S,
        S: Future<Output = ()>,
    {
        let mut config = self.profile.build(&self.federation)?;
        let mut rti = self.loopback(env.clone())?;
        config.initialize(&mut rti)?;

        let mut driver = StartupDriver::new(env.clone(), rti, self.driver);
        let config = driver.run(config, shutdown()).await?;
        tracing::info!(federate = %config.name(), "federation execution started");

        let outcome = run_execution(&env, &self.options, shutdown()).await;
        tracing::info!(federate = %config.name(), ?outcome, "federation execution finished");
        Ok((config, outcome))
    }
}
