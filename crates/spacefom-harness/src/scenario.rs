//! Scenario builder for federation start-up runs.
//!
//! A scenario picks the federation members, seeds the simulation, runs the
//! start-up barrier of every member and checks the outcome with oracles.
//!
//! ```rust,ignore
//! Scenario::new()
//!     .without(RunProfile::Rrfp)
//!     .with_timeout(Duration::from_secs(30))
//!     .oracle(Box::new(|outcome| {
//!         if outcome.all_released() { Err("released without RRFP".into()) } else { Ok(()) }
//!     }))
//!     .run()?;
//! ```

use std::time::Duration;

use spacefom_core::FederateConfig;
use spacefom_federate::{RunProfile, profiles::DEFAULT_FEDERATION};

use crate::sim_federation::{SimFederation, SimOutcome};

/// Check run against the outcome of a scenario.
pub type Oracle = Box<dyn Fn(&SimOutcome) -> Result<(), String>>;

/// Federation start-up scenario.
pub struct Scenario {
    federation: String,
    profiles: Vec<RunProfile>,
    custom: Vec<FederateConfig>,
    seed: u64,
    max_latency: Duration,
    timeout: Duration,
    tick: Duration,
    oracles: Vec<Oracle>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self::new()
    }
}

impl Scenario {
    /// The reference role test federation with default timing.
    pub fn new() -> Self {
        Self {
            federation: DEFAULT_FEDERATION.to_string(),
            profiles: RunProfile::ALL.to_vec(),
            custom: Vec::new(),
            seed: 0,
            max_latency: Duration::from_millis(500),
            timeout: Duration::from_secs(60),
            tick: Duration::from_millis(100),
            oracles: Vec::new(),
        }
    }

    /// Leave a reference federate out.
    #[must_use]
    pub fn without(mut self, profile: RunProfile) -> Self {
        self.profiles.retain(|member| *member != profile);
        self
    }

    /// Add a hand-built federate, joined after the reference profiles.
    #[must_use]
    pub fn with_federate(mut self, config: FederateConfig) -> Self {
        self.custom.push(config);
        self
    }

    /// Seed for join times and latencies.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Upper bound for join times and latencies.
    #[must_use]
    pub fn with_max_latency(mut self, max_latency: Duration) -> Self {
        self.max_latency = max_latency;
        self
    }

    /// Start-up deadline of every member.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Add an oracle.
    #[must_use]
    pub fn oracle(mut self, oracle: Oracle) -> Self {
        self.oracles.push(oracle);
        self
    }

    /// Run the scenario and every oracle.
    ///
    /// # Errors
    ///
    /// Returns a description of the first member that fails to initialize,
    /// a fatal start-up error, or the first oracle failure.
    pub fn run(self) -> Result<SimOutcome, String> {
        let mut federation =
            SimFederation::new(&self.federation, self.seed).with_max_latency(self.max_latency);

        for profile in &self.profiles {
            let config = profile.build(&self.federation).map_err(|e| format!("{profile}: {e}"))?;
            federation.join(config).map_err(|e| format!("{profile}: {e}"))?;
        }
        for config in self.custom {
            let name = config.name().to_string();
            federation.join(config).map_err(|e| format!("{name}: {e}"))?;
        }

        let outcome = federation
            .run_startup(self.timeout, self.tick)
            .map_err(|e| format!("start-up failed: {e}"))?;

        for oracle in &self.oracles {
            oracle(&outcome)?;
        }
        Ok(outcome)
    }
}

/// Oracle: every enabled member released.
pub fn all_released() -> Oracle {
    Box::new(|outcome| {
        let stuck: Vec<&str> = outcome
            .reports
            .iter()
            .filter(|report| !report.released())
            .map(|report| report.federate.as_str())
            .collect();
        if stuck.is_empty() { Ok(()) } else { Err(format!("not released: {}", stuck.join(", "))) }
    })
}

/// Oracle: the declarations pass the federation audit.
pub fn consistent() -> Oracle {
    Box::new(|outcome| {
        let findings = outcome.findings();
        if findings.is_empty() {
            return Ok(());
        }
        let findings: Vec<String> = findings.iter().map(ToString::to_string).collect();
        Err(findings.join("; "))
    })
}
