//! Seeded, sans-IO simulation of a whole federation starting up.
//!
//! Every member is initialized against a shared registrar, then the
//! federation is planned: each enabled member joins at a random time, and
//! every notification reaches every member after a random latency. The
//! plan is a pure function of the member list and the seed.
//!
//! The plan can be run two ways:
//!
//! - [`SimFederation::run_startup`] steps one `StartupSession` per member on
//!   a `Duration` clock, with no runtime at all
//! - [`SimFederation::into_plans`] hands each member its notification
//!   schedule, to be replayed by a [`crate::SimRti`] inside turmoil

use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use spacefom_core::{
    ConfigError, DiscoveryTimeoutError, FederateConfig, FederateDeclaration, FederationAudit,
    FederationConsistencyError, FederationRuntime, RuntimeEvent, StartupAction, StartupError,
    StartupPhase, StartupSession, TerminateCause,
};
use spacefom_federate::{FederationEvent, LoopbackError};

/// A notification and when it reaches the member, relative to start-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledEvent {
    /// Delivery time.
    pub at: Duration,
    /// Notification.
    pub event: FederationEvent,
}

/// One member's initialized configuration and notification schedule.
#[derive(Debug, Clone)]
pub struct MemberPlan {
    /// Initialized configuration.
    pub config: FederateConfig,
    /// Notifications in delivery order.
    pub events: Vec<ScheduledEvent>,
}

/// How one member's start-up ended.
#[derive(Debug, Clone)]
pub struct StartupReport {
    /// Federate name.
    pub federate: String,
    /// Final phase.
    pub phase: StartupPhase,
    /// Simulated time of the final transition.
    pub finished_at: Duration,
    /// What was missing, if the deadline passed.
    pub timeout: Option<DiscoveryTimeoutError>,
    /// Notifications the session refused.
    pub dropped: usize,
    /// Configuration after start-up.
    pub config: FederateConfig,
}

impl StartupReport {
    /// Whether the barrier released.
    pub fn released(&self) -> bool {
        self.phase == StartupPhase::Ready
    }
}

/// Result of a simulated start-up.
#[derive(Debug, Clone)]
pub struct SimOutcome {
    /// Every declaration, disabled federates included.
    pub declarations: Vec<FederateDeclaration>,
    /// One report per enabled federate, in join order.
    pub reports: Vec<StartupReport>,
}

impl SimOutcome {
    /// Report for a federate.
    pub fn report(&self, federate: &str) -> Option<&StartupReport> {
        self.reports.iter().find(|report| report.federate == federate)
    }

    /// Whether every enabled federate released.
    pub fn all_released(&self) -> bool {
        self.reports.iter().all(StartupReport::released)
    }

    /// Cross-federate consistency findings.
    pub fn findings(&self) -> Vec<FederationConsistencyError> {
        FederationAudit::check(&self.declarations)
    }
}

/// Accepts one declaration per federate name for a single federation.
struct Registrar<'a> {
    federation: &'a str,
    declared: &'a [FederateDeclaration],
}

impl FederationRuntime for Registrar<'_> {
    type Error = LoopbackError;

    fn submit(&mut self, declaration: &FederateDeclaration) -> Result<(), Self::Error> {
        if declaration.federation != self.federation {
            return Err(LoopbackError::FederationMismatch {
                expected: self.federation.to_string(),
                found: declaration.federation.clone(),
            });
        }
        if self.declared.iter().any(|existing| existing.federate == declaration.federate) {
            return Err(LoopbackError::AlreadySubmitted { federate: declaration.federate.clone() });
        }
        Ok(())
    }
}

/// Seeded federation of initialized members.
pub struct SimFederation {
    federation: String,
    members: Vec<FederateConfig>,
    declarations: Vec<FederateDeclaration>,
    rng: ChaCha8Rng,
    max_latency: Duration,
}

impl SimFederation {
    /// Empty federation; `seed` fixes every join time and latency.
    pub fn new(federation: impl Into<String>, seed: u64) -> Self {
        Self {
            federation: federation.into(),
            members: Vec::new(),
            declarations: Vec::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            max_latency: Duration::from_millis(500),
        }
    }

    /// Upper bound for join times and notification latencies.
    #[must_use]
    pub fn with_max_latency(mut self, max_latency: Duration) -> Self {
        self.max_latency = max_latency;
        self
    }

    /// Federation execution name.
    pub fn federation(&self) -> &str {
        &self.federation
    }

    /// Initialize `config` and add it to the federation.
    ///
    /// # Errors
    ///
    /// Returns the `initialize()` failure. A second declaration under the
    /// same federate name is rejected as `ConfigError::Rejected`.
    pub fn join(&mut self, mut config: FederateConfig) -> Result<(), ConfigError> {
        let mut registrar =
            Registrar { federation: &self.federation, declared: &self.declarations };
        let declaration = config.initialize(&mut registrar)?.clone();

        self.declarations.push(declaration);
        self.members.push(config);
        Ok(())
    }

    /// Declarations of every member.
    pub fn declarations(&self) -> &[FederateDeclaration] {
        &self.declarations
    }

    /// Notification schedule of every enabled member, in join order.
    pub fn into_plans(mut self) -> Vec<MemberPlan> {
        let enabled: Vec<bool> =
            self.declarations.iter().map(|declaration| declaration.enabled).collect();
        let joined_at: Vec<Option<Duration>> =
            enabled.into_iter().map(|enabled| enabled.then(|| self.latency())).collect();

        let mut plans = Vec::with_capacity(self.members.len());
        let members = std::mem::take(&mut self.members);
        for (index, config) in members.into_iter().enumerate() {
            let Some(own_join) = joined_at[index] else {
                continue;
            };
            let events = self.schedule(index, own_join, &joined_at);
            plans.push(MemberPlan { config, events });
        }
        plans
    }

    /// Step every enabled member's start-up session to a terminal phase.
    ///
    /// Sessions start at time zero and see a clock tick every `tick`.
    ///
    /// # Errors
    ///
    /// Returns the first fatal `StartupError` any session raises.
    pub fn run_startup(
        self,
        timeout: Duration,
        tick: Duration,
    ) -> Result<SimOutcome, StartupError> {
        let declarations = self.declarations.clone();
        let tick = tick.max(Duration::from_millis(1));

        let reports = self
            .into_plans()
            .into_iter()
            .map(|plan| drive(plan, timeout, tick))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SimOutcome { declarations, reports })
    }

    fn schedule(
        &mut self,
        index: usize,
        own_join: Duration,
        joined_at: &[Option<Duration>],
    ) -> Vec<ScheduledEvent> {
        let mut events = Vec::new();

        let joins: Vec<(String, Duration)> = self
            .declarations
            .iter()
            .zip(joined_at)
            .filter_map(|(declaration, joined)| Some((declaration.federate.clone(), (*joined)?)))
            .collect();
        for (name, joined) in joins {
            let at = joined + self.latency();
            events.push(ScheduledEvent { at, event: FederationEvent::FederateJoined { name } });
        }

        let local = self.declarations[index].clone();
        for frame in local.all_frames() {
            let name = frame.name.clone();
            if frame.publishes() {
                let event = FederationEvent::FrameDiscovered { name };
                events.push(ScheduledEvent { at: own_join + self.latency(), event });
                continue;
            }

            let publisher_joined = self
                .declarations
                .iter()
                .zip(joined_at)
                .enumerate()
                .filter(|(peer, _)| *peer != index)
                .filter_map(|(_, (declaration, joined))| {
                    let publishes = declaration.frame(&frame.name)?.publishes();
                    (*joined).filter(|_| publishes)
                })
                .min();
            if let Some(joined) = publisher_joined {
                let event = FederationEvent::SubscriptionMatched { name };
                events.push(ScheduledEvent { at: joined.max(own_join) + self.latency(), event });
            }
        }

        events.sort_by_key(|scheduled| scheduled.at);
        events
    }

    fn latency(&mut self) -> Duration {
        let max = u64::try_from(self.max_latency.as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(self.rng.gen_range(0..=max))
    }
}

fn drive(
    plan: MemberPlan,
    timeout: Duration,
    tick: Duration,
) -> Result<StartupReport, StartupError> {
    let federate = plan.config.name().to_string();
    let mut session = StartupSession::new(plan.config, Duration::ZERO, timeout)?;
    let mut events = plan.events.into_iter().peekable();

    let mut now = Duration::ZERO;
    let mut next_tick = tick;
    let mut dropped = 0;
    let mut timed_out = None;

    while !session.phase().is_terminal() {
        let event = match events.next_if(|scheduled| scheduled.at <= next_tick) {
            Some(scheduled) => {
                now = scheduled.at;
                scheduled.event.into_runtime_event()
            },
            None => {
                now = next_tick;
                next_tick += tick;
                RuntimeEvent::Tick { now }
            },
        };

        let actions = match session.handle(event) {
            Ok(actions) => actions,
            Err(e) if e.is_fatal() => return Err(e),
            Err(_) => {
                dropped += 1;
                continue;
            },
        };
        timed_out = timed_out.or_else(|| {
            actions.into_iter().find_map(|action| match action {
                StartupAction::Terminate { cause: TerminateCause::DiscoveryTimeout(e) } => Some(e),
                _ => None,
            })
        });
    }

    Ok(StartupReport {
        federate,
        phase: session.phase(),
        finished_at: now,
        timeout: timed_out,
        dropped,
        config: session.into_config(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use spacefom_federate::{RunProfile, profiles::DEFAULT_FEDERATION};

    use super::*;

    fn federation(seed: u64, profiles: &[RunProfile]) -> SimFederation {
        let mut federation = SimFederation::new(DEFAULT_FEDERATION, seed);
        for profile in profiles {
            federation.join(profile.build(DEFAULT_FEDERATION).unwrap()).unwrap();
        }
        federation
    }

    #[test]
    fn reference_federation_releases() {
        let outcome = federation(7, &RunProfile::ALL)
            .run_startup(Duration::from_secs(60), Duration::from_millis(100))
            .unwrap();

        assert!(outcome.all_released());
        assert_eq!(outcome.reports.len(), 4);
        assert!(outcome.findings().is_empty());
        for report in &outcome.reports {
            assert!(report.finished_at <= Duration::from_secs(1), "{}", report.federate);
            assert!(report.config.inactive_frames().is_empty());
        }
    }

    #[test]
    fn same_name_cannot_join_twice() {
        let mut federation = federation(1, &[RunProfile::Rrfp]);
        let err = federation.join(RunProfile::Rrfp.build(DEFAULT_FEDERATION).unwrap()).unwrap_err();
        assert!(matches!(err, ConfigError::Rejected { .. }));
        assert_eq!(federation.declarations().len(), 1);
    }

    #[test]
    fn disabled_member_is_not_planned() {
        let mut federation = federation(3, &[RunProfile::Master, RunProfile::Rrfp]);
        let mut pacing = RunProfile::Pacing.build(DEFAULT_FEDERATION).unwrap();
        pacing.set_enabled(false).unwrap();
        federation.join(pacing).unwrap();

        let plans = federation.into_plans();
        assert_eq!(plans.len(), 2);
        let master = &plans[0];
        assert!(!master.events.iter().any(|scheduled| {
            scheduled.event == FederationEvent::FederateJoined { name: "Pacing".into() }
        }));
    }

    #[test]
    fn plans_are_reproducible() {
        let plans = |seed| {
            federation(seed, &RunProfile::ALL)
                .into_plans()
                .into_iter()
                .map(|plan| plan.events)
                .collect::<Vec<_>>()
        };
        assert_eq!(plans(99), plans(99));
    }

    #[test]
    fn schedules_are_time_ordered() {
        for plan in federation(5, &RunProfile::ALL).into_plans() {
            assert!(plan.events.windows(2).all(|pair| pair[0].at <= pair[1].at));
        }
    }
}
