//! RTI connection replaying a planned notification schedule.

use std::collections::VecDeque;

use async_trait::async_trait;
use spacefom_core::Environment;
use spacefom_federate::{FederateError, FederationEvent, RtiConnection};

use crate::sim_federation::ScheduledEvent;

/// Delivers each scheduled notification once its time has come.
///
/// Times are relative to construction. Waiting is done against the
/// environment clock, so inside turmoil a schedule spanning minutes replays
/// instantly.
pub struct SimRti<E: Environment> {
    env: E,
    started: E::Instant,
    schedule: VecDeque<ScheduledEvent>,
}

impl<E: Environment> SimRti<E> {
    /// Start replaying `schedule` now.
    pub fn new(env: E, schedule: Vec<ScheduledEvent>) -> Self {
        let started = env.now();
        Self { env, started, schedule: schedule.into() }
    }

    /// Notifications not yet delivered.
    pub fn remaining(&self) -> usize {
        self.schedule.len()
    }
}

#[async_trait]
impl<E: Environment> RtiConnection for SimRti<E> {
    async fn next_event(&mut self) -> Result<Option<FederationEvent>, FederateError> {
        let Some(next) = self.schedule.front() else {
            return Ok(None);
        };

        let due = self.started + next.at;
        let now = self.env.now();
        if due > now {
            self.env.sleep(due - now).await;
        }
        Ok(self.schedule.pop_front().map(|scheduled| scheduled.event))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::sim_env::SimEnv;

    #[test]
    fn events_arrive_on_schedule() {
        let mut sim = turmoil::Builder::new().simulation_duration(Duration::from_secs(60)).build();

        sim.client("federate", async {
            let env = SimEnv::new();
            let schedule = vec![
                ScheduledEvent {
                    at: Duration::from_secs(2),
                    event: FederationEvent::FederateJoined { name: "Master".into() },
                },
                ScheduledEvent {
                    at: Duration::from_secs(5),
                    event: FederationEvent::FrameDiscovered { name: "RootFrame".into() },
                },
            ];
            let mut rti = SimRti::new(env, schedule);
            let start = env.now();

            let first = rti.next_event().await?;
            assert_eq!(first, Some(FederationEvent::FederateJoined { name: "Master".into() }));
            assert!(env.now() - start >= Duration::from_secs(2));

            rti.next_event().await?;
            assert!(env.now() - start >= Duration::from_secs(5));
            assert_eq!(rti.remaining(), 0);
            assert_eq!(rti.next_event().await?, None);
            Ok(())
        });

        sim.run().unwrap();
    }
}
