//! Simulated environment for deterministic testing.
//!
//! Inside a turmoil simulation, tokio's clock is virtual: `sleep` returns as
//! soon as the simulation steps past the deadline, and `now` reports
//! simulated time. `SimEnv` hands that clock to the start-up driver.

use std::time::Duration;

use spacefom_core::Environment;
use tokio::time::Instant;

/// Environment on the simulation clock.
///
/// Only meaningful inside a turmoil host or client, or a tokio runtime with
/// a paused clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimEnv;

impl SimEnv {
    /// Create a simulated environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SimEnv {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn sleep_advances_simulated_time() {
        let mut sim = turmoil::Builder::new().simulation_duration(Duration::from_secs(60)).build();

        sim.client("sleeper", async {
            let env = SimEnv::new();
            let start = env.now();
            env.sleep(Duration::from_secs(30)).await;
            assert!(env.now() - start >= Duration::from_secs(30));
            Ok(())
        });

        sim.run().unwrap();
    }
}
