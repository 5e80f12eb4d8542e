//! Master federate execution timing.
//!
//! The Master owns the federation-wide least common time step (LCTS) and the
//! padding it schedules mode transitions ahead by. Other federates may carry
//! the same values, but they are only binding on the Master.

use crate::{error::ConfigError, time::HlaInterval};

/// Time padding applied when none is configured, in seconds.
pub const DEFAULT_TIME_PADDING_SECONDS: f64 = 1.0;

/// Minimum number of LCTS frames a mode transition padding must span.
pub const MIN_PADDING_FRAMES: i64 = 3;

/// Execution timing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ExecutionTiming {
    least_common_time_step: Option<HlaInterval>,
    time_padding: Option<HlaInterval>,
    scenario_timeline_epoch: Option<f64>,
    use_cte_timeline: bool,
}

impl ExecutionTiming {
    /// Create timing with nothing configured.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the least common time step in microseconds.
    pub fn set_least_common_time_step(&mut self, micros: i64) -> Result<(), ConfigError> {
        if micros <= 0 {
            return Err(ConfigError::InvalidTiming {
                reason: format!("least common time step ({micros}us) must be positive"),
            });
        }
        self.least_common_time_step = Some(HlaInterval::from_micros(micros));
        Ok(())
    }

    /// Set the mode transition padding in seconds.
    pub fn set_time_padding(&mut self, seconds: f64) -> Result<(), ConfigError> {
        if !seconds.is_finite() || seconds <= 0.0 {
            return Err(ConfigError::InvalidTiming {
                reason: format!("time padding ({seconds}s) must be positive"),
            });
        }
        self.time_padding = Some(HlaInterval::from_seconds(seconds));
        Ok(())
    }

    /// Set the scenario timeline epoch (Terrestrial Time seconds).
    pub fn set_scenario_timeline_epoch(&mut self, seconds: f64) -> Result<(), ConfigError> {
        if !seconds.is_finite() {
            return Err(ConfigError::InvalidTiming {
                reason: format!("scenario timeline epoch ({seconds}) must be finite"),
            });
        }
        self.scenario_timeline_epoch = Some(seconds);
        Ok(())
    }

    /// Select the common timing equipment (CTE) timeline for mode transitions.
    pub fn set_cte_timeline(&mut self, on: bool) {
        self.use_cte_timeline = on;
    }

    /// Least common time step, if configured.
    pub fn least_common_time_step(&self) -> Option<HlaInterval> {
        self.least_common_time_step
    }

    /// Mode transition padding, falling back to the default.
    pub fn time_padding(&self) -> HlaInterval {
        self.time_padding.unwrap_or_else(|| HlaInterval::from_seconds(DEFAULT_TIME_PADDING_SECONDS))
    }

    /// Scenario timeline epoch, if configured.
    pub fn scenario_timeline_epoch(&self) -> Option<f64> {
        self.scenario_timeline_epoch
    }

    /// Whether mode transitions follow the CTE timeline.
    pub fn uses_cte_timeline(&self) -> bool {
        self.use_cte_timeline
    }

    /// Check the constraints binding on the Master federate.
    ///
    /// - the LCTS is set and positive
    /// - a positive lookahead is no larger than the LCTS and divides it
    /// - the padding is a multiple of the LCTS spanning at least
    ///   [`MIN_PADDING_FRAMES`] of them
    pub fn validate_for_master(&self, lookahead: HlaInterval) -> Result<(), ConfigError> {
        let Some(lcts) = self.least_common_time_step.filter(|lcts| lcts.is_positive()) else {
            return Err(ConfigError::InvalidTiming {
                reason: "master federate requires a positive least common time step".to_string(),
            });
        };

        if lookahead.is_positive() {
            if lookahead > lcts {
                return Err(ConfigError::InvalidTiming {
                    reason: format!("lookahead ({lookahead}) exceeds time step ({lcts})"),
                });
            }
            if !lcts.is_multiple_of(lookahead) {
                return Err(ConfigError::InvalidTiming {
                    reason: format!("time step ({lcts}) not a multiple of lookahead ({lookahead})"),
                });
            }
        }

        let padding = self.time_padding();
        if !padding.is_multiple_of(lcts) {
            return Err(ConfigError::InvalidTiming {
                reason: format!(
                    "time padding ({padding}) is not a multiple of least common time step ({lcts})"
                ),
            });
        }
        if padding.as_micros() < MIN_PADDING_FRAMES.saturating_mul(lcts.as_micros()) {
            return Err(ConfigError::InvalidTiming {
                reason: format!(
                    "time padding ({padding}) under {MIN_PADDING_FRAMES} time steps ({lcts})"
                ),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn master_timing(lcts: i64, padding: f64) -> ExecutionTiming {
        let mut timing = ExecutionTiming::new();
        timing.set_least_common_time_step(lcts).unwrap();
        timing.set_time_padding(padding).unwrap();
        timing
    }

    #[test]
    fn reference_master_timing_is_valid() {
        let timing = master_timing(250_000, 1.0);
        assert!(timing.validate_for_master(HlaInterval::from_seconds(0.25)).is_ok());
    }

    #[test]
    fn missing_lcts_is_rejected_for_master() {
        let timing = ExecutionTiming::new();
        assert!(timing.validate_for_master(HlaInterval::ZERO).is_err());
    }

    #[test]
    fn non_positive_lcts_is_rejected_by_setter() {
        let mut timing = ExecutionTiming::new();
        assert!(timing.set_least_common_time_step(0).is_err());
        assert!(timing.set_least_common_time_step(-5).is_err());
        assert_eq!(timing.least_common_time_step(), None);
    }

    #[test]
    fn lookahead_larger_than_lcts_is_rejected() {
        let timing = master_timing(250_000, 1.0);
        assert!(timing.validate_for_master(HlaInterval::from_seconds(0.5)).is_err());
    }

    #[test]
    fn lcts_must_be_multiple_of_lookahead() {
        let timing = master_timing(250_000, 1.0);
        assert!(timing.validate_for_master(HlaInterval::from_micros(100_000)).is_err());
        assert!(timing.validate_for_master(HlaInterval::from_micros(125_000)).is_ok());
    }

    #[test]
    fn zero_lookahead_skips_lookahead_checks() {
        let timing = master_timing(250_000, 1.0);
        assert!(timing.validate_for_master(HlaInterval::ZERO).is_ok());
    }

    #[test]
    fn padding_constraints() {
        let lookahead = HlaInterval::from_seconds(0.25);
        assert!(master_timing(250_000, 1.1).validate_for_master(lookahead).is_err());
        assert!(master_timing(250_000, 0.5).validate_for_master(lookahead).is_err());
        assert!(master_timing(250_000, 0.75).validate_for_master(lookahead).is_ok());
    }

    #[test]
    fn default_padding_applies() {
        let mut timing = ExecutionTiming::new();
        timing.set_least_common_time_step(500_000).unwrap();
        assert_eq!(timing.time_padding().as_micros(), 1_000_000);
        assert!(timing.validate_for_master(HlaInterval::ZERO).is_err());
    }

    #[test]
    fn scenario_epoch_must_be_finite() {
        let mut timing = ExecutionTiming::new();
        assert!(timing.set_scenario_timeline_epoch(f64::NAN).is_err());
        timing.set_scenario_timeline_epoch(18_487.75 * 86_400.0 + 37.0 + 32.184).unwrap();
        assert!(timing.scenario_timeline_epoch().is_some());
    }
}
