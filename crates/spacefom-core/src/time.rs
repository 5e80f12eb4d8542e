//! HLA logical time and time-management parameters.
//!
//! Logical time is carried as signed 64-bit microseconds, matching the
//! HLAinteger64Time representation used by SpaceFOM federations. Lookahead is
//! validated in that representation so a value that rounds to zero
//! microseconds is treated as zero.

use std::fmt;

use crate::error::ConfigError;

/// Microseconds per second.
pub const MICROS_PER_SECOND: i64 = 1_000_000;

/// Largest representable logical time, in whole seconds.
#[allow(clippy::cast_precision_loss)]
pub const MAX_LOGICAL_TIME_SECONDS: f64 = (i64::MAX / MICROS_PER_SECOND) as f64;

/// A logical time interval in microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct HlaInterval(i64);

impl HlaInterval {
    /// The zero interval.
    pub const ZERO: Self = Self(0);

    /// The largest representable interval.
    pub const MAX: Self = Self(i64::MAX);

    /// Create an interval from microseconds.
    pub const fn from_micros(micros: i64) -> Self {
        Self(micros)
    }

    /// Convert seconds to microseconds.
    ///
    /// Whole seconds are truncated and the fractional part is rounded half
    /// away from zero to the nearest microsecond. Magnitudes beyond
    /// [`MAX_LOGICAL_TIME_SECONDS`] clamp. Callers must reject non-finite
    /// input first.
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_seconds(seconds: f64) -> Self {
        if seconds > MAX_LOGICAL_TIME_SECONDS {
            return Self::MAX;
        }
        if seconds < -MAX_LOGICAL_TIME_SECONDS {
            return Self(-i64::MAX);
        }

        let whole = seconds.trunc() as i64;
        let fraction = (seconds * 1_000_000.0) % 1_000_000.0;
        let micros = if whole >= 0 { (fraction + 0.5) as i64 } else { (fraction - 0.5) as i64 };

        Self(whole.saturating_mul(MICROS_PER_SECOND).saturating_add(micros))
    }

    /// Interval in microseconds.
    pub const fn as_micros(self) -> i64 {
        self.0
    }

    /// Interval in seconds.
    #[allow(clippy::cast_precision_loss)]
    pub fn as_seconds(self) -> f64 {
        self.0 as f64 / 1_000_000.0
    }

    /// Whether the interval is strictly positive.
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Whether `self` is a whole multiple of a positive `step`.
    pub const fn is_multiple_of(self, step: Self) -> bool {
        step.0 > 0 && self.0 % step.0 == 0
    }
}

impl fmt::Display for HlaInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}us", self.0)
    }
}

/// How a federate participates in the shared time axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeMode {
    /// Constrains others and is gated by others.
    RegulatingAndConstrained,
    /// Constrains others but advances freely.
    RegulatingOnly,
    /// Follows the federation clock without pacing it.
    ConstrainedOnly,
    /// Outside the shared time axis; no causal ordering guarantees.
    Decoupled,
}

impl TimeMode {
    /// Whether the federate takes part in causal ordering at all.
    pub fn participates(self) -> bool {
        self != Self::Decoupled
    }
}

/// Lookahead and time-management flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeManagementConfig {
    lookahead: HlaInterval,
    regulating: bool,
    constrained: bool,
}

impl TimeManagementConfig {
    /// Create a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidLookahead` for a non-finite or negative
    /// lookahead, or a zero lookahead while regulating.
    pub fn new(
        lookahead_seconds: f64,
        regulating: bool,
        constrained: bool,
    ) -> Result<Self, ConfigError> {
        let lookahead = checked_lookahead(lookahead_seconds)?;
        let config = Self { lookahead, regulating, constrained };
        config.validate()?;
        Ok(config)
    }

    /// Set the lookahead in seconds.
    pub fn set_lookahead_time(&mut self, seconds: f64) -> Result<(), ConfigError> {
        let lookahead = checked_lookahead(seconds)?;
        if self.regulating && !lookahead.is_positive() {
            return Err(ConfigError::InvalidLookahead { seconds, reason: REGULATING_REASON });
        }
        self.lookahead = lookahead;
        Ok(())
    }

    /// Set whether this federate's timestamps constrain the federation.
    pub fn set_time_regulating(&mut self, on: bool) -> Result<(), ConfigError> {
        if on && !self.lookahead.is_positive() {
            return Err(ConfigError::InvalidLookahead {
                seconds: self.lookahead.as_seconds(),
                reason: REGULATING_REASON,
            });
        }
        self.regulating = on;
        Ok(())
    }

    /// Set whether this federate's advancement is gated by the federation.
    pub fn set_time_constrained(&mut self, on: bool) {
        self.constrained = on;
    }

    /// Lookahead interval.
    pub fn lookahead(&self) -> HlaInterval {
        self.lookahead
    }

    /// Whether the federate is time-regulating.
    pub fn is_regulating(&self) -> bool {
        self.regulating
    }

    /// Whether the federate is time-constrained.
    pub fn is_constrained(&self) -> bool {
        self.constrained
    }

    /// Participation in the shared time axis.
    pub fn time_mode(&self) -> TimeMode {
        match (self.regulating, self.constrained) {
            (true, true) => TimeMode::RegulatingAndConstrained,
            (true, false) => TimeMode::RegulatingOnly,
            (false, true) => TimeMode::ConstrainedOnly,
            (false, false) => TimeMode::Decoupled,
        }
    }

    /// Check internal consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.regulating && !self.lookahead.is_positive() {
            return Err(ConfigError::InvalidLookahead {
                seconds: self.lookahead.as_seconds(),
                reason: REGULATING_REASON,
            });
        }
        Ok(())
    }
}

const REGULATING_REASON: &str = "must be positive for a time-regulating federate";

fn checked_lookahead(seconds: f64) -> Result<HlaInterval, ConfigError> {
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(ConfigError::InvalidLookahead {
            seconds,
            reason: "must be finite and non-negative",
        });
    }
    Ok(HlaInterval::from_seconds(seconds))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn seconds_convert_to_micros() {
        assert_eq!(HlaInterval::from_seconds(0.25).as_micros(), 250_000);
        assert_eq!(HlaInterval::from_seconds(1.0).as_micros(), 1_000_000);
        assert_eq!(HlaInterval::from_seconds(-2.5).as_micros(), -2_500_000);
        assert_eq!(HlaInterval::from_seconds(0.000_000_4).as_micros(), 0);
        assert_eq!(HlaInterval::from_seconds(0.000_000_6).as_micros(), 1);
    }

    #[test]
    fn conversion_clamps_at_max_logical_time() {
        assert_eq!(HlaInterval::from_seconds(1.0e30), HlaInterval::MAX);
        assert_eq!(HlaInterval::from_seconds(-1.0e30).as_micros(), -i64::MAX);
    }

    #[test]
    fn multiples() {
        let lcts = HlaInterval::from_micros(250_000);
        assert!(HlaInterval::from_micros(1_000_000).is_multiple_of(lcts));
        assert!(!HlaInterval::from_micros(1_100_000).is_multiple_of(lcts));
        assert!(!lcts.is_multiple_of(HlaInterval::ZERO));
    }

    #[test]
    fn regulating_rejects_zero_lookahead() {
        assert!(matches!(
            TimeManagementConfig::new(0.0, true, false),
            Err(ConfigError::InvalidLookahead { .. })
        ));
        assert!(TimeManagementConfig::new(0.0, false, true).is_ok());
    }

    #[test]
    fn lookahead_rounding_to_zero_counts_as_zero() {
        assert!(TimeManagementConfig::new(1.0e-7, true, true).is_err());
    }

    #[test]
    fn negative_and_nan_lookahead_rejected_even_when_not_regulating() {
        let mut config = TimeManagementConfig::default();
        assert!(config.set_lookahead_time(-0.1).is_err());
        assert!(config.set_lookahead_time(f64::NAN).is_err());
        assert!(config.set_lookahead_time(f64::INFINITY).is_err());
        assert_eq!(config.lookahead(), HlaInterval::ZERO);
    }

    #[test]
    fn setter_order_is_checked_both_ways() {
        let mut config = TimeManagementConfig::default();
        assert!(config.set_time_regulating(true).is_err());
        assert!(!config.is_regulating());

        config.set_lookahead_time(0.25).unwrap();
        config.set_time_regulating(true).unwrap();
        assert!(config.set_lookahead_time(0.0).is_err());
        assert_eq!(config.lookahead().as_micros(), 250_000);
    }

    #[test]
    fn time_modes() {
        let follower = TimeManagementConfig::new(0.25, false, true).unwrap();
        assert_eq!(follower.time_mode(), TimeMode::ConstrainedOnly);
        assert!(follower.time_mode().participates());

        let detached = TimeManagementConfig::new(0.25, false, false).unwrap();
        assert_eq!(detached.time_mode(), TimeMode::Decoupled);
        assert!(!detached.time_mode().participates());
    }

    proptest! {
        #[test]
        fn prop_regulating_requires_positive_lookahead(seconds in -10.0f64..=0.0) {
            prop_assert!(TimeManagementConfig::new(seconds, true, true).is_err());
        }

        #[test]
        fn prop_whole_micros_are_exact(micros in 0i64..10_000_000_000) {
            let seconds = HlaInterval::from_micros(micros).as_seconds();
            prop_assert_eq!(HlaInterval::from_seconds(seconds).as_micros(), micros);
        }
    }
}
