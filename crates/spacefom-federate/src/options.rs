//! Run options.

use std::time::Duration;

use crate::error::FederateError;

/// Run duration when neither `--stop` nor `--nostop` is given, in seconds.
pub const DEFAULT_RUN_DURATION_SECONDS: f64 = 10.0;

/// How long the federate runs once execution begins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunOptions {
    /// Seconds of execution; `None` runs until the operator stops it.
    pub run_duration: Option<f64>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self { run_duration: Some(DEFAULT_RUN_DURATION_SECONDS) }
    }
}

impl RunOptions {
    /// Build options from the `--stop` and `--nostop` flags.
    ///
    /// `--nostop` wins over a stop time. A stop time must be finite and
    /// positive.
    pub fn from_flags(stop: Option<f64>, nostop: bool) -> Result<Self, FederateError> {
        if nostop {
            return Ok(Self { run_duration: None });
        }

        match stop {
            None => Ok(Self::default()),
            Some(seconds) if seconds > 0.0 && Duration::try_from_secs_f64(seconds).is_ok() => {
                Ok(Self { run_duration: Some(seconds) })
            },
            Some(seconds) => {
                Err(FederateError::Options(format!("stop time {seconds} must be positive")))
            },
        }
    }

    /// Run duration as a `Duration`, if bounded.
    ///
    /// Values too large for a `Duration` saturate.
    pub fn duration(&self) -> Option<Duration> {
        self.run_duration
            .map(|seconds| Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX))
    }
}
