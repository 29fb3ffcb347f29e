//! Survey-in preset

use crate::{
    cfg::{positive, Error, FixPolicy},
    prelude::Duration,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const fn default_max_wait_s() -> f64 {
    600.0
}

const fn default_required_fix_s() -> f64 {
    180.0
}

const fn default_tick_s() -> f64 {
    1.0
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SurveyOpts {
    /// Hard ceiling on the total survey duration (s)
    #[cfg_attr(feature = "serde", serde(default = "default_max_wait_s"))]
    pub max_wait_s: f64,
    /// RTK fixed duration that must be exceeded for the survey to succeed (s)
    #[cfg_attr(feature = "serde", serde(default = "default_required_fix_s"))]
    pub required_fix_s: f64,
    /// Duration of one survey tick (s). Matches the receiver
    /// NMEA output rate and bounds every feed read.
    #[cfg_attr(feature = "serde", serde(default = "default_tick_s"))]
    pub tick_s: f64,
    /// How fixed samples accumulate
    #[cfg_attr(feature = "serde", serde(default))]
    pub policy: FixPolicy,
}

impl Default for SurveyOpts {
    fn default() -> Self {
        Self {
            max_wait_s: default_max_wait_s(),
            required_fix_s: default_required_fix_s(),
            tick_s: default_tick_s(),
            policy: FixPolicy::default(),
        }
    }
}

impl SurveyOpts {
    /// Builds [SurveyOpts] from both thresholds, expressed in seconds
    pub fn new(max_wait_s: f64, required_fix_s: f64) -> Self {
        Self {
            max_wait_s,
            required_fix_s,
            ..Default::default()
        }
    }

    /// Returns a copy of Self with updated [FixPolicy]
    pub fn with_policy(&self, policy: FixPolicy) -> Self {
        let mut s = self.clone();
        s.policy = policy;
        s
    }

    /// Returns a copy of Self with updated tick duration
    pub fn with_tick(&self, tick: Duration) -> Self {
        let mut s = self.clone();
        s.tick_s = tick.to_seconds();
        s
    }

    /// Verifies the survey clock can make progress
    pub fn validate(&self) -> Result<(), Error> {
        positive("max_wait_s", self.max_wait_s)?;
        positive("tick_s", self.tick_s)
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_seconds(self.max_wait_s)
    }

    pub fn required_fix(&self) -> Duration {
        Duration::from_seconds(self.required_fix_s)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_seconds(self.tick_s)
    }
}
