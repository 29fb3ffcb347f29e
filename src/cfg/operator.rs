use crate::{
    cfg::{positive, Error},
    prelude::Duration,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const fn default_long_press_s() -> f64 {
    5.0
}

const fn default_poll_s() -> f64 {
    1.0
}

const fn default_active_low() -> bool {
    true
}

/// Operator button & LED preset
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OperatorOpts {
    /// Minimal hold duration interpreted as a shutdown request (s)
    #[cfg_attr(feature = "serde", serde(default = "default_long_press_s"))]
    pub long_press_s: f64,
    /// Button polling period (s)
    #[cfg_attr(feature = "serde", serde(default = "default_poll_s"))]
    pub poll_s: f64,
    /// Wait for a button press before each survey cycle
    #[cfg_attr(feature = "serde", serde(default))]
    pub start_on_press: bool,
    /// LED GPIO pin (BCM numbering). No LED feedback when undefined.
    #[cfg_attr(feature = "serde", serde(default))]
    pub led_gpio: Option<u8>,
    /// Button GPIO pin (BCM numbering). The button is never pressed when undefined.
    #[cfg_attr(feature = "serde", serde(default))]
    pub button_gpio: Option<u8>,
    /// Button pulled up: pressed reads as logic low
    #[cfg_attr(feature = "serde", serde(default = "default_active_low"))]
    pub button_active_low: bool,
}

impl Default for OperatorOpts {
    fn default() -> Self {
        Self {
            long_press_s: default_long_press_s(),
            poll_s: default_poll_s(),
            start_on_press: false,
            led_gpio: None,
            button_gpio: None,
            button_active_low: default_active_low(),
        }
    }
}

impl OperatorOpts {
    /// Verifies the press measurement can make progress
    pub fn validate(&self) -> Result<(), Error> {
        positive("poll_s", self.poll_s)?;
        positive("long_press_s", self.long_press_s)
    }

    pub fn long_press(&self) -> Duration {
        Duration::from_seconds(self.long_press_s)
    }

    pub fn poll(&self) -> Duration {
        Duration::from_seconds(self.poll_s)
    }
}
