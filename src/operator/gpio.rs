//! Header push button and LED, through the Raspberry Pi GPIO peripheral
use std::thread;

use log::debug;

use rppal::gpio::{Gpio, InputPin, Level, OutputPin};

use crate::{
    cfg::OperatorOpts, error::Error, operator::OperatorSignal, prelude::Duration,
    utils::std_duration,
};

/// True when `level` means the button is held down
fn is_active(level: Level, active_low: bool) -> bool {
    (level == Level::Low) == active_low
}

fn pin_error(pin: u8, e: rppal::gpio::Error) -> Error {
    Error::Bootstrap(format!("gpio{}: {}", pin, e))
}

/// [GpioOperator] drives the button and LED wired on the GPIO header
/// (BCM numbering). Undefined pins behave like a button that is never
/// pressed and a missing LED.
#[derive(Debug)]
pub struct GpioOperator {
    led: Option<OutputPin>,
    button: Option<InputPin>,
    active_low: bool,
}

impl GpioOperator {
    pub fn new(opts: &OperatorOpts) -> Result<Self, Error> {
        let gpio = Gpio::new().map_err(|e| Error::Bootstrap(format!("gpio: {}", e)))?;

        let led = match opts.led_gpio {
            Some(pin) => {
                let led = gpio.get(pin).map_err(|e| pin_error(pin, e))?;
                debug!("led on gpio{}", pin);
                Some(led.into_output_low())
            },
            None => None,
        };

        let button = match opts.button_gpio {
            Some(pin) => {
                let button = gpio.get(pin).map_err(|e| pin_error(pin, e))?;
                debug!("button on gpio{}", pin);
                // idle level opposite to the pressed level
                Some(if opts.button_active_low {
                    button.into_input_pullup()
                } else {
                    button.into_input_pulldown()
                })
            },
            None => None,
        };

        Ok(Self {
            led,
            button,
            active_low: opts.button_active_low,
        })
    }
}

impl OperatorSignal for GpioOperator {
    fn has_button(&self) -> bool {
        self.button.is_some()
    }

    fn is_pressed(&mut self) -> bool {
        match &self.button {
            Some(button) => is_active(button.read(), self.active_low),
            None => false,
        }
    }

    fn set_led(&mut self, on: bool) {
        if let Some(led) = self.led.as_mut() {
            led.write(if on { Level::High } else { Level::Low });
        }
    }

    fn pause(&mut self, dt: Duration) {
        thread::sleep(std_duration(dt));
    }
}

#[cfg(test)]
mod test {
    use super::is_active;
    use rppal::gpio::Level;

    #[test]
    fn button_levels() {
        // pulled up, shorted to ground when pressed
        assert!(is_active(Level::Low, true));
        assert!(!is_active(Level::High, true));

        // pulled down
        assert!(is_active(Level::High, false));
        assert!(!is_active(Level::Low, false));
    }
}
