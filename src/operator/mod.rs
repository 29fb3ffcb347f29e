//! Operator push button and LED
use std::thread;

use log::{debug, info};

use crate::{cfg::OperatorOpts, prelude::Duration, utils::std_duration};

#[cfg(target_os = "linux")]
mod gpio;

#[cfg(target_os = "linux")]
pub use gpio::GpioOperator;

/// How long the button was held
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressKind {
    /// Released before the long press threshold: cycle the mode
    Short,
    /// Held past the long press threshold: shutdown request
    Long,
}

impl std::fmt::Display for PressKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Short => write!(f, "short press"),
            Self::Long => write!(f, "long press"),
        }
    }
}

/// [OperatorSignal] exposes the push button state and the LED.
/// Every wait goes through [OperatorSignal::pause], which is the
/// only suspension point besides feed reads.
pub trait OperatorSignal {
    /// False when no button is wired: nobody can acknowledge anything.
    fn has_button(&self) -> bool {
        true
    }

    /// Current button state
    fn is_pressed(&mut self) -> bool;

    /// Drives the LED
    fn set_led(&mut self, on: bool);

    /// Cooperative in-line wait
    fn pause(&mut self, dt: Duration);

    /// Blinks the LED for `total`, one on/off cycle per `period`.
    fn blink(&mut self, total: Duration, period: Duration) {
        let period_s = period.to_seconds();
        if period_s <= 0.0 {
            self.pause(total);
            return;
        }
        let half = Duration::from_seconds(period_s / 2.0);
        let cycles = (total.to_seconds() / period_s).round() as u64;
        for _ in 0..cycles {
            self.set_led(true);
            self.pause(half);
            self.set_led(false);
            self.pause(half);
        }
    }
}

/// Measures an ongoing press, until the button is released.
/// The LED is on while the press is short, and turns off once
/// the hold qualifies as a long press.
pub fn measure_press<O: OperatorSignal + ?Sized>(operator: &mut O, opts: &OperatorOpts) -> PressKind {
    let poll = opts.poll();
    let long_press = opts.long_press();
    let mut held = Duration::ZERO;

    operator.set_led(true);

    loop {
        operator.pause(poll);
        held += poll;
        if held > long_press {
            operator.set_led(false);
        }
        if !operator.is_pressed() {
            break;
        }
    }

    operator.set_led(false);

    let kind = if held >= long_press {
        PressKind::Long
    } else {
        PressKind::Short
    };

    debug!("button held for {} ({})", held, kind);
    kind
}

/// Waits for the operator to press the button, then classifies the press.
/// The LED blinks meanwhile when `blink` is set, and is left untouched otherwise.
pub fn wait_for_press<O: OperatorSignal + ?Sized>(
    operator: &mut O,
    opts: &OperatorOpts,
    blink: bool,
) -> PressKind {
    let poll = opts.poll();
    info!("waiting for operator");
    while !operator.is_pressed() {
        if blink {
            operator.blink(poll, poll);
        } else {
            operator.pause(poll);
        }
    }
    measure_press(operator, opts)
}

/// [NullOperator] has no button (never pressed) and no LED.
/// Pauses are actual sleeps.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullOperator {}

impl OperatorSignal for NullOperator {
    fn has_button(&self) -> bool {
        false
    }

    fn is_pressed(&mut self) -> bool {
        false
    }

    fn set_led(&mut self, _: bool) {}

    fn pause(&mut self, dt: Duration) {
        thread::sleep(std_duration(dt));
    }
}
