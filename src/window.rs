use crate::{nmea::FixSample, prelude::Duration};

/// [FixWindow] gathers the RTK fixed samples of one survey pass,
/// in order of arrival.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FixWindow {
    samples: Vec<FixSample>,
    fixed_duration: Duration,
}

impl FixWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a new RTK fixed sample, accounting for `tick` of fixed duration.
    /// Other qualities are rejected: returns false.
    pub fn push(&mut self, sample: FixSample, tick: Duration) -> bool {
        if !sample.is_rtk_fixed() {
            return false;
        }
        self.samples.push(sample);
        self.fixed_duration += tick;
        true
    }

    /// Discards all samples.
    pub fn reset(&mut self) {
        self.samples.clear();
        self.fixed_duration = Duration::ZERO;
    }

    /// Accumulated RTK fixed duration
    pub fn fixed_duration(&self) -> Duration {
        self.fixed_duration
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples, in order of arrival
    pub fn samples(&self) -> &[FixSample] {
        &self.samples
    }

    pub fn latitudes(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|s| s.latitude_ddeg)
    }

    pub fn longitudes(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|s| s.longitude_ddeg)
    }

    pub fn heights(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|s| s.height_m)
    }
}
