//! Fix stability monitor
use log::{debug, info, warn};

use crate::{
    cfg::{FixPolicy, SurveyOpts},
    error::Error,
    feed::PositionFeed,
    nmea::FixSample,
    operator::OperatorSignal,
    prelude::Duration,
    window::FixWindow,
};

/// LED period while the solution is RTK fixed (s)
const FIXED_BLINK_PERIOD_S: f64 = 0.125;

/// LED period while the solution is not RTK fixed (s)
const NOT_FIXED_BLINK_PERIOD_S: f64 = 0.25;

/// Survey-in outcome
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorOutcome {
    /// RTK fix was held long enough: the [FixWindow] is ready for averaging.
    Success(FixWindow),
    /// Time limit reached before success.
    Timeout,
    /// Operator pressed the button.
    UserCancelled,
    /// Position feed is gone.
    StreamClosed,
}

impl std::fmt::Display for MonitorOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success(window) => write!(f, "success ({} samples)", window.len()),
            Self::Timeout => write!(f, "timeout"),
            Self::UserCancelled => write!(f, "cancelled by operator"),
            Self::StreamClosed => write!(f, "stream closed"),
        }
    }
}

/// [StabilityMonitor] consumes one observation per tick and decides
/// when the RTK fix has been stable long enough, or when to give up.
/// Elapsed time advances by one tick per observation, whether it
/// produced a sample or not.
#[derive(Debug, Clone)]
pub struct StabilityMonitor {
    opts: SurveyOpts,
    elapsed: Duration,
    window: FixWindow,
}

impl StabilityMonitor {
    pub fn new(opts: &SurveyOpts) -> Self {
        Self {
            opts: opts.clone(),
            elapsed: Duration::ZERO,
            window: FixWindow::new(),
        }
    }

    /// Elapsed time since survey start
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Ongoing [FixWindow]
    pub fn window(&self) -> &FixWindow {
        &self.window
    }

    /// Accounts for one tick. `observation` is the sample decoded
    /// during this tick, if any. Returns the outcome once the survey
    /// is concluded; Self should not be updated any further.
    pub fn update(&mut self, observation: Option<FixSample>) -> Option<MonitorOutcome> {
        let tick = self.opts.tick();
        self.elapsed += tick;

        match observation {
            Some(sample) if sample.is_rtk_fixed() => {
                self.window.push(sample, tick);
            },
            _ => {
                if self.opts.policy == FixPolicy::Contiguous && !self.window.is_empty() {
                    debug!("rtk fix lost: discarding {} samples", self.window.len());
                    self.window.reset();
                }
            },
        }

        match observation {
            Some(sample) => debug!(
                "{} t_fix={} {}",
                self.elapsed,
                self.window.fixed_duration(),
                sample
            ),
            None => debug!("{} t_fix={} no sample", self.elapsed, self.window.fixed_duration()),
        }

        if self.window.fixed_duration() > self.opts.required_fix() {
            info!(
                "rtk fix held for {} after {}",
                self.window.fixed_duration(),
                self.elapsed
            );
            return Some(MonitorOutcome::Success(std::mem::take(&mut self.window)));
        }

        if self.elapsed >= self.opts.max_wait() {
            warn!(
                "survey-in timed out after {} (rtk fix held for {})",
                self.elapsed,
                self.window.fixed_duration()
            );
            return Some(MonitorOutcome::Timeout);
        }

        None
    }

    /// Runs the survey until conclusion. The operator button is polled
    /// once per tick, before each feed read.
    pub fn run<F, O>(mut self, feed: &mut F, operator: &mut O) -> MonitorOutcome
    where
        F: PositionFeed + ?Sized,
        O: OperatorSignal + ?Sized,
    {
        let tick = self.opts.tick();

        loop {
            if operator.is_pressed() {
                info!("survey-in cancelled by operator");
                return MonitorOutcome::UserCancelled;
            }

            let observation = match feed.next_sample() {
                Ok(observation) => observation,
                Err(Error::StreamClosed) => return MonitorOutcome::StreamClosed,
                Err(e) => {
                    warn!("position feed: {}", e);
                    return MonitorOutcome::StreamClosed;
                },
            };

            let fixed = observation.map_or(false, |s| s.is_rtk_fixed());

            if let Some(outcome) = self.update(observation) {
                return outcome;
            }

            let period = if fixed {
                FIXED_BLINK_PERIOD_S
            } else {
                NOT_FIXED_BLINK_PERIOD_S
            };

            operator.blink(tick, Duration::from_seconds(period));
        }
    }
}

#[cfg(test)]
mod test {
    use super::{MonitorOutcome, StabilityMonitor};
    use crate::{
        cfg::{FixPolicy, SurveyOpts},
        nmea::{FixQuality, FixSample},
        prelude::Duration,
    };

    fn sample(quality: FixQuality) -> Option<FixSample> {
        Some(FixSample {
            latitude_ddeg: 45.0,
            longitude_ddeg: -122.0,
            height_m: 100.0,
            quality,
        })
    }

    #[test]
    fn success_strictly_exceeds() {
        let mut monitor = StabilityMonitor::new(&SurveyOpts::new(60.0, 10.0));

        for _ in 0..10 {
            assert!(monitor.update(sample(FixQuality::RtkFixed)).is_none());
        }
        assert_eq!(monitor.window().fixed_duration(), Duration::from_seconds(10.0));

        match monitor.update(sample(FixQuality::RtkFixed)) {
            Some(MonitorOutcome::Success(window)) => assert_eq!(window.len(), 11),
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[test]
    fn success_wins_over_timeout() {
        let mut monitor = StabilityMonitor::new(&SurveyOpts::new(5.0, 4.0));
        for _ in 0..4 {
            assert!(monitor.update(sample(FixQuality::RtkFixed)).is_none());
        }
        assert!(matches!(
            monitor.update(sample(FixQuality::RtkFixed)),
            Some(MonitorOutcome::Success(_))
        ));
    }

    #[test]
    fn contiguous_policy() {
        let opts = SurveyOpts::new(60.0, 3.0).with_policy(FixPolicy::Contiguous);
        let mut monitor = StabilityMonitor::new(&opts);

        for _ in 0..3 {
            assert!(monitor.update(sample(FixQuality::RtkFixed)).is_none());
        }
        assert!(monitor.update(sample(FixQuality::RtkFloat)).is_none());
        assert!(monitor.window().is_empty());

        for _ in 0..3 {
            assert!(monitor.update(sample(FixQuality::RtkFixed)).is_none());
        }
        // missing sample breaks the run too
        assert!(monitor.update(None).is_none());
        assert_eq!(monitor.window().fixed_duration(), Duration::ZERO);
    }

    #[test]
    fn cumulative_policy() {
        let mut monitor = StabilityMonitor::new(&SurveyOpts::new(60.0, 3.0));

        for quality in [
            FixQuality::RtkFixed,
            FixQuality::RtkFloat,
            FixQuality::RtkFixed,
            FixQuality::NoFix,
            FixQuality::RtkFixed,
        ] {
            assert!(monitor.update(sample(quality)).is_none());
        }
        assert!(monitor.update(None).is_none());
        assert_eq!(monitor.window().len(), 3);

        assert!(matches!(
            monitor.update(sample(FixQuality::RtkFixed)),
            Some(MonitorOutcome::Success(_))
        ));
        assert_eq!(monitor.elapsed(), Duration::from_seconds(7.0));
    }
}
