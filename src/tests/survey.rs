use rstest::*;

use crate::{
    cfg::{FixPolicy, SurveyOpts},
    monitor::{MonitorOutcome, StabilityMonitor},
    nmea::{FixQuality, FixSample},
    prelude::Duration,
    tests::{init_logger, ScriptedFeed, ScriptedOperator},
};

fn sample(quality: FixQuality) -> Option<FixSample> {
    Some(FixSample {
        latitude_ddeg: 40.0,
        longitude_ddeg: -105.0,
        height_m: 1583.0,
        quality,
    })
}

fn repeat(observation: Option<FixSample>, n: usize) -> Vec<Option<FixSample>> {
    vec![observation; n]
}

#[rstest]
#[case(30.0, 10.0, 1.0)]
#[case(600.0, 180.0, 1.0)]
#[case(60.0, 10.0, 0.5)]
fn timeout_at_max_wait(#[case] max_wait_s: f64, #[case] required_s: f64, #[case] tick_s: f64) {
    init_logger();

    let opts = SurveyOpts::new(max_wait_s, required_s).with_tick(Duration::from_seconds(tick_s));
    let ticks = (max_wait_s / tick_s) as usize;

    // float, no sample, autonomous, in turn
    let script = (0..2 * ticks)
        .map(|i| match i % 3 {
            0 => sample(FixQuality::RtkFloat),
            1 => None,
            _ => sample(FixQuality::Autonomous),
        })
        .collect::<Vec<_>>();

    let mut feed = ScriptedFeed::new(script);
    let mut operator = ScriptedOperator::default();

    let outcome = StabilityMonitor::new(&opts).run(&mut feed, &mut operator);

    assert_eq!(outcome, MonitorOutcome::Timeout);
    assert_eq!(feed.reads, ticks);
}

#[rstest]
#[case(600.0, 180.0, 0)]
#[case(600.0, 180.0, 25)]
#[case(60.0, 10.0, 49)]
fn success_strictly_over_required(
    #[case] max_wait_s: f64,
    #[case] required_s: f64,
    #[case] not_fixed: usize,
) {
    init_logger();

    let opts = SurveyOpts::new(max_wait_s, required_s);
    let required = required_s as usize;

    let mut script = repeat(sample(FixQuality::NoFix), not_fixed);
    script.extend(repeat(sample(FixQuality::RtkFixed), required + 10));

    let mut feed = ScriptedFeed::new(script);
    let mut operator = ScriptedOperator::default();

    match StabilityMonitor::new(&opts).run(&mut feed, &mut operator) {
        MonitorOutcome::Success(window) => {
            assert_eq!(window.len(), required + 1);
            assert_eq!(
                window.fixed_duration(),
                Duration::from_seconds(required_s + 1.0)
            );
            assert!(window.samples().iter().all(|s| s.is_rtk_fixed()));
        },
        other => panic!("expected success, got {}", other),
    }

    assert_eq!(feed.reads, not_fixed + required + 1);
}

#[test]
fn late_success_is_timeout() {
    init_logger();

    // fixed from t=55s: 6s of fix, 10s required
    let opts = SurveyOpts::new(60.0, 10.0);

    let mut script = repeat(sample(FixQuality::RtkFloat), 54);
    script.extend(repeat(sample(FixQuality::RtkFixed), 100));

    let mut feed = ScriptedFeed::new(script);
    let mut operator = ScriptedOperator::default();

    let outcome = StabilityMonitor::new(&opts).run(&mut feed, &mut operator);
    assert_eq!(outcome, MonitorOutcome::Timeout);
    assert_eq!(feed.reads, 60);
}

#[test]
fn operator_cancellation() {
    init_logger();

    let opts = SurveyOpts::default();
    let mut feed = ScriptedFeed::new(repeat(sample(FixQuality::RtkFixed), 1000));
    let mut operator = ScriptedOperator::press_after(10, 3);

    let outcome = StabilityMonitor::new(&opts).run(&mut feed, &mut operator);

    assert_eq!(outcome, MonitorOutcome::UserCancelled);
    assert_eq!(feed.reads, 10);
    // fixed feedback: 8 blinks per tick
    assert_eq!(operator.leds.len(), 10 * 16);
    assert_eq!(operator.paused, Duration::from_seconds(10.0));
}

#[test]
fn stream_closure() {
    init_logger();

    let opts = SurveyOpts::default();
    let mut feed = ScriptedFeed::new(repeat(sample(FixQuality::RtkFixed), 5));
    let mut operator = ScriptedOperator::default();

    let outcome = StabilityMonitor::new(&opts).run(&mut feed, &mut operator);
    assert_eq!(outcome, MonitorOutcome::StreamClosed);
    assert_eq!(feed.reads, 6);
}

#[rstest]
#[case(FixPolicy::Cumulative, true)]
#[case(FixPolicy::Contiguous, false)]
fn fix_policies(#[case] policy: FixPolicy, #[case] succeeds: bool) {
    init_logger();

    let opts = SurveyOpts::new(60.0, 10.0).with_policy(policy);

    // 8s of fix, a float tick, 8s of fix, then nothing but float
    let mut script = repeat(sample(FixQuality::RtkFixed), 8);
    script.push(sample(FixQuality::RtkFloat));
    script.extend(repeat(sample(FixQuality::RtkFixed), 8));
    script.extend(repeat(sample(FixQuality::RtkFloat), 100));

    let mut feed = ScriptedFeed::new(script);
    let mut operator = ScriptedOperator::default();

    let outcome = StabilityMonitor::new(&opts).run(&mut feed, &mut operator);

    if succeeds {
        match outcome {
            MonitorOutcome::Success(window) => assert_eq!(window.len(), 11),
            other => panic!("expected success, got {}", other),
        }
        assert_eq!(feed.reads, 12);
    } else {
        assert_eq!(outcome, MonitorOutcome::Timeout);
    }
}
