use rand::{prelude::*, rngs::SmallRng, SeedableRng};
use rstest::*;

use crate::{
    averager::{median, SurveyResult},
    nmea::{FixQuality, FixSample},
    prelude::Duration,
    tests::init_logger,
    window::FixWindow,
};

const REFERENCE: (f64, f64, f64) = (40.0071233, -105.2630457, 1583.412);

/// Noise amplitude: about 1cm horizontally
const NOISE_DDEG: f64 = 1.0E-7;

/// Noise amplitude vertically
const NOISE_M: f64 = 0.02;

fn fixed(latitude_ddeg: f64, longitude_ddeg: f64, height_m: f64) -> FixSample {
    FixSample {
        latitude_ddeg,
        longitude_ddeg,
        height_m,
        quality: FixQuality::RtkFixed,
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

#[rstest]
#[case(7, 180)]
#[case(42, 181)]
#[case(1234, 30)]
fn outlier_resistance(#[case] seed: u64, #[case] size: usize) {
    init_logger();

    let mut rng = SmallRng::seed_from_u64(seed);
    let tick = Duration::from_seconds(1.0);

    let cluster = (0..size)
        .map(|_| {
            fixed(
                REFERENCE.0 + rng.random_range(-NOISE_DDEG..NOISE_DDEG),
                REFERENCE.1 + rng.random_range(-NOISE_DDEG..NOISE_DDEG),
                REFERENCE.2 + rng.random_range(-NOISE_M..NOISE_M),
            )
        })
        .collect::<Vec<_>>();

    // multipath: meters away
    let outlier = fixed(REFERENCE.0 + 1.0E-3, REFERENCE.1 - 1.0E-3, REFERENCE.2 + 25.0);

    let mut window = FixWindow::new();
    let insertion = rng.random_range(0..size);

    for (i, sample) in cluster.iter().enumerate() {
        if i == insertion {
            assert!(window.push(outlier, tick));
        }
        assert!(window.push(*sample, tick));
    }

    let result = SurveyResult::from_window(&window).unwrap();
    assert_eq!(result.samples, size + 1);

    let cluster_lat = cluster.iter().map(|s| s.latitude_ddeg).collect::<Vec<_>>();
    let cluster_lon = cluster.iter().map(|s| s.longitude_ddeg).collect::<Vec<_>>();
    let cluster_hgt = cluster.iter().map(|s| s.height_m).collect::<Vec<_>>();

    let lat = median(cluster_lat.iter().copied()).unwrap();
    let lon = median(cluster_lon.iter().copied()).unwrap();
    let hgt = median(cluster_hgt.iter().copied()).unwrap();

    // one extra sample moves the median by half a rank at most
    assert!((result.latitude_ddeg - lat).abs() < 2.0 * NOISE_DDEG);
    assert!((result.longitude_ddeg - lon).abs() < 2.0 * NOISE_DDEG);
    assert!((result.height_m - hgt).abs() < 2.0 * NOISE_M);

    // a mean would have been dragged toward the outlier
    let mut heights = cluster_hgt.clone();
    heights.push(outlier.height_m);
    assert!((mean(&heights) - hgt).abs() > 0.1);

    // spread is reported at the noise level, not the outlier level
    let (north_m, east_m, up_m) = result.mad_neu_m;
    assert!(north_m < 0.05, "north spread {}", north_m);
    assert!(east_m < 0.05, "east spread {}", east_m);
    assert!(up_m < NOISE_M, "up spread {}", up_m);
}

#[test]
fn arrival_order_is_irrelevant() {
    init_logger();

    let tick = Duration::from_seconds(1.0);
    let samples = [
        fixed(45.0, -122.0, 100.0),
        fixed(45.2, -122.4, 104.0),
        fixed(45.1, -122.2, 90.0),
        fixed(47.0, -110.0, 500.0),
        fixed(45.3, -122.1, 101.0),
    ];

    let mut forward = FixWindow::new();
    let mut backward = FixWindow::new();

    for sample in samples.iter() {
        forward.push(*sample, tick);
    }
    for sample in samples.iter().rev() {
        backward.push(*sample, tick);
    }

    let forward = SurveyResult::from_window(&forward).unwrap();
    let backward = SurveyResult::from_window(&backward).unwrap();

    assert_eq!(forward, backward);
    assert_eq!(forward.latitude_ddeg, 45.2);
    assert_eq!(forward.longitude_ddeg, -122.1);
    assert_eq!(forward.height_m, 101.0);
}
