use itertools::Itertools;
use log::info;

use crate::{constants::METERS_PER_DEGREE_LAT, error::Error, window::FixWindow};

#[cfg(feature = "serde")]
use serde::Serialize;

/// Median of a set of values, None when empty.
/// Even sized sets resolve to the mean of both central values.
pub fn median<I: IntoIterator<Item = f64>>(values: I) -> Option<f64> {
    let sorted = values
        .into_iter()
        .sorted_by(|a, b| a.total_cmp(b))
        .collect::<Vec<_>>();

    let n = sorted.len();
    match n {
        0 => None,
        n if n % 2 == 1 => Some(sorted[n / 2]),
        n => Some((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0),
    }
}

/// Median absolute deviation around `center`
fn median_absolute_deviation<I: IntoIterator<Item = f64>>(values: I, center: f64) -> f64 {
    median(values.into_iter().map(|x| (x - center).abs())).unwrap_or(0.0)
}

/// Surveyed position, which is the median of a [FixWindow].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct SurveyResult {
    /// Latitude in decimal degrees
    pub latitude_ddeg: f64,
    /// Longitude in decimal degrees
    pub longitude_ddeg: f64,
    /// Height above ellipsoid in meters
    pub height_m: f64,
    /// Number of samples the median was formed on
    pub samples: usize,
    /// Median absolute deviation (north, east, up) in meters
    pub mad_neu_m: (f64, f64, f64),
}

impl SurveyResult {
    /// Reduces a [FixWindow] to a [SurveyResult], each coordinate being
    /// the median of the window, independently. Fails on empty windows.
    pub fn from_window(window: &FixWindow) -> Result<Self, Error> {
        let latitude_ddeg = median(window.latitudes()).ok_or(Error::EmptyFixWindow)?;
        let longitude_ddeg = median(window.longitudes()).ok_or(Error::EmptyFixWindow)?;
        let height_m = median(window.heights()).ok_or(Error::EmptyFixWindow)?;

        let north_m = median_absolute_deviation(window.latitudes(), latitude_ddeg)
            * METERS_PER_DEGREE_LAT;

        let east_m = median_absolute_deviation(window.longitudes(), longitude_ddeg)
            * METERS_PER_DEGREE_LAT
            * latitude_ddeg.to_radians().cos();

        let up_m = median_absolute_deviation(window.heights(), height_m);

        let result = Self {
            latitude_ddeg,
            longitude_ddeg,
            height_m,
            samples: window.len(),
            mad_neu_m: (north_m, east_m, up_m),
        };

        info!(
            "measured position = {:.7}, {:.7}, {:.3} ({} samples, mad n={:.3}m e={:.3}m u={:.3}m)",
            latitude_ddeg, longitude_ddeg, height_m, result.samples, north_m, east_m, up_m
        );

        Ok(result)
    }
}
