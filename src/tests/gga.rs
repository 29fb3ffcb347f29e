use crate::nmea::{checksum, FixQuality, FixSample};

/// Formats |angle| as (d)ddmm.mmmmmmmmm
fn ddmm(angle: f64, degree_digits: usize) -> String {
    let magnitude = angle.abs();
    let degrees = magnitude.floor();
    let minutes = (magnitude - degrees) * 60.0;
    format!(
        "{:0width$}{:012.9}",
        degrees as u32,
        minutes,
        width = degree_digits
    )
}

/// Synthetic GGA sentence builder
#[derive(Debug, Clone, Copy)]
pub struct GgaBuilder {
    pub latitude_ddeg: f64,
    pub longitude_ddeg: f64,
    pub altitude_m: f64,
    pub separation_m: f64,
    pub quality: u8,
}

impl Default for GgaBuilder {
    fn default() -> Self {
        Self {
            latitude_ddeg: 40.0,
            longitude_ddeg: -105.0,
            altitude_m: 1600.0,
            separation_m: -17.0,
            quality: 4,
        }
    }
}

impl GgaBuilder {
    pub fn from_sample(sample: &FixSample) -> Self {
        Self {
            latitude_ddeg: sample.latitude_ddeg,
            longitude_ddeg: sample.longitude_ddeg,
            altitude_m: sample.height_m,
            separation_m: 0.0,
            quality: sample.quality.code(),
        }
    }

    pub fn with_quality(mut self, quality: FixQuality) -> Self {
        self.quality = quality.code();
        self
    }

    /// Sentence body, between '$' and '*'
    fn body(&self) -> String {
        format!(
            "GPGGA,172814.00,{},{},{},{},{},12,0.6,{:.3},M,{:.3},M,,",
            ddmm(self.latitude_ddeg, 2),
            if self.latitude_ddeg < 0.0 { "S" } else { "N" },
            ddmm(self.longitude_ddeg, 3),
            if self.longitude_ddeg < 0.0 { "W" } else { "E" },
            self.quality,
            self.altitude_m,
            self.separation_m,
        )
    }

    /// Complete sentence, checksum and line termination included
    pub fn build(&self) -> String {
        let body = self.body();
        format!("${}*{:02X}\r\n", body, checksum(body.as_bytes()))
    }
}
