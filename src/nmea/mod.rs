//! GGA sentence decoding
use log::debug;
use thiserror::Error;

use crate::{
    cfg::LongitudeConvention,
    constants::{GGA_IDENTIFIER, GGA_MIN_FIELDS},
};

#[cfg(feature = "serde")]
use serde::Serialize;

mod quality;
pub use quality::FixQuality;

/// Decoding errors. None of these leave the position feed:
/// they simply result in no sample for the ongoing tick.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("no GGA sentence in buffer")]
    MissingSentence,
    #[error("partial GGA sentence ({0} fields)")]
    PartialSentence(usize),
    #[error("GGA sentence is not valid utf-8")]
    NotUtf8,
    #[error("GGA checksum mismatch")]
    Checksum,
    #[error("invalid GGA {0} field")]
    InvalidField(&'static str),
    #[error("GGA coordinates out of range")]
    OutOfRange,
}

/// Decoded GGA content
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct FixSample {
    /// Latitude in decimal degrees (positive = North)
    pub latitude_ddeg: f64,
    /// Longitude in decimal degrees (positive = East)
    pub longitude_ddeg: f64,
    /// Height above ellipsoid, in meters
    pub height_m: f64,
    /// [FixQuality] indicator
    pub quality: FixQuality,
}

impl FixSample {
    /// True if this sample is an RTK fixed solution
    pub fn is_rtk_fixed(&self) -> bool {
        self.quality.is_rtk_fixed()
    }

    /// True if this sample reports a position (null island is not one).
    pub fn has_position(&self) -> bool {
        self.latitude_ddeg != 0.0 || self.longitude_ddeg != 0.0
    }
}

impl std::fmt::Display for FixSample {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {:.7} {:.7} {:.3}",
            self.quality, self.latitude_ddeg, self.longitude_ddeg, self.height_m
        )
    }
}

/// Computes the NMEA checksum of a sentence payload,
/// that is everything between '$' and '*' (both excluded).
pub(crate) fn checksum(payload: &[u8]) -> u8 {
    payload.iter().fold(0, |ck, byte| ck ^ byte)
}

/// Converts a (d)ddmm.mmmm field to decimal degrees.
fn parse_ddmm(field: &str) -> Option<f64> {
    let value = field.trim().parse::<f64>().ok()?;
    if !value.is_finite() {
        return None;
    }
    let magnitude = value.abs();
    let degrees = (magnitude / 100.0).floor();
    let minutes = magnitude - degrees * 100.0;
    Some((degrees + minutes / 60.0).copysign(value))
}

/// [GgaDecoder] locates the first GGA sentence of a raw buffer and
/// decodes it into a [FixSample].
#[derive(Debug, Clone, Copy, Default)]
pub struct GgaDecoder {
    convention: LongitudeConvention,
}

impl GgaDecoder {
    pub fn new(convention: LongitudeConvention) -> Self {
        Self { convention }
    }

    /// Decodes the first GGA sentence contained in `buf`.
    /// The checksum is verified when the sentence carries one along
    /// with its '$' start delimiter.
    pub fn decode(&self, buf: &[u8]) -> Result<FixSample, Error> {
        let ix = buf
            .windows(GGA_IDENTIFIER.len())
            .position(|w| w == GGA_IDENTIFIER)
            .ok_or(Error::MissingSentence)?;

        // talker ID is 2 letters; tolerate proprietary 3 letter ones
        let start = buf[..ix]
            .iter()
            .rposition(|b| *b == b'$')
            .filter(|dollar| ix - dollar <= 4);

        let end = buf[ix..]
            .iter()
            .position(|b| *b == b'\r' || *b == b'\n')
            .map_or(buf.len(), |len| ix + len);

        let sentence = &buf[ix..end];

        let fields = match sentence.iter().position(|b| *b == b'*') {
            Some(star) => {
                if let Some(dollar) = start {
                    let expected = std::str::from_utf8(&sentence[star + 1..])
                        .ok()
                        .and_then(|hex| u8::from_str_radix(hex.trim(), 16).ok())
                        .ok_or(Error::Checksum)?;
                    if checksum(&buf[dollar + 1..ix + star]) != expected {
                        return Err(Error::Checksum);
                    }
                }
                &sentence[..star]
            },
            None => sentence,
        };

        let fields = std::str::from_utf8(fields).map_err(|_| Error::NotUtf8)?;
        let fields = fields.split(',').collect::<Vec<_>>();

        if fields.len() < GGA_MIN_FIELDS {
            return Err(Error::PartialSentence(fields.len()));
        }

        let quality = fields[6]
            .trim()
            .parse::<u8>()
            .map_err(|_| Error::InvalidField("quality"))?;

        let mut latitude_ddeg = parse_ddmm(fields[2]).ok_or(Error::InvalidField("latitude"))?;
        let mut longitude_ddeg =
            parse_ddmm(fields[4]).ok_or(Error::InvalidField("longitude"))?;

        match self.convention {
            LongitudeConvention::Hemisphere => {
                if fields[3].trim() == "S" {
                    latitude_ddeg = -latitude_ddeg;
                }
                if fields[5].trim() == "W" {
                    longitude_ddeg = -longitude_ddeg;
                }
            },
            LongitudeConvention::AlwaysWest => {
                longitude_ddeg = -longitude_ddeg;
            },
        }

        if latitude_ddeg.abs() > 90.0 || longitude_ddeg.abs() > 180.0 {
            return Err(Error::OutOfRange);
        }

        let altitude_m = fields[9]
            .trim()
            .parse::<f64>()
            .map_err(|_| Error::InvalidField("altitude"))?;

        let separation_m = fields[11]
            .trim()
            .parse::<f64>()
            .map_err(|_| Error::InvalidField("geoid separation"))?;

        let sample = FixSample {
            latitude_ddeg,
            longitude_ddeg,
            height_m: altitude_m + separation_m,
            quality: FixQuality::from(quality),
        };

        debug!("decoded gga: {}", sample);
        Ok(sample)
    }
}
