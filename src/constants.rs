/// NMEA sentence identifier we scan the position feed for
pub const GGA_IDENTIFIER: &[u8] = b"GGA,";

/// Minimal number of comma separated fields (identifier included)
/// a GGA sentence must expose, up to and including the geoid separation.
pub const GGA_MIN_FIELDS: usize = 12;

/// [FixQuality] code reported for an RTK fixed solution
pub const RTK_FIXED_QUALITY: u8 = 4;

/// Sentinel placeholder the receiver command template carries
pub const DEFAULT_SENTINEL: &str = "0000000000";

/// Latitude and longitude are injected in 1E-7 degrees
pub const LAT_LON_SCALING: f64 = 1.0E7;

/// Height is injected in centimeters
pub const HEIGHT_SCALING: f64 = 1.0E2;

/// Read chunk size on the position feed
pub const FEED_BUFFER_SIZE: usize = 4096;

/// Meters per degree of latitude (spherical approximation),
/// used to express the survey spread in meters.
pub const METERS_PER_DEGREE_LAT: f64 = 111_320.0;
