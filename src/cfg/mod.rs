use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::{Path, PathBuf},
};

use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{prelude::Duration, template::TemplateFormat};

mod operator;
mod policy;
mod survey;

pub use operator::OperatorOpts;
pub use policy::{FixPolicy, LongitudeConvention};
pub use survey::SurveyOpts;

/// Configuration Error
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("unknown fix policy \"{0}\"")]
    UnknownFixPolicy(String),
    #[error("unknown longitude convention \"{0}\"")]
    UnknownLongitudeConvention(String),
    #[error("{field} must be strictly positive (got {value})")]
    NonPositive { field: &'static str, value: f64 },
}

/// Rejects null, negative and NaN durations
pub(crate) fn positive(field: &'static str, value: f64) -> Result<(), Error> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(Error::NonPositive { field, value })
    }
}

fn default_work_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_ntrip_file() -> PathBuf {
    PathBuf::from("/boot/ntrip_in.txt")
}

fn default_streamer() -> String {
    "str2str".to_string()
}

const fn default_serial_baudrate() -> u32 {
    115_200
}

fn default_stream_out() -> String {
    "tcpsvr://:5000".to_string()
}

fn default_feed_addr() -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 5001)
}

const fn default_connect_timeout_s() -> f64 {
    5.0
}

fn default_rover_cmd_file() -> PathBuf {
    PathBuf::from("rover.cmd")
}

fn default_base_template_file() -> PathBuf {
    PathBuf::from("base_template.cmd")
}

fn default_base_cmd_file() -> PathBuf {
    PathBuf::from("base.cmd")
}

const fn default_nmea_cycle_ms() -> u32 {
    2000
}

const fn default_rover_probe_attempts() -> u32 {
    30
}

const fn default_restart_pause_s() -> f64 {
    0.5
}

const fn default_start_grace_s() -> f64 {
    0.2
}

fn default_app_log() -> Option<PathBuf> {
    Some(PathBuf::from("autobase.log"))
}

/// Base station automation setup. Every field has a default value,
/// which corresponds to the reference deployment (u-blox receiver
/// on USB, str2str streaming engine, button and LED on the header).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Config {
    /// Directory where the streaming process logs are written
    #[cfg_attr(feature = "serde", serde(default = "default_work_dir"))]
    pub work_dir: PathBuf,
    /// File holding the NTRIP correction source descriptor,
    /// read once at startup
    #[cfg_attr(feature = "serde", serde(default = "default_ntrip_file"))]
    pub ntrip_file: PathBuf,
    /// NTRIP correction source descriptor. Takes precedence over [Self::ntrip_file].
    #[cfg_attr(feature = "serde", serde(default))]
    pub ntrip_source: Option<String>,
    /// Streaming engine executable
    #[cfg_attr(feature = "serde", serde(default = "default_streamer"))]
    pub streamer: String,
    /// Receiver serial device name (for example "ttyACM0").
    /// Discovered at startup when not specified.
    #[cfg_attr(feature = "serde", serde(default))]
    pub serial_device: Option<String>,
    /// Receiver serial baud rate
    #[cfg_attr(feature = "serde", serde(default = "default_serial_baudrate"))]
    pub serial_baudrate: u32,
    /// Correction output sink in base mode
    #[cfg_attr(feature = "serde", serde(default = "default_stream_out"))]
    pub stream_out: String,
    /// Local position feed exposed by the streaming engine
    #[cfg_attr(feature = "serde", serde(default = "default_feed_addr"))]
    pub feed_addr: SocketAddr,
    /// Position feed connection timeout (s)
    #[cfg_attr(feature = "serde", serde(default = "default_connect_timeout_s"))]
    pub connect_timeout_s: f64,
    /// Receiver command file sent in rover mode
    #[cfg_attr(feature = "serde", serde(default = "default_rover_cmd_file"))]
    pub rover_cmd_file: PathBuf,
    /// Receiver command template, carrying the position sentinels
    #[cfg_attr(feature = "serde", serde(default = "default_base_template_file"))]
    pub base_template_file: PathBuf,
    /// Derived receiver command file sent in base mode
    #[cfg_attr(feature = "serde", serde(default = "default_base_cmd_file"))]
    pub base_cmd_file: PathBuf,
    /// NMEA request cycle towards the NTRIP caster (ms)
    #[cfg_attr(feature = "serde", serde(default = "default_nmea_cycle_ms"))]
    pub nmea_cycle_ms: u32,
    /// Maximal number of feed reads in rover mode
    #[cfg_attr(feature = "serde", serde(default = "default_rover_probe_attempts"))]
    pub rover_probe_attempts: u32,
    /// Pause between streaming process teardown and next start (s)
    #[cfg_attr(feature = "serde", serde(default = "default_restart_pause_s"))]
    pub restart_pause_s: f64,
    /// Grace period after which a started process is verified (s)
    #[cfg_attr(feature = "serde", serde(default = "default_start_grace_s"))]
    pub start_grace_s: f64,
    /// Longitude sign convention
    #[cfg_attr(feature = "serde", serde(default))]
    pub longitude: LongitudeConvention,
    /// Survey-in parameters
    #[cfg_attr(feature = "serde", serde(default))]
    pub survey: SurveyOpts,
    /// Operator button and LED parameters
    #[cfg_attr(feature = "serde", serde(default))]
    pub operator: OperatorOpts,
    /// Receiver command template layout
    #[cfg_attr(feature = "serde", serde(default))]
    pub template: TemplateFormat,
    /// Application log, rotated at shutdown
    #[cfg_attr(feature = "serde", serde(default = "default_app_log"))]
    pub app_log: Option<PathBuf>,
    /// Command executed once shutdown completes (for example `["sudo", "poweroff"]`)
    #[cfg_attr(feature = "serde", serde(default))]
    pub poweroff_command: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            work_dir: default_work_dir(),
            ntrip_file: default_ntrip_file(),
            ntrip_source: None,
            streamer: default_streamer(),
            serial_device: None,
            serial_baudrate: default_serial_baudrate(),
            stream_out: default_stream_out(),
            feed_addr: default_feed_addr(),
            connect_timeout_s: default_connect_timeout_s(),
            rover_cmd_file: default_rover_cmd_file(),
            base_template_file: default_base_template_file(),
            base_cmd_file: default_base_cmd_file(),
            nmea_cycle_ms: default_nmea_cycle_ms(),
            rover_probe_attempts: default_rover_probe_attempts(),
            restart_pause_s: default_restart_pause_s(),
            start_grace_s: default_start_grace_s(),
            longitude: LongitudeConvention::default(),
            survey: SurveyOpts::default(),
            operator: OperatorOpts::default(),
            template: TemplateFormat::default(),
            app_log: default_app_log(),
            poweroff_command: Vec::new(),
        }
    }
}

impl Config {
    /// Returns a copy of Self with updated [SurveyOpts]
    pub fn with_survey_opts(&self, survey: SurveyOpts) -> Self {
        let mut s = self.clone();
        s.survey = survey;
        s
    }

    /// Returns a copy of Self with updated [OperatorOpts]
    pub fn with_operator_opts(&self, operator: OperatorOpts) -> Self {
        let mut s = self.clone();
        s.operator = operator;
        s
    }

    /// Returns a copy of Self with updated [LongitudeConvention]
    pub fn with_longitude_convention(&self, longitude: LongitudeConvention) -> Self {
        let mut s = self.clone();
        s.longitude = longitude;
        s
    }

    /// Returns a copy of Self with the NTRIP source descriptor defined
    pub fn with_ntrip_source(&self, source: &str) -> Self {
        let mut s = self.clone();
        s.ntrip_source = Some(source.trim().to_string());
        s
    }

    /// Returns a copy of Self with the receiver serial device defined
    pub fn with_serial_device(&self, device: &str) -> Self {
        let mut s = self.clone();
        s.serial_device = Some(device.trim_start_matches("/dev/").to_string());
        s
    }

    /// Returns a copy of Self with all relative files
    /// (command files, logs) resolved within `work_dir`.
    pub fn with_work_dir(&self, work_dir: &Path) -> Self {
        let mut s = self.clone();
        s.work_dir = work_dir.to_path_buf();
        s
    }

    /// Position feed connection timeout
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_seconds(self.connect_timeout_s)
    }

    /// Pause between two streaming processes
    pub fn restart_pause(&self) -> Duration {
        Duration::from_seconds(self.restart_pause_s)
    }

    /// Grace period before verifying a started process
    pub fn start_grace(&self) -> Duration {
        Duration::from_seconds(self.start_grace_s)
    }

    /// Verifies the durations every loop depends on: a null tick or polling
    /// period would stall the survey clock and the press measurement.
    pub fn validate(&self) -> Result<(), Error> {
        self.survey.validate()?;
        self.operator.validate()?;
        positive("connect_timeout_s", self.connect_timeout_s)
    }

    /// Resolves `path` within the work directory, unless absolute.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.work_dir.join(path)
        }
    }
}
