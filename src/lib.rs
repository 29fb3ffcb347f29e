#![doc = include_str!("../README.md")]
#![cfg_attr(docrs, feature(doc_cfg))]

// private modules
mod averager;
mod cfg;
mod constants;
mod error;
mod feed;
mod monitor;
mod nmea;
mod operator;
mod orchestrator;
mod process;
mod template;
mod utils;
mod window;

#[cfg(test)]
mod tests;

// prelude
pub mod prelude {
    pub use crate::averager::{median, SurveyResult};
    pub use crate::cfg::{
        Config, Error as ConfigError, FixPolicy, LongitudeConvention, OperatorOpts, SurveyOpts,
    };
    pub use crate::error::Error;
    pub use crate::feed::{FeedConnector, NmeaFeed, PositionFeed, TcpConnector};
    pub use crate::monitor::{MonitorOutcome, StabilityMonitor};
    pub use crate::nmea::{Error as DecodeError, FixQuality, FixSample, GgaDecoder};
    pub use crate::operator::{
        measure_press, wait_for_press, NullOperator, OperatorSignal, PressKind,
    };

    #[cfg(target_os = "linux")]
    pub use crate::operator::GpioOperator;
    pub use crate::orchestrator::{transition, Effect, Event, Orchestrator, State};
    pub use crate::process::{CommandSpec, ProcessHandle, StreamCommands, StreamMode, Streamer};
    pub use crate::template::{CommandTemplate, TemplateFormat};
    pub use crate::window::FixWindow;
    // re-export
    pub use hifitime::Duration;
}

// pub export
pub use error::Error;
