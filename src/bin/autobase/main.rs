// autobase turns an RTK receiver into a base station: it surveys the
// receiver position using an NTRIP correction source, writes the surveyed
// position to the receiver base configuration, then streams corrections.

#[macro_use]
extern crate log;

use env_logger::{Builder, Target};
use log::LevelFilter;
use std::path::Path;

mod bootstrap;
mod cli;
mod shutdown;

use cli::Cli;

use gnss_autobase::prelude::{
    CommandTemplate, Config, Error, GgaDecoder, NullOperator, OperatorSignal, Orchestrator,
    StreamCommands, Streamer, TcpConnector,
};

#[cfg(target_os = "linux")]
use gnss_autobase::prelude::GpioOperator;

fn deploy<O: OperatorSignal>(cfg: &Config, operator: O) -> Result<(), Error> {
    let ntrip_source = bootstrap::ntrip_source(cfg)?;
    let serial_device = bootstrap::serial_device(cfg, Path::new("/dev"))?;

    let template =
        CommandTemplate::from_file(&cfg.resolve(&cfg.base_template_file), &cfg.template)?;

    let commands = StreamCommands::new(cfg, &ntrip_source, &serial_device);

    // reads are bounded by the survey tick, so the button is polled once per tick
    let connector = TcpConnector::new(
        cfg.feed_addr,
        cfg.connect_timeout(),
        cfg.survey.tick(),
        GgaDecoder::new(cfg.longitude),
    );

    let launcher = Streamer::new(cfg.start_grace());

    let mut orchestrator = Orchestrator::new(cfg, commands, template, launcher, connector, operator);
    orchestrator.run();
    Ok(())
}

#[cfg(target_os = "linux")]
fn deploy_wired(cfg: &Config) -> Result<(), Error> {
    let operator = GpioOperator::new(&cfg.operator)?;
    deploy(cfg, operator)
}

#[cfg(not(target_os = "linux"))]
fn deploy_wired(_: &Config) -> Result<(), Error> {
    Err(Error::Bootstrap(
        "button and LED are only supported on Linux".to_string(),
    ))
}

fn run(cfg: &Config) -> Result<(), Error> {
    if cfg.operator.led_gpio.is_some() || cfg.operator.button_gpio.is_some() {
        deploy_wired(cfg)
    } else {
        warn!("no operator button: running unattended");
        deploy(cfg, NullOperator::default())
    }
}

pub fn main() {
    let cli = Cli::new();

    let mut builder = Builder::from_default_env();
    builder
        .target(Target::Stdout)
        .format_timestamp_secs()
        .format_module_path(false);

    if cli.verbose() {
        builder.filter_level(LevelFilter::Debug);
    }

    builder.init();

    let cfg = match cli.config() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        },
    };

    debug!("{:#?}", cfg);

    match run(&cfg) {
        Ok(()) => shutdown::shutdown(&cfg),
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        },
    }
}
