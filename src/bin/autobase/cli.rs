use clap::{Arg, ArgAction, ArgMatches, ColorChoice, Command};
use std::{fs::read_to_string, path::Path, str::FromStr};

use gnss_autobase::prelude::{Config, Error, FixPolicy, LongitudeConvention};

pub struct Cli {
    matches: ArgMatches,
}

fn command() -> Command {
    Command::new("autobase")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Surveys the receiver position, then turns it into an RTK base station")
        .arg_required_else_help(false)
        .color(ColorChoice::Always)
        .arg(
            Arg::new("cfg")
                .short('c')
                .long("cfg")
                .action(ArgAction::Set)
                .required(false)
                .help("Load JSON configuration (Optional)"),
        )
        .arg(
            Arg::new("ntrip")
                .long("ntrip")
                .action(ArgAction::Set)
                .required(false)
                .help("NTRIP correction source, for example \":user@caster:2101/MOUNT\". Overrides the bootstrap file."),
        )
        .arg(
            Arg::new("device")
                .short('d')
                .long("device")
                .action(ArgAction::Set)
                .required(false)
                .help("Receiver serial device, for example \"ttyACM0\". Discovered when omitted."),
        )
        .arg(
            Arg::new("policy")
                .long("policy")
                .action(ArgAction::Set)
                .required(false)
                .help("Survey policy: \"cumulative\" (default) or \"contiguous\"."),
        )
        .arg(
            Arg::new("longitude")
                .long("longitude")
                .action(ArgAction::Set)
                .required(false)
                .help("Longitude sign convention: \"hemisphere\" (default) or \"always-west\" (legacy deployments)."),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Debug traces"),
        )
}

impl Cli {
    pub fn new() -> Self {
        Self {
            matches: command().get_matches(),
        }
    }

    pub fn verbose(&self) -> bool {
        self.matches.get_flag("verbose")
    }

    /// Builds the [Config]: JSON file if any, then command line overrides.
    pub fn config(&self) -> Result<Config, Error> {
        let mut cfg = match self.matches.get_one::<String>("cfg") {
            Some(path) => load_config(Path::new(path))?,
            None => Config::default(),
        };

        if let Some(ntrip) = self.matches.get_one::<String>("ntrip") {
            cfg = cfg.with_ntrip_source(ntrip);
        }

        if let Some(device) = self.matches.get_one::<String>("device") {
            cfg = cfg.with_serial_device(device);
        }

        if let Some(policy) = self.matches.get_one::<String>("policy") {
            let policy = FixPolicy::from_str(policy)?;
            cfg = cfg.with_survey_opts(cfg.survey.with_policy(policy));
        }

        if let Some(longitude) = self.matches.get_one::<String>("longitude") {
            let longitude = LongitudeConvention::from_str(longitude)?;
            cfg = cfg.with_longitude_convention(longitude);
        }

        cfg.validate()?;
        Ok(cfg)
    }
}

fn load_config(path: &Path) -> Result<Config, Error> {
    let content = read_to_string(path)
        .map_err(|e| Error::Bootstrap(format!("{}: {}", path.display(), e)))?;

    serde_json::from_str(&content)
        .map_err(|e| Error::Bootstrap(format!("{}: {}", path.display(), e)))
}
