use std::{fs, path::Path};

use log::info;

use gnss_autobase::prelude::{Config, Error};

/// Receiver serial device name prefix (USB CDC ACM)
const SERIAL_PREFIX: &str = "ttyACM";

/// NTRIP correction source: command line or configuration,
/// otherwise read from the bootstrap file.
pub fn ntrip_source(cfg: &Config) -> Result<String, Error> {
    if let Some(source) = &cfg.ntrip_source {
        return Ok(source.clone());
    }

    let content = fs::read_to_string(&cfg.ntrip_file)
        .map_err(|e| Error::Bootstrap(format!("{}: {}", cfg.ntrip_file.display(), e)))?;

    let source = content.trim();
    if source.is_empty() {
        return Err(Error::Bootstrap(format!(
            "{}: no correction source",
            cfg.ntrip_file.display()
        )));
    }

    info!("correction source: {}", source);
    Ok(source.to_string())
}

/// Receiver serial device: command line or configuration, otherwise
/// the last ttyACM device found in `dev`.
pub fn serial_device(cfg: &Config, dev: &Path) -> Result<String, Error> {
    if let Some(device) = &cfg.serial_device {
        return Ok(device.clone());
    }

    let device = fs::read_dir(dev)
        .map_err(|e| Error::Bootstrap(format!("{}: {}", dev.display(), e)))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().to_string())
        .filter(|name| name.starts_with(SERIAL_PREFIX))
        .max()
        .ok_or_else(|| Error::Bootstrap(format!("no {}* device", SERIAL_PREFIX)))?;

    info!("receiver on /dev/{}", device);
    Ok(device)
}
