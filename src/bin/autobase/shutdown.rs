use std::{
    fs,
    path::{Path, PathBuf},
    process::Command,
};

use log::{error, info, warn};

use gnss_autobase::prelude::Config;

/// `autobase.log` -> `autobase_prev.log`
fn previous_log(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    let name = match path.extension() {
        Some(ext) => format!("{}_prev.{}", stem, ext.to_string_lossy()),
        None => format!("{}_prev", stem),
    };

    path.with_file_name(name)
}

/// Keeps a copy of the application log, so it survives next boot.
fn rotate_log(cfg: &Config) {
    let Some(log) = &cfg.app_log else {
        return;
    };

    let log = cfg.resolve(log);
    if !log.exists() {
        return;
    }

    let prev = previous_log(&log);
    match fs::copy(&log, &prev) {
        Ok(_) => info!("{} saved as {}", log.display(), prev.display()),
        Err(e) => error!("failed to save {}: {}", log.display(), e),
    }
}

fn execute(program: &str, args: &[String]) {
    info!("{} {}", program, args.join(" "));
    match Command::new(program).args(args).status() {
        Ok(status) if status.success() => {},
        Ok(status) => warn!("{}: {}", program, status),
        Err(e) => error!("{}: {}", program, e),
    }
}

/// Shutdown sequence: log rotation, stray streaming processes, power off.
pub fn shutdown(cfg: &Config) {
    info!("shutdown...");

    rotate_log(cfg);

    execute("killall", &[cfg.streamer.clone()]);

    match cfg.poweroff_command.split_first() {
        Some((program, args)) => execute(program, args),
        None => info!("no power-off command"),
    }
}
