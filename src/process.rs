//! Streaming engine process control
use std::{
    fs::File,
    path::{Path, PathBuf},
    process::{Child, Command, Stdio},
    thread,
    time::Instant,
};

use log::{debug, error, info, warn};

use crate::{cfg::Config, error::Error, nmea::FixSample, prelude::Duration, utils::std_duration};

/// Time we leave a process to exit after SIGTERM, before killing it
const TERMINATION_TIMEOUT_S: f64 = 2.0;

/// Termination polling period
const TERMINATION_POLL_S: f64 = 0.05;

/// Streaming engine operating mode, one per survey stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StreamMode {
    /// Receiver configured as rover, NMEA relayed to the local feed port.
    Rover,
    /// Corrections relayed from the NTRIP caster to the receiver, seeded
    /// with the approximate rover position. NMEA relayed to the local feed port.
    Survey { approx: FixSample },
    /// Receiver configured as base (surveyed position), corrections relayed
    /// to the outbound sink.
    Base,
}

impl std::fmt::Display for StreamMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rover => write!(f, "rover"),
            Self::Survey { .. } => write!(f, "survey"),
            Self::Base => write!(f, "base"),
        }
    }
}

/// Process command line
#[derive(Debug, Clone, PartialEq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Process output (stdout and stderr) redirection
    pub log_file: Option<PathBuf>,
}

impl std::fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in self.args.iter() {
            write!(f, " {}", arg)?;
        }
        if let Some(log) = &self.log_file {
            write!(f, " > {}", log.display())?;
        }
        Ok(())
    }
}

/// [ProcessHandle] is the capability to start and stop
/// the streaming engine.
pub trait ProcessHandle {
    type Child;

    /// Starts a process and verifies it is running.
    fn start(&mut self, spec: &CommandSpec) -> Result<Self::Child, Error>;

    /// Terminates the process and its entire process tree, and reaps it.
    fn terminate(&mut self, child: Self::Child);
}

/// Builds the streaming engine command lines, for each [StreamMode].
#[derive(Debug, Clone)]
pub struct StreamCommands {
    streamer: String,
    /// Executable name, prefix of the log files
    log_stem: String,
    serial: String,
    ntrip_source: String,
    feed_port: u16,
    stream_out: String,
    nmea_cycle_ms: u32,
    rover_cmd_file: PathBuf,
    base_cmd_file: PathBuf,
    work_dir: PathBuf,
}

impl StreamCommands {
    /// Builds [StreamCommands] from the [Config] and bootstrap information:
    /// NTRIP correction source descriptor and receiver serial device.
    pub fn new(cfg: &Config, ntrip_source: &str, serial_device: &str) -> Self {
        let log_stem = Path::new(&cfg.streamer)
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| cfg.streamer.clone());

        Self {
            log_stem,
            streamer: cfg.streamer.clone(),
            serial: format!("serial://{}:{}", serial_device, cfg.serial_baudrate),
            ntrip_source: ntrip_source.trim().to_string(),
            feed_port: cfg.feed_addr.port(),
            stream_out: cfg.stream_out.clone(),
            nmea_cycle_ms: cfg.nmea_cycle_ms,
            rover_cmd_file: cfg.resolve(&cfg.rover_cmd_file),
            base_cmd_file: cfg.resolve(&cfg.base_cmd_file),
            work_dir: cfg.work_dir.clone(),
        }
    }

    pub fn spec(&self, mode: &StreamMode) -> CommandSpec {
        let args = match mode {
            StreamMode::Rover => vec![
                "-in".to_string(),
                self.serial.clone(),
                "-out".to_string(),
                format!("tcpsvr://:{}", self.feed_port),
                "-c".to_string(),
                self.rover_cmd_file.display().to_string(),
            ],
            StreamMode::Survey { approx } => vec![
                "-in".to_string(),
                format!("ntrip://{}", self.ntrip_source),
                "-n".to_string(),
                self.nmea_cycle_ms.to_string(),
                "-p".to_string(),
                format!("{:.7}", approx.latitude_ddeg),
                format!("{:.7}", approx.longitude_ddeg),
                format!("{:.2}", approx.height_m),
                "-out".to_string(),
                format!("{}#{}", self.serial, self.feed_port),
            ],
            StreamMode::Base => vec![
                "-in".to_string(),
                self.serial.clone(),
                "-out".to_string(),
                self.stream_out.clone(),
                "-c".to_string(),
                self.base_cmd_file.display().to_string(),
            ],
        };

        CommandSpec {
            program: self.streamer.clone(),
            args,
            log_file: Some(
                self.work_dir
                    .join(format!("{}-{}.log", self.log_stem, mode)),
            ),
        }
    }
}

/// [Streamer] runs the streaming engine as a child process, leader of
/// its own process group, so the whole tree can be signaled at once.
#[derive(Debug, Clone)]
pub struct Streamer {
    /// Delay after which a started process is verified
    grace: Duration,
}

impl Streamer {
    pub fn new(grace: Duration) -> Self {
        Self { grace }
    }

    #[cfg(unix)]
    fn signal_group(child: &Child, signal: &str) {
        // negative PID addresses the process group
        match Command::new("kill")
            .arg(format!("-{}", signal))
            .arg("--")
            .arg(format!("-{}", child.id()))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
        {
            Ok(status) if status.success() => {},
            Ok(status) => debug!("kill -{} group {}: {}", signal, child.id(), status),
            Err(e) => error!("failed to signal process group {}: {}", child.id(), e),
        }
    }

    #[cfg(not(unix))]
    fn signal_group(_: &Child, _: &str) {}
}

impl ProcessHandle for Streamer {
    type Child = Child;

    fn start(&mut self, spec: &CommandSpec) -> Result<Child, Error> {
        info!("{}", spec);

        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args).stdin(Stdio::null());

        if let Some(path) = &spec.log_file {
            let log = File::create(path)
                .map_err(|e| Error::ProcessStart(format!("{}: {}", path.display(), e)))?;
            let log_err = log
                .try_clone()
                .map_err(|e| Error::ProcessStart(format!("{}: {}", path.display(), e)))?;
            cmd.stdout(log).stderr(log_err);
        }

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        let mut child = cmd
            .spawn()
            .map_err(|e| Error::ProcessStart(format!("{}: {}", spec.program, e)))?;

        thread::sleep(std_duration(self.grace));

        match child.try_wait() {
            Ok(None) => {
                debug!("{} started (pid={})", spec.program, child.id());
                Ok(child)
            },
            Ok(Some(status)) => Err(Error::ProcessStart(format!(
                "{} exited right away ({})",
                spec.program, status
            ))),
            Err(e) => {
                self.terminate(child);
                Err(Error::ProcessStart(format!("{}: {}", spec.program, e)))
            },
        }
    }

    fn terminate(&mut self, mut child: Child) {
        let pid = child.id();
        Self::signal_group(&child, "TERM");

        #[cfg(not(unix))]
        let _ = child.kill();

        let deadline = Instant::now() + std_duration(Duration::from_seconds(TERMINATION_TIMEOUT_S));

        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    debug!("process {} terminated ({})", pid, status);
                    break;
                },
                Ok(None) if Instant::now() < deadline => {
                    thread::sleep(std_duration(Duration::from_seconds(TERMINATION_POLL_S)));
                },
                Ok(None) => {
                    warn!("process {} did not terminate: killing it", pid);
                    Self::signal_group(&child, "KILL");
                    let _ = child.kill();
                    let _ = child.wait();
                    break;
                },
                Err(e) => {
                    error!("failed to reap process {}: {}", pid, e);
                    break;
                },
            }
        }

        // reap remaining group members (grand children)
        Self::signal_group(&child, "KILL");
    }
}

#[cfg(test)]
mod test {
    use super::{CommandSpec, ProcessHandle, StreamCommands, StreamMode, Streamer};
    use crate::{
        cfg::Config,
        error::Error,
        nmea::{FixQuality, FixSample},
        prelude::Duration,
    };
    use std::path::{Path, PathBuf};

    fn commands() -> StreamCommands {
        let cfg = Config::default().with_work_dir(Path::new("/var/autobase"));
        StreamCommands::new(&cfg, ":user@caster.example:2101/MOUNT\n", "ttyACM0")
    }

    #[test]
    fn rover_command() {
        let spec = commands().spec(&StreamMode::Rover);
        assert_eq!(spec.program, "str2str");
        assert_eq!(
            spec.args,
            vec![
                "-in",
                "serial://ttyACM0:115200",
                "-out",
                "tcpsvr://:5001",
                "-c",
                "/var/autobase/rover.cmd"
            ]
        );
        assert_eq!(
            spec.log_file,
            Some(PathBuf::from("/var/autobase/str2str-rover.log"))
        );
    }

    #[test]
    fn survey_command() {
        let approx = FixSample {
            latitude_ddeg: 40.123456789,
            longitude_ddeg: -105.5,
            height_m: 1623.456,
            quality: FixQuality::Autonomous,
        };

        let spec = commands().spec(&StreamMode::Survey { approx });
        assert_eq!(
            spec.to_string(),
            "str2str -in ntrip://:user@caster.example:2101/MOUNT -n 2000 \
-p 40.1234568 -105.5000000 1623.46 -out serial://ttyACM0:115200#5001 \
> /var/autobase/str2str-survey.log"
        );
    }

    #[test]
    fn base_command() {
        let spec = commands().spec(&StreamMode::Base);
        assert_eq!(
            spec.args,
            vec![
                "-in",
                "serial://ttyACM0:115200",
                "-out",
                "tcpsvr://:5000",
                "-c",
                "/var/autobase/base.cmd"
            ]
        );
    }

    #[test]
    fn absolute_streamer_path() {
        let mut cfg = Config::default().with_work_dir(Path::new("/var/autobase"));
        cfg.streamer = "/usr/local/bin/str2str".to_string();

        let commands = StreamCommands::new(&cfg, "caster.example:2101/MOUNT", "ttyACM0");
        let spec = commands.spec(&StreamMode::Rover);

        assert_eq!(spec.program, "/usr/local/bin/str2str");
        assert_eq!(
            spec.log_file,
            Some(PathBuf::from("/var/autobase/str2str-rover.log"))
        );
    }

    fn shell(script: &str) -> CommandSpec {
        CommandSpec {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
            log_file: None,
        }
    }

    /// Live (non zombie) members of process group `pgid`
    #[cfg(target_os = "linux")]
    fn group_members(pgid: u32) -> usize {
        let Ok(entries) = std::fs::read_dir("/proc") else {
            return 0;
        };
        entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| std::fs::read_to_string(entry.path().join("stat")).ok())
            .filter(|stat| {
                // "pid (comm) state ppid pgrp ..."
                let Some((_, fields)) = stat.rsplit_once(')') else {
                    return false;
                };
                let fields = fields.split_whitespace().collect::<Vec<_>>();
                fields.len() > 2 && fields[0] != "Z" && fields[2] == pgid.to_string()
            })
            .count()
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn terminates_process_group() {
        let mut streamer = Streamer::new(Duration::from_seconds(0.2));

        let child = streamer
            .start(&shell("sleep 60 & sleep 60 & wait"))
            .unwrap();

        let pgid = child.id();
        assert!(group_members(pgid) > 0);

        streamer.terminate(child);

        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
        while group_members(pgid) > 0 && std::time::Instant::now() < deadline {
            std::thread::sleep(std::time::Duration::from_millis(50));
        }
        assert_eq!(group_members(pgid), 0);
    }

    #[cfg(unix)]
    #[test]
    fn exits_right_away() {
        let mut streamer = Streamer::new(Duration::from_seconds(0.2));

        let spec = CommandSpec {
            program: "false".to_string(),
            args: Vec::new(),
            log_file: None,
        };

        match streamer.start(&spec) {
            Err(Error::ProcessStart(msg)) => assert!(msg.contains("exited right away")),
            other => panic!("expected start failure, got {:?}", other.map(|c| c.id())),
        }

        match streamer.start(&shell("exit 3")) {
            Err(Error::ProcessStart(_)) => {},
            other => panic!("expected start failure, got {:?}", other.map(|c| c.id())),
        }
    }

    #[cfg(unix)]
    #[test]
    fn missing_executable() {
        let mut streamer = Streamer::new(Duration::from_seconds(0.1));
        let spec = CommandSpec {
            program: "/nonexistent/str2str".to_string(),
            args: Vec::new(),
            log_file: None,
        };
        assert!(matches!(streamer.start(&spec), Err(Error::ProcessStart(_))));
    }
}
