use thiserror::Error;

/// Survey cycle errors. Apart from decoding issues, which are recovered
/// by the position feed, each of these aborts the ongoing cycle.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The streaming collaborator closed the position feed.
    #[error("position feed closed by peer")]
    StreamClosed,

    /// Failed to connect to the position feed socket.
    #[error("failed to connect to position feed: {0}")]
    SocketConnect(String),

    /// The streaming process failed to launch, or exited right away.
    #[error("streaming process failed to start: {0}")]
    ProcessStart(String),

    /// The rover probe consumed all its attempts without
    /// a single valid (non zero) position.
    #[error("no valid position reported in rover mode")]
    NoRoverFix,

    /// RTK fix never stabilized within the survey time limit.
    #[error("survey-in timed out: unable to get a stable fix")]
    SurveyTimeout,

    /// Position averaging attempted on an empty fix window.
    #[error("cannot average an empty fix window")]
    EmptyFixWindow,

    /// Receiver command template does not carry enough sentinel placeholders.
    #[error("malformed command template: found {found} placeholder(s), 3 required")]
    TemplateMalformed { found: usize },

    /// File system or socket I/O error.
    #[error("i/o error: {0}")]
    Io(String),

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    Config(#[from] crate::cfg::Error),

    /// Bootstrap information (correction source, serial device) is missing.
    #[error("bootstrap error: {0}")]
    Bootstrap(String),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}
