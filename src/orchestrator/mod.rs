//! Survey cycle state machine
use crate::{
    averager::SurveyResult,
    error::Error,
    monitor::MonitorOutcome,
    nmea::FixSample,
    operator::PressKind,
    prelude::Duration,
    process::StreamMode,
    window::FixWindow,
};

mod driver;
pub use driver::Orchestrator;

/// LED feedback once the rover stream is started: (total, period) in seconds
const ROVER_START_BLINK: (f64, f64) = (3.0, 0.5);

/// LED feedback once a position feed is connected
const FEED_OPEN_BLINK: (f64, f64) = (2.0, 0.5);

/// LED feedback once the survey stream is started
const SURVEY_START_BLINK: (f64, f64) = (5.0, 0.25);

/// LED off period before handing over to the shutdown sequence (s)
const SHUTDOWN_HOLD_S: f64 = 5.0;

fn blink(pattern: (f64, f64)) -> Effect {
    Effect::Blink {
        total: Duration::from_seconds(pattern.0),
        period: Duration::from_seconds(pattern.1),
    }
}

/// Survey cycle [State]. Each state carries the data it works on,
/// nothing survives a return to [State::Idle].
#[derive(Debug, Clone, PartialEq)]
pub enum State {
    /// Waiting for the next cycle
    Idle,
    /// Rover stream running, looking for an approximate position
    RoverProbe,
    /// Approximate position acquired, rover stream released
    AwaitingRoverFix { approx: FixSample },
    /// Survey stream running, stability monitor active
    SurveyIn { approx: FixSample },
    /// Stable RTK fix window acquired
    Averaging { window: FixWindow },
    /// Base stream running with the surveyed position
    BaseStreaming { result: SurveyResult },
    /// Cycle aborted
    Error(Error),
    /// Terminal state
    ShutdownRequested,
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::RoverProbe => write!(f, "rover-probe"),
            Self::AwaitingRoverFix { .. } => write!(f, "awaiting-rover-fix"),
            Self::SurveyIn { .. } => write!(f, "survey-in"),
            Self::Averaging { .. } => write!(f, "averaging"),
            Self::BaseStreaming { .. } => write!(f, "base-streaming"),
            Self::Error(e) => write!(f, "error ({})", e),
            Self::ShutdownRequested => write!(f, "shutdown-requested"),
        }
    }
}

impl State {
    /// True once nothing else can happen
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::ShutdownRequested)
    }
}

/// What happened while in a [State]
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// New cycle requested
    CycleStart,
    /// Rover probe reported a valid position
    RoverFix(FixSample),
    /// Rover stream is down, the port may be reused
    RoverReleased,
    /// Stability monitor concluded
    Surveyed(MonitorOutcome),
    /// Fix window reduced to a position
    Averaged(SurveyResult),
    /// Operator pressed the button
    Operator(PressKind),
    /// Error acknowledged without operator (no button)
    Acknowledged,
    /// Something went wrong
    Failed(Error),
}

/// Side effect requested by a transition. Effects are applied in order;
/// the first failing one aborts the cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Start the streaming process. Any previous one is terminated first.
    StartStream(StreamMode),
    /// Terminate the streaming process, if any
    StopStream,
    /// Connect to the position feed
    OpenFeed,
    /// Disconnect from the position feed, if connected
    CloseFeed,
    /// Render the surveyed position into the base command file
    WriteBaseCommand(SurveyResult),
    /// LED steady state
    Led(bool),
    /// LED feedback
    Blink { total: Duration, period: Duration },
    /// Port release delay between two streaming processes
    RestartPause,
    /// In-line wait
    Pause(Duration),
}

/// Effects that release every resource of a cycle
fn unwind() -> Vec<Effect> {
    vec![Effect::CloseFeed, Effect::StopStream]
}

/// Survey cycle transition. Pure: returns the new [State] and the [Effect]s
/// to apply, in order. Any [Event::Failed] leads to [State::Error] and
/// releases every resource. Events that do not apply to current state
/// leave it unchanged.
pub fn transition(state: State, event: Event) -> (State, Vec<Effect>) {
    match (state, event) {
        (State::ShutdownRequested, _) => (State::ShutdownRequested, vec![]),

        (_, Event::Failed(e)) => (State::Error(e), unwind()),

        (State::Idle, Event::CycleStart | Event::Operator(PressKind::Short)) => (
            State::RoverProbe,
            vec![
                Effect::StartStream(StreamMode::Rover),
                blink(ROVER_START_BLINK),
                Effect::OpenFeed,
                blink(FEED_OPEN_BLINK),
            ],
        ),

        (State::RoverProbe, Event::RoverFix(approx)) => (
            State::AwaitingRoverFix { approx },
            vec![Effect::CloseFeed, Effect::StopStream, Effect::RestartPause],
        ),

        (State::AwaitingRoverFix { approx }, Event::RoverReleased) => (
            State::SurveyIn { approx },
            vec![
                Effect::StartStream(StreamMode::Survey { approx }),
                blink(SURVEY_START_BLINK),
                Effect::OpenFeed,
            ],
        ),

        (State::SurveyIn { .. }, Event::Surveyed(outcome)) => match outcome {
            MonitorOutcome::Success(window) => (State::Averaging { window }, unwind()),
            MonitorOutcome::Timeout => (State::Error(Error::SurveyTimeout), unwind()),
            MonitorOutcome::StreamClosed => (State::Error(Error::StreamClosed), unwind()),
            MonitorOutcome::UserCancelled => (State::Idle, unwind()),
        },

        (State::Averaging { .. }, Event::Averaged(result)) => (
            State::BaseStreaming { result },
            vec![
                Effect::Led(true),
                Effect::WriteBaseCommand(result),
                Effect::RestartPause,
                Effect::StartStream(StreamMode::Base),
            ],
        ),

        (State::BaseStreaming { .. }, Event::Operator(PressKind::Short)) => {
            (State::Idle, vec![Effect::StopStream, Effect::Led(false)])
        },

        (State::Error(_), Event::Operator(PressKind::Short) | Event::Acknowledged) => {
            (State::Idle, vec![])
        },

        (_, Event::Operator(PressKind::Long)) => {
            let mut effects = unwind();
            effects.push(Effect::Led(false));
            effects.push(Effect::Pause(Duration::from_seconds(SHUTDOWN_HOLD_S)));
            (State::ShutdownRequested, effects)
        },

        (State::SurveyIn { .. }, Event::Operator(PressKind::Short)) => (State::Idle, unwind()),

        (state, _) => (state, vec![]),
    }
}
