use std::path::PathBuf;

use log::{debug, error, info};

use crate::{
    averager::SurveyResult,
    cfg::Config,
    error::Error,
    feed::{FeedConnector, PositionFeed},
    monitor::{MonitorOutcome, StabilityMonitor},
    operator::{measure_press, wait_for_press, OperatorSignal},
    orchestrator::{transition, Effect, Event, State},
    prelude::Duration,
    process::{ProcessHandle, StreamCommands},
    template::CommandTemplate,
};

/// LED feedback per rover probe attempt: (total, period) in seconds
const ROVER_PROBE_BLINK: (f64, f64) = (1.0, 0.5);

/// [Orchestrator] runs survey cycles: it performs the activity of the
/// current [State], feeds the resulting [Event] to [transition] and
/// applies the [Effect]s. It exclusively owns the streaming process
/// and the position feed, which are released whenever a cycle aborts.
pub struct Orchestrator<P: ProcessHandle, C: FeedConnector, O: OperatorSignal> {
    cfg: Config,
    commands: StreamCommands,
    template: CommandTemplate,
    base_cmd_file: PathBuf,
    state: State,
    launcher: P,
    connector: C,
    operator: O,
    child: Option<P::Child>,
    feed: Option<C::Feed>,
}

impl<P: ProcessHandle, C: FeedConnector, O: OperatorSignal> Orchestrator<P, C, O> {
    pub fn new(
        cfg: &Config,
        commands: StreamCommands,
        template: CommandTemplate,
        launcher: P,
        connector: C,
        operator: O,
    ) -> Self {
        Self {
            cfg: cfg.clone(),
            commands,
            template,
            base_cmd_file: cfg.resolve(&cfg.base_cmd_file),
            state: State::Idle,
            launcher,
            connector,
            operator,
            child: None,
            feed: None,
        }
    }

    /// Current [State]
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Streaming process launcher
    pub fn launcher(&self) -> &P {
        &self.launcher
    }

    /// Position feed connector
    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Operator signal
    pub fn operator(&self) -> &O {
        &self.operator
    }

    /// Performs the current state activity and the resulting transition.
    pub fn step(&mut self) -> &State {
        if !self.state.is_terminal() {
            let event = self.activity();
            self.dispatch(event);
        }
        &self.state
    }

    /// Runs survey cycles until shutdown is requested
    pub fn run(&mut self) {
        while !self.step().is_terminal() {}
        info!("shutdown requested");
    }

    fn dispatch(&mut self, event: Event) {
        debug!("{}: {:?}", self.state, event);

        let state = std::mem::replace(&mut self.state, State::Idle);
        let (next, effects) = transition(state, event);
        info!("entering {}", next);
        self.state = next;

        for effect in effects {
            if let Err(e) = self.apply(effect) {
                error!("{}: {}", self.state, e);
                let state = std::mem::replace(&mut self.state, State::Idle);
                let (next, effects) = transition(state, Event::Failed(e));
                info!("entering {}", next);
                self.state = next;
                for effect in effects {
                    if let Err(e) = self.apply(effect) {
                        error!("cleanup: {}", e);
                    }
                }
                return;
            }
        }
    }

    fn activity(&mut self) -> Event {
        match &self.state {
            State::Idle => {
                if self.cfg.operator.start_on_press {
                    Event::Operator(wait_for_press(
                        &mut self.operator,
                        &self.cfg.operator,
                        true,
                    ))
                } else {
                    Event::CycleStart
                }
            },
            State::RoverProbe => self.probe_rover(),
            State::AwaitingRoverFix { .. } => Event::RoverReleased,
            State::SurveyIn { .. } => self.survey(),
            State::Averaging { window } => match SurveyResult::from_window(window) {
                Ok(result) => Event::Averaged(result),
                Err(e) => Event::Failed(e),
            },
            State::BaseStreaming { .. } => Event::Operator(wait_for_press(
                &mut self.operator,
                &self.cfg.operator,
                false,
            )),
            State::Error(_) => {
                if self.operator.has_button() {
                    Event::Operator(wait_for_press(
                        &mut self.operator,
                        &self.cfg.operator,
                        true,
                    ))
                } else {
                    let pause = self.cfg.restart_pause();
                    self.operator.pause(pause);
                    Event::Acknowledged
                }
            },
            State::ShutdownRequested => Event::Acknowledged,
        }
    }

    /// Reads the feed until a valid position shows up
    fn probe_rover(&mut self) -> Event {
        let Some(feed) = self.feed.as_mut() else {
            return Event::Failed(Error::StreamClosed);
        };

        for attempt in 0..self.cfg.rover_probe_attempts {
            match feed.next_sample() {
                Ok(Some(sample)) if sample.has_position() => {
                    info!("approximate position: {}", sample);
                    return Event::RoverFix(sample);
                },
                Ok(Some(sample)) => debug!("rover probe #{}: {}", attempt, sample),
                Ok(None) => debug!("rover probe #{}: no sample", attempt),
                Err(e) => return Event::Failed(e),
            }
            self.operator.blink(
                Duration::from_seconds(ROVER_PROBE_BLINK.0),
                Duration::from_seconds(ROVER_PROBE_BLINK.1),
            );
        }

        Event::Failed(Error::NoRoverFix)
    }

    fn survey(&mut self) -> Event {
        let Some(feed) = self.feed.as_mut() else {
            return Event::Failed(Error::StreamClosed);
        };

        let monitor = StabilityMonitor::new(&self.cfg.survey);

        match monitor.run(feed, &mut self.operator) {
            MonitorOutcome::UserCancelled => {
                Event::Operator(measure_press(&mut self.operator, &self.cfg.operator))
            },
            outcome => Event::Surveyed(outcome),
        }
    }

    fn apply(&mut self, effect: Effect) -> Result<(), Error> {
        match effect {
            Effect::StartStream(mode) => {
                self.stop_stream();
                let spec = self.commands.spec(&mode);
                let child = self.launcher.start(&spec)?;
                info!("{} stream started", mode);
                self.child = Some(child);
            },
            Effect::StopStream => self.stop_stream(),
            Effect::OpenFeed => {
                self.feed = None;
                self.feed = Some(self.connector.connect()?);
            },
            Effect::CloseFeed => {
                if self.feed.take().is_some() {
                    debug!("position feed closed");
                }
            },
            Effect::WriteBaseCommand(result) => {
                self.template.render_to_file(&result, &self.base_cmd_file)?;
            },
            Effect::Led(on) => self.operator.set_led(on),
            Effect::Blink { total, period } => self.operator.blink(total, period),
            Effect::RestartPause => {
                let pause = self.cfg.restart_pause();
                self.operator.pause(pause);
            },
            Effect::Pause(dt) => self.operator.pause(dt),
        }
        Ok(())
    }

    fn stop_stream(&mut self) {
        if let Some(child) = self.child.take() {
            self.launcher.terminate(child);
            debug!("stream terminated");
        }
    }
}

impl<P: ProcessHandle, C: FeedConnector, O: OperatorSignal> Drop for Orchestrator<P, C, O> {
    fn drop(&mut self) {
        self.feed = None;
        self.stop_stream();
    }
}
