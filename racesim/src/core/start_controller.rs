use crate::core::arrival::ArrivalRecord;
use crate::core::coordinator::RaceCoordinator;
use crate::error::RaceError;
use crate::interfaces::reporter::RaceReporter;
use crate::post::race_result::{RaceResult, Standing};
use flume::{Receiver, RecvTimeoutError};
use helpers::sync::Signal;
use log::{debug, info, warn};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// * `steps` - Number of announcements, counted down to 1
/// * `step` - Pause before each announcement
/// * `final_pause` - Pause between the last announcement and the start
#[derive(Debug, Clone, PartialEq)]
pub struct Countdown {
    pub steps: u32,
    pub step: Duration,
    pub final_pause: Duration,
}

impl Countdown {
    /// A countdown that starts the race right away.
    pub fn immediate() -> Countdown {
        Countdown {
            steps: 0,
            step: Duration::ZERO,
            final_pause: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Countdown,
    Started,
    Collecting,
    Finished,
}

/// Shuts the coordinator down on every way out of the judge, panics included.
struct ShutdownGuard<'a>(&'a RaceCoordinator);

impl Drop for ShutdownGuard<'_> {
    fn drop(&mut self) {
        self.0.shutdown();
    }
}

/// StartController is the judge of a race: it counts down, opens the start gate and announces
/// the arrivals in the order it receives them until every participant arrived, nobody is left
/// running or it gets interrupted.
#[derive(Debug)]
pub struct StartController {
    coordinator: Arc<RaceCoordinator>,
    arrivals: Receiver<Arc<ArrivalRecord>>,
    countdown: Countdown,
    arrival_poll: Duration,
    state: Mutex<ControllerState>,
    interrupt: Signal,
}

impl StartController {
    /// new takes over the arrivals channel of the coordinator, only one judge per race is
    /// possible.
    ///
    /// * `arrival_poll` - Interval in which interruption and remaining workers are re-checked
    /// while waiting for arrivals
    pub fn new(
        coordinator: Arc<RaceCoordinator>,
        countdown: Countdown,
        arrival_poll: Duration,
    ) -> Result<StartController, RaceError> {
        let arrivals = coordinator
            .take_arrivals()
            .ok_or(RaceError::ArrivalsAlreadyTaken)?;

        Ok(StartController {
            coordinator,
            arrivals,
            countdown,
            arrival_poll,
            state: Mutex::new(ControllerState::Idle),
            interrupt: Signal::new(),
        })
    }

    pub fn state(&self) -> ControllerState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, new_state: ControllerState) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        debug!("Judge: {:?} -> {:?}", *state, new_state);
        *state = new_state;
    }

    /// interrupt stops the judge during the countdown or while it waits for arrivals. Can be
    /// called from any thread.
    pub fn interrupt(&self) -> bool {
        let first = self.interrupt.fire();
        if first {
            info!("Judge interrupted");
        }
        first
    }

    /// run executes the whole race from the countdown to the final standings. The coordinator
    /// is shut down before run returns, no matter how it ends.
    pub fn run(&self, reporter: &mut dyn RaceReporter) -> Result<RaceResult, RaceError> {
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if *state != ControllerState::Idle {
                return Err(RaceError::RaceAlreadyStarted);
            }
            *state = ControllerState::Countdown;
        }
        let _shutdown = ShutdownGuard(&self.coordinator);

        let expected = self.coordinator.participant_count();
        if expected > 0 && !self.coordinator.workers_started() {
            warn!("Judge started a race with {} participants but no workers", expected);
        }

        let mut standings: Vec<Standing> = Vec::with_capacity(expected);

        // without participants there is nothing to count down for
        let interrupted = if expected > 0 && !self.count_down(reporter) {
            true
        } else {
            self.start(reporter, expected);
            !self.collect(reporter, expected, &mut standings)
        };

        self.set_state(ControllerState::Finished);

        if interrupted {
            reporter.race_interrupted();
        } else if standings.len() < expected {
            reporter.race_halted(standings.len(), expected);
        }
        reporter.final_standings(&standings);

        // a halt after the last arrival does not change the outcome
        let halted = self.coordinator.is_halted() && standings.len() < expected;

        Ok(RaceResult {
            track_name: self.coordinator.track().name.to_owned(),
            expected,
            standings,
            interrupted,
            halted,
        })
    }

    /// count_down returns false if the judge was interrupted meanwhile.
    fn count_down(&self, reporter: &mut dyn RaceReporter) -> bool {
        for remaining in (1..=self.countdown.steps).rev() {
            if self.interrupt.wait_timeout(self.countdown.step) {
                return false;
            }
            reporter.countdown(remaining);
        }
        !self.interrupt.wait_timeout(self.countdown.final_pause)
    }

    fn start(&self, reporter: &mut dyn RaceReporter, expected: usize) {
        self.set_state(ControllerState::Started);
        if self.coordinator.control().open_gate() {
            info!("Judge: go!");
        }
        reporter.race_started(expected);
    }

    /// collect returns false if the judge was interrupted before all arrivals were in.
    fn collect(
        &self,
        reporter: &mut dyn RaceReporter,
        expected: usize,
        standings: &mut Vec<Standing>,
    ) -> bool {
        self.set_state(ControllerState::Collecting);

        while standings.len() < expected {
            if self.interrupt.is_fired() {
                return false;
            }

            match self.arrivals.recv_timeout(self.arrival_poll) {
                Ok(record) => announce(reporter, &record, standings),
                Err(RecvTimeoutError::Timeout) => {
                    if self.coordinator.active_workers() == 0 {
                        // nobody is left who could still arrive, take what was delivered
                        let missing = expected - standings.len();
                        for record in self.arrivals.try_iter().take(missing) {
                            announce(reporter, &record, standings);
                        }
                        info!(
                            "Judge: no participant running anymore, {} of {} arrived",
                            standings.len(),
                            expected
                        );
                        break;
                    }
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        true
    }
}

fn announce(
    reporter: &mut dyn RaceReporter,
    record: &ArrivalRecord,
    standings: &mut Vec<Standing>,
) {
    let standing = Standing::from_arrival(standings.len() + 1, record);
    reporter.participant_finished(&standing.name, standing.rank);
    standings.push(standing);
}
