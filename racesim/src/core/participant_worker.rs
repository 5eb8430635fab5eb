use crate::core::arrival::ArrivalRecord;
use crate::core::coordinator::RaceCoordinator;
use crate::core::participant::Participant;
use crate::core::race_control::{StartSignal, Wake};
use crate::core::track::Track;
use log::{debug, warn};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// WorkerExit is the reason a participant worker stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerExit {
    /// Crossed the finish line and got this podium rank.
    Finished { rank: usize },
    Halted,
    Withdrawn,
    Cancelled,
    /// Crossed the finish line but the arrival could not be delivered.
    RegistrationFailed,
}

/// ParticipantWorker drives one participant from the start signal to the finish line (or to a
/// halt, withdrawal or cancellation). It is the only writer of the participant's position.
#[derive(Debug)]
pub struct ParticipantWorker {
    participant: Arc<Participant>,
    track: Arc<Track>,
    coordinator: Arc<RaceCoordinator>,
    tick: Duration,
}

impl ParticipantWorker {
    pub fn new(
        participant: Arc<Participant>,
        track: Arc<Track>,
        coordinator: Arc<RaceCoordinator>,
        tick: Duration,
    ) -> ParticipantWorker {
        ParticipantWorker {
            participant,
            track,
            coordinator,
            tick,
        }
    }

    pub fn participant(&self) -> &Arc<Participant> {
        &self.participant
    }

    /// run blocks until the start gate opens and then advances the participant once per tick.
    pub fn run(self) -> WorkerExit {
        let control = self.coordinator.control();

        let race_start = match control.wait_for_start() {
            StartSignal::Go(opened_at) => opened_at,
            StartSignal::Halted => return WorkerExit::Halted,
            StartSignal::Cancelled => return WorkerExit::Cancelled,
        };
        debug!("{} left the start", self.participant.name());

        loop {
            if control.is_halted() {
                return WorkerExit::Halted;
            }
            if self.participant.is_withdrawn() {
                return WorkerExit::Withdrawn;
            }

            let t_start = Instant::now();
            let position = self.participant.advance_one_tick();

            if self.track.is_finished(position) {
                let record = ArrivalRecord::new(Arc::clone(&self.participant), race_start);
                return match self.coordinator.register_arrival(record) {
                    Ok(rank) => WorkerExit::Finished { rank },
                    Err(e) => {
                        warn!("{}: {}", self.participant.name(), e);
                        WorkerExit::RegistrationFailed
                    }
                };
            }

            // the time spent in this tick shortens only this tick's pause, lateness is not
            // carried over to the next one
            let t_sleep = self.tick.saturating_sub(t_start.elapsed());

            match control.sleep(t_sleep) {
                Wake::Elapsed => {}
                Wake::Halted => return WorkerExit::Halted,
                Wake::Cancelled => return WorkerExit::Cancelled,
            }
        }
    }
}
