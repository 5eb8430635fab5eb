use crate::core::arrival::ArrivalRecord;
use crate::core::participant::Participant;
use crate::core::participant_worker::{ParticipantWorker, WorkerExit};
use crate::core::race_control::RaceControl;
use crate::core::track::Track;
use crate::error::RaceError;
use crate::pre::race_pars::RacePars;
use flume::{Receiver, Sender};
use log::{debug, info, warn};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

/// How long shutdown waits for a worker exit notification before re-checking the worker count.
const SHUTDOWN_POLL_INTERVAL: Duration = Duration::from_millis(20);

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// RaceCoordinator owns everything shared by the participant workers: the participants, the
/// track, the race control signals, the podium and the arrivals channel. It is the single place
/// where finish order is decided.
///
/// Workers hold an `Arc` of the coordinator, so it is always used through an `Arc`.
#[derive(Debug)]
pub struct RaceCoordinator {
    track: Arc<Track>,
    participants: RwLock<Vec<Arc<Participant>>>,
    tick: Duration,
    control: RaceControl,
    podium: Mutex<Vec<Arc<ArrivalRecord>>>,
    arrivals_tx: Sender<Arc<ArrivalRecord>>,
    arrivals_rx: Mutex<Option<Receiver<Arc<ArrivalRecord>>>>,
    pool: Mutex<Option<rayon::ThreadPool>>,
    workers_started: AtomicBool,
    active_workers: AtomicUsize,
    exits_tx: Sender<WorkerExit>,
    exits_rx: Receiver<WorkerExit>,
    worker_exits: Mutex<Vec<WorkerExit>>,
}

impl RaceCoordinator {
    /// * `tick` - Real time a worker spends per tick (nominally one second)
    pub fn new(
        track: Track,
        participants: Vec<Participant>,
        tick: Duration,
    ) -> Result<RaceCoordinator, RaceError> {
        let (arrivals_tx, arrivals_rx) = flume::unbounded();
        let (exits_tx, exits_rx) = flume::unbounded();

        let coordinator = RaceCoordinator {
            track: Arc::new(track),
            participants: RwLock::new(Vec::with_capacity(participants.len())),
            tick,
            control: RaceControl::new(),
            podium: Mutex::new(Vec::with_capacity(participants.len())),
            arrivals_tx,
            arrivals_rx: Mutex::new(Some(arrivals_rx)),
            pool: Mutex::new(None),
            workers_started: AtomicBool::new(false),
            active_workers: AtomicUsize::new(0),
            exits_tx,
            exits_rx,
            worker_exits: Mutex::new(Vec::new()),
        };
        coordinator.add_participants(participants)?;

        Ok(coordinator)
    }

    /// from_pars creates track and participants from the race parameters.
    pub fn from_pars(race_pars: &RacePars) -> Result<RaceCoordinator, RaceError> {
        race_pars.validate()?;

        let track = Track::new(&race_pars.track)?;
        let participants = race_pars
            .participants
            .iter()
            .map(Participant::new)
            .collect::<Result<Vec<Participant>, RaceError>>()?;

        RaceCoordinator::new(track, participants, race_pars.timing.tick())
    }

    /// add_participants appends participants to the race. Only possible before the workers
    /// were started.
    pub fn add_participants(&self, new_participants: Vec<Participant>) -> Result<(), RaceError> {
        if self.workers_started.load(Ordering::Acquire) {
            return Err(RaceError::WorkersAlreadyStarted);
        }

        let mut participants = self
            .participants
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        let mut ids: HashSet<String> = participants.iter().map(|p| p.id().to_owned()).collect();
        for participant in new_participants.iter() {
            if !ids.insert(participant.id().to_owned()) {
                return Err(RaceError::InvalidInput(format!(
                    "participant id {} is used more than once",
                    participant.id()
                )));
            }
        }

        participants.extend(new_participants.into_iter().map(Arc::new));
        Ok(())
    }

    pub fn participants(&self) -> Vec<Arc<Participant>> {
        self.participants
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .to_owned()
    }

    pub fn participant_count(&self) -> usize {
        self.participants
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn track(&self) -> &Arc<Track> {
        &self.track
    }

    pub fn control(&self) -> &RaceControl {
        &self.control
    }

    /// start_workers submits one worker per participant to a pool with exactly one thread per
    /// participant. The workers wait at the start gate, which is not opened here. Returns the
    /// number of submitted workers.
    pub fn start_workers(self: &Arc<Self>) -> Result<usize, RaceError> {
        if self.workers_started.swap(true, Ordering::AcqRel) {
            return Err(RaceError::WorkersAlreadyStarted);
        }

        let participants = self.participants();
        if participants.is_empty() {
            info!("No participants, no workers to start");
            return Ok(0);
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(participants.len())
            .thread_name(|idx| format!("participant-{}", idx))
            .build()
            .map_err(|e| RaceError::WorkerPool(e.to_string()))?;

        for participant in participants.iter() {
            let worker = ParticipantWorker::new(
                Arc::clone(participant),
                Arc::clone(&self.track),
                Arc::clone(self),
                self.tick,
            );
            let coordinator = Arc::clone(self);

            self.active_workers.fetch_add(1, Ordering::AcqRel);
            pool.spawn(move || {
                let name = worker.participant().name().to_owned();
                let exit = worker.run();
                coordinator.worker_exited(&name, exit);
            });
        }

        *lock(&self.pool) = Some(pool);
        info!("Started {} participant workers", participants.len());

        Ok(participants.len())
    }

    fn worker_exited(&self, name: &str, exit: WorkerExit) {
        debug!("Worker of {} stopped: {:?}", name, exit);
        lock(&self.worker_exits).push(exit.clone());
        self.active_workers.fetch_sub(1, Ordering::AcqRel);
        // only used to wake up shutdown, the receiver lives as long as self
        let _ = self.exits_tx.send(exit);
    }

    pub fn workers_started(&self) -> bool {
        self.workers_started.load(Ordering::Acquire)
    }

    /// Number of submitted workers that did not stop yet.
    pub fn active_workers(&self) -> usize {
        self.active_workers.load(Ordering::Acquire)
    }

    /// Exit reasons of all workers that stopped so far, in the order they stopped.
    pub fn worker_exits(&self) -> Vec<WorkerExit> {
        lock(&self.worker_exits).to_owned()
    }

    /// take_arrivals hands out the receiving end of the arrivals channel. There is exactly one
    /// consumer per race; once it drops the receiver, further registrations fail.
    pub fn take_arrivals(&self) -> Option<Receiver<Arc<ArrivalRecord>>> {
        lock(&self.arrivals_rx).take()
    }

    /// register_arrival appends the record to the podium and returns its rank (1-based). Only
    /// participants of this race are accepted, each of them once. Append
    /// and channel push happen under the same lock, so the order on the channel is the podium
    /// order.
    ///
    /// If the channel push fails the podium entry stays.
    pub fn register_arrival(&self, record: ArrivalRecord) -> Result<usize, RaceError> {
        let record = Arc::new(record);
        let participant_id = record.participant().id().to_owned();

        let mut podium = lock(&self.podium);

        let is_participant = self
            .participants
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|p| Arc::ptr_eq(p, record.participant()));
        if !is_participant {
            return Err(RaceError::UnknownParticipant { participant_id });
        }

        if podium.iter().any(|r| r.participant().id() == participant_id) {
            return Err(RaceError::DuplicateArrival { participant_id });
        }

        podium.push(Arc::clone(&record));
        let rank = podium.len();
        info!(
            "Arrival registered: {} in position {} after {}ms",
            record.participant().name(),
            rank,
            record.elapsed_ms()
        );

        self.arrivals_tx
            .send(record)
            .map_err(|_| RaceError::ArrivalChannelClosed { participant_id })?;

        Ok(rank)
    }

    /// podium_snapshot returns a copy of the podium as it is right now.
    pub fn podium_snapshot(&self) -> Vec<Arc<ArrivalRecord>> {
        lock(&self.podium).to_owned()
    }

    pub fn is_halted(&self) -> bool {
        self.control.is_halted()
    }

    /// halt stops all workers before their next tick without producing arrivals. Calling it
    /// again has no effect.
    pub fn halt(&self) {
        if self.control.halt() {
            info!("Race halted");
        }
    }

    /// shutdown cancels every worker that is still running and waits until all of them
    /// stopped. Safe to call several times.
    pub fn shutdown(&self) {
        let first = self.control.cancel();
        if first {
            debug!("Shutting down, {} workers still running", self.active_workers());
        }

        while self.active_workers() > 0 {
            let _ = self.exits_rx.recv_timeout(SHUTDOWN_POLL_INTERVAL);
        }

        if let Some(pool) = lock(&self.pool).take() {
            drop(pool);
            info!("Worker pool shut down");
        }

        let registered = lock(&self.podium).len();
        if first && registered < self.participant_count() {
            warn!(
                "Race ended with {} of {} participants on the podium",
                registered,
                self.participant_count()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::participant::ParticipantPars;
    use crate::core::track::TrackPars;
    use std::sync::Barrier;
    use std::thread;
    use std::time::Instant;

    fn participant(id: &str, speed: f64) -> Participant {
        Participant::new(&ParticipantPars {
            id: id.to_owned(),
            name: format!("Car {}", id),
            speed,
        })
        .unwrap()
    }

    fn coordinator(participants: Vec<Participant>) -> Arc<RaceCoordinator> {
        let track = Track::new(&TrackPars::default()).unwrap();
        Arc::new(RaceCoordinator::new(track, participants, Duration::from_millis(10)).unwrap())
    }

    #[test]
    fn concurrent_registrations_are_neither_lost_nor_duplicated() {
        let no_participants = 64;
        let coordinator = coordinator(
            (0..no_participants)
                .map(|i| participant(&format!("A{}", i), 10.0))
                .collect(),
        );
        let arrivals = coordinator.take_arrivals().unwrap();
        let barrier = Arc::new(Barrier::new(no_participants));
        let race_start = Instant::now();

        let handles: Vec<_> = coordinator
            .participants()
            .into_iter()
            .map(|p| {
                let coordinator = Arc::clone(&coordinator);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    coordinator.register_arrival(ArrivalRecord::new(p, race_start))
                })
            })
            .collect();

        let mut ranks: Vec<usize> = handles
            .into_iter()
            .map(|h| h.join().unwrap().unwrap())
            .collect();
        ranks.sort_unstable();
        assert_eq!(ranks, (1..=no_participants).collect::<Vec<_>>());

        let podium = coordinator.podium_snapshot();
        assert_eq!(podium.len(), no_participants);
        let ids: HashSet<&str> = podium.iter().map(|r| r.participant().id()).collect();
        assert_eq!(ids.len(), no_participants);

        // the channel delivers in podium order and shares the same records
        let delivered: Vec<Arc<ArrivalRecord>> = arrivals.try_iter().collect();
        assert_eq!(delivered.len(), no_participants);
        for (on_podium, on_channel) in podium.iter().zip(delivered.iter()) {
            assert!(Arc::ptr_eq(on_podium, on_channel));
        }
    }

    #[test]
    fn second_arrival_of_a_participant_is_rejected() {
        let coordinator = coordinator(vec![participant("A1", 10.0)]);
        let p = coordinator.participants().remove(0);
        let race_start = Instant::now();

        assert_eq!(
            coordinator
                .register_arrival(ArrivalRecord::new(Arc::clone(&p), race_start))
                .unwrap(),
            1
        );
        assert!(matches!(
            coordinator.register_arrival(ArrivalRecord::new(p, race_start)),
            Err(RaceError::DuplicateArrival { .. })
        ));
        assert_eq!(coordinator.podium_snapshot().len(), 1);
    }

    #[test]
    fn arrival_of_a_foreign_participant_is_rejected() {
        let coordinator = coordinator(vec![participant("A1", 10.0)]);
        let race_start = Instant::now();

        for id in ["X1", "X2"] {
            let foreign = Arc::new(participant(id, 10.0));
            assert!(matches!(
                coordinator.register_arrival(ArrivalRecord::new(foreign, race_start)),
                Err(RaceError::UnknownParticipant { .. })
            ));
        }

        // same id, but not the instance taking part in the race
        let impostor = Arc::new(participant("A1", 10.0));
        assert!(matches!(
            coordinator.register_arrival(ArrivalRecord::new(impostor, race_start)),
            Err(RaceError::UnknownParticipant { .. })
        ));

        assert!(coordinator.podium_snapshot().is_empty());
        assert!(coordinator.podium_snapshot().len() <= coordinator.participant_count());
    }

    #[test]
    fn closed_channel_keeps_podium_entry() {
        let coordinator = coordinator(vec![participant("A1", 10.0)]);
        drop(coordinator.take_arrivals());
        assert!(coordinator.take_arrivals().is_none());

        let p = coordinator.participants().remove(0);
        let res = coordinator.register_arrival(ArrivalRecord::new(p, Instant::now()));
        assert!(matches!(res, Err(RaceError::ArrivalChannelClosed { .. })));
        assert_eq!(coordinator.podium_snapshot().len(), 1);
    }

    #[test]
    fn snapshot_is_a_copy() {
        let coordinator = coordinator(vec![participant("A1", 10.0), participant("A2", 10.0)]);
        let mut participants = coordinator.participants();
        let race_start = Instant::now();

        coordinator
            .register_arrival(ArrivalRecord::new(participants.remove(0), race_start))
            .unwrap();
        let snapshot = coordinator.podium_snapshot();
        coordinator
            .register_arrival(ArrivalRecord::new(participants.remove(0), race_start))
            .unwrap();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(coordinator.podium_snapshot().len(), 2);
    }

    #[test]
    fn rejects_duplicate_participant_ids() {
        let track = Track::new(&TrackPars::default()).unwrap();
        let res = RaceCoordinator::new(
            track,
            vec![participant("A1", 1.0), participant("A1", 2.0)],
            Duration::from_millis(10),
        );
        assert!(matches!(res, Err(RaceError::InvalidInput(_))));
    }

    #[test]
    fn workers_start_only_once() {
        let coordinator = coordinator(vec![participant("A1", 10.0), participant("A2", 10.0)]);
        assert_eq!(coordinator.start_workers().unwrap(), 2);
        assert!(matches!(
            coordinator.start_workers(),
            Err(RaceError::WorkersAlreadyStarted)
        ));
        assert!(matches!(
            coordinator.add_participants(vec![participant("A3", 10.0)]),
            Err(RaceError::WorkersAlreadyStarted)
        ));
        assert_eq!(coordinator.active_workers(), 2);

        coordinator.shutdown();
        coordinator.shutdown();
        assert_eq!(coordinator.active_workers(), 0);
        assert_eq!(
            coordinator.worker_exits(),
            vec![WorkerExit::Cancelled, WorkerExit::Cancelled]
        );
        assert!(coordinator.participants().iter().all(|p| p.position() == 0.0));
    }

    #[test]
    fn no_participants_no_workers() {
        let coordinator = coordinator(Vec::new());
        assert_eq!(coordinator.start_workers().unwrap(), 0);
        assert_eq!(coordinator.active_workers(), 0);
        coordinator.shutdown();
        assert!(coordinator.worker_exits().is_empty());
    }

    #[test]
    fn halt_is_one_directional() {
        let coordinator = coordinator(vec![participant("A1", 10.0)]);
        assert!(!coordinator.is_halted());
        coordinator.halt();
        coordinator.halt();
        assert!(coordinator.is_halted());
    }
}
