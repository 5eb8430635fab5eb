use crate::core::participant::Participant;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// ArrivalRecord is created once, by the worker whose participant crossed the finish line. The
/// podium and the arrivals channel share the same record through an Arc.
#[derive(Debug)]
pub struct ArrivalRecord {
    participant: Arc<Participant>,
    elapsed: Duration,
}

impl ArrivalRecord {
    /// new stamps the arrival with the current time. `race_start` is the instant the start gate
    /// opened.
    pub fn new(participant: Arc<Participant>, race_start: Instant) -> ArrivalRecord {
        ArrivalRecord {
            participant,
            elapsed: Instant::now().saturating_duration_since(race_start),
        }
    }

    pub fn participant(&self) -> &Arc<Participant> {
        &self.participant
    }

    /// Race time from gate opening to arrival.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed.as_millis() as u64
    }
}
