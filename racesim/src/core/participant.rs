use crate::error::RaceError;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// * `id` - Unique participant id, e.g. A1
/// * `name` - Participant name, e.g. Lightning
/// * `speed` - (m/tick) Distance covered per tick, must be finite and >= 0
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ParticipantPars {
    pub id: String,
    pub name: String,
    pub speed: f64,
}

impl ParticipantPars {
    pub fn validate(&self) -> Result<(), RaceError> {
        if !self.speed.is_finite() || self.speed < 0.0 {
            return Err(RaceError::InvalidInput(format!(
                "speed of participant {} must be finite and >= 0, got {}",
                self.id, self.speed
            )));
        }
        Ok(())
    }
}

/// Participant is shared between its worker (the only writer of `position`) and everybody
/// reading progress. The position is kept as the bit pattern of an f64 so that readers never
/// need a lock.
#[derive(Debug)]
pub struct Participant {
    id: String,
    name: String,
    speed: f64,
    position: AtomicU64,
    withdrawn: AtomicBool,
}

impl Participant {
    pub fn new(participant_pars: &ParticipantPars) -> Result<Participant, RaceError> {
        participant_pars.validate()?;

        Ok(Participant {
            id: participant_pars.id.to_owned(),
            name: participant_pars.name.to_owned(),
            speed: participant_pars.speed,
            position: AtomicU64::new(0.0f64.to_bits()),
            withdrawn: AtomicBool::new(false),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// (m) Distance covered so far.
    pub fn position(&self) -> f64 {
        f64::from_bits(self.position.load(Ordering::Acquire))
    }

    /// advance_one_tick moves the participant forward by its speed and returns the new position.
    /// Only the worker bound to this participant may call it.
    pub(crate) fn advance_one_tick(&self) -> f64 {
        let position = self.position() + self.speed;
        self.position.store(position.to_bits(), Ordering::Release);
        position
    }

    pub fn is_withdrawn(&self) -> bool {
        self.withdrawn.load(Ordering::Acquire)
    }

    /// withdraw takes the participant out of the race. Its worker stops before the next tick
    /// without producing an arrival.
    pub fn withdraw(&self) {
        self.withdrawn.store(true, Ordering::Release);
    }
}
