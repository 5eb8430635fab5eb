use crate::error::RaceError;
use serde::{Deserialize, Serialize};

/// * `id` - Track id, e.g. P1
/// * `name` - Track name
/// * `length` - (m) Distance from the start to the finish line, must be finite and > 0
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TrackPars {
    pub id: String,
    pub name: String,
    pub length: f64,
}

impl TrackPars {
    pub fn validate(&self) -> Result<(), RaceError> {
        if !self.length.is_finite() || self.length <= 0.0 {
            return Err(RaceError::InvalidInput(format!(
                "length of track {} must be finite and > 0, got {}",
                self.id, self.length
            )));
        }
        Ok(())
    }
}

impl Default for TrackPars {
    fn default() -> Self {
        TrackPars {
            id: "P1".to_owned(),
            name: "Main Track".to_owned(),
            length: 100.0,
        }
    }
}

/// Track is read-only for the whole race.
#[derive(Debug, Clone)]
pub struct Track {
    pub id: String,
    pub name: String,
    pub length: f64,
}

impl Track {
    pub fn new(track_pars: &TrackPars) -> Result<Track, RaceError> {
        track_pars.validate()?;

        Ok(Track {
            id: track_pars.id.to_owned(),
            name: track_pars.name.to_owned(),
            length: track_pars.length,
        })
    }

    /// is_finished returns true once a position reached or passed the finish line.
    pub fn is_finished(&self, position: f64) -> bool {
        position >= self.length
    }

    /// ticks_to_finish returns the number of ticks a participant with the given speed needs, or
    /// None if it never arrives.
    pub fn ticks_to_finish(&self, speed: f64) -> Option<u64> {
        if speed <= 0.0 || !speed.is_finite() {
            return None;
        }
        Some((self.length / speed).ceil().max(1.0) as u64)
    }
}
