use crate::core::participant::ParticipantPars;
use crate::core::start_controller::Countdown;
use crate::core::track::TrackPars;
use crate::error::RaceError;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::OpenOptions;
use std::path::Path;
use std::time::Duration;

/// * `tick_ms` - (ms) Real time of one tick, i.e. one second of simulated time
/// * `countdown_steps` - Number of countdown announcements before the start
/// * `countdown_step_ms` - (ms) Pause before each countdown announcement
/// * `countdown_final_ms` - (ms) Pause between the last announcement and the start
/// * `arrival_poll_ms` - (ms) Interval in which the judge re-checks halt and interruption while
/// waiting for arrivals
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct TimingPars {
    pub tick_ms: u64,
    pub countdown_steps: u32,
    pub countdown_step_ms: u64,
    pub countdown_final_ms: u64,
    pub arrival_poll_ms: u64,
}

impl Default for TimingPars {
    fn default() -> Self {
        TimingPars {
            tick_ms: 1000,
            countdown_steps: 3,
            countdown_step_ms: 1000,
            countdown_final_ms: 300,
            arrival_poll_ms: 50,
        }
    }
}

impl TimingPars {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn countdown(&self) -> Countdown {
        Countdown {
            steps: self.countdown_steps,
            step: Duration::from_millis(self.countdown_step_ms),
            final_pause: Duration::from_millis(self.countdown_final_ms),
        }
    }

    pub fn arrival_poll(&self) -> Duration {
        Duration::from_millis(self.arrival_poll_ms)
    }
}

/// RacePars is used to store all parameters of a race.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RacePars {
    pub track: TrackPars,
    pub participants: Vec<ParticipantPars>,
    #[serde(default)]
    pub timing: TimingPars,
}

impl RacePars {
    pub fn validate(&self) -> Result<(), RaceError> {
        self.track.validate()?;

        let mut ids = HashSet::with_capacity(self.participants.len());
        for participant_pars in self.participants.iter() {
            participant_pars.validate()?;
            if !ids.insert(participant_pars.id.as_str()) {
                return Err(RaceError::InvalidInput(format!(
                    "participant id {} is used more than once",
                    participant_pars.id
                )));
            }
        }

        if self.timing.arrival_poll_ms == 0 {
            return Err(RaceError::InvalidInput(
                "arrival_poll_ms must be > 0".to_owned(),
            ));
        }
        Ok(())
    }
}

/// read_race_pars reads the JSON file and decodes it into the race parameters struct.
pub fn read_race_pars(filepath: &Path) -> anyhow::Result<RacePars> {
    let fh = OpenOptions::new()
        .read(true)
        .open(filepath)
        .context(format!(
            "Failed to open parameter file {}!",
            filepath.display()
        ))?;
    let pars: RacePars = serde_json::from_reader(&fh).context(format!(
        "Failed to parse parameter file {}!",
        filepath.display()
    ))?;
    pars.validate()
        .context(format!("Invalid parameter file {}!", filepath.display()))?;
    Ok(pars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const PARFILE: &str = r#"{
        "track": { "id": "P1", "name": "Monza", "length": 100.0 },
        "participants": [
            { "id": "A1", "name": "Lightning", "speed": 50.0 },
            { "id": "A2", "name": "Thunder", "speed": 25.0 }
        ],
        "timing": { "tick_ms": 20 }
    }"#;

    #[test]
    fn reads_parfile_with_partial_timing() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(PARFILE.as_bytes()).unwrap();

        let pars = read_race_pars(file.path()).unwrap();
        assert_eq!(pars.track.name, "Monza");
        assert_eq!(pars.participants.len(), 2);
        assert_eq!(pars.timing.tick(), Duration::from_millis(20));
        assert_eq!(pars.timing.countdown_steps, 3);
        assert_eq!(pars.timing.arrival_poll_ms, 50);
    }

    #[test]
    fn timing_is_optional() {
        let pars: RacePars = serde_json::from_str(
            r#"{ "track": { "id": "P1", "name": "Oval", "length": 10.0 }, "participants": [] }"#,
        )
        .unwrap();
        assert_eq!(pars.timing, TimingPars::default());
        assert!(pars.validate().is_ok());
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = read_race_pars(Path::new("does/not/exist.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to open parameter file"));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut pars: RacePars = serde_json::from_str(PARFILE).unwrap();
        pars.track.length = 0.0;
        assert!(pars.validate().is_err());

        let mut pars: RacePars = serde_json::from_str(PARFILE).unwrap();
        pars.participants[1].id = "A1".to_owned();
        assert!(pars.validate().is_err());

        let mut pars: RacePars = serde_json::from_str(PARFILE).unwrap();
        pars.participants[0].speed = -5.0;
        assert!(pars.validate().is_err());
    }
}
