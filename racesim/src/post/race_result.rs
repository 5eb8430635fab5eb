use crate::core::arrival::ArrivalRecord;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Standing is one line of the final classification.
/// * `rank` - 1-based finish position
/// * `elapsed_ms` - (ms) Race time from the start signal to the arrival
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Standing {
    pub rank: usize,
    pub participant_id: String,
    pub name: String,
    pub elapsed_ms: u64,
}

impl Standing {
    pub fn from_arrival(rank: usize, record: &ArrivalRecord) -> Standing {
        Standing {
            rank,
            participant_id: record.participant().id().to_owned(),
            name: record.participant().name().to_owned(),
            elapsed_ms: record.elapsed_ms(),
        }
    }
}

/// format_standings renders one line per standing, e.g. `1) Lightning - time(ms)=2003`.
pub fn format_standings(standings: &[Standing]) -> String {
    let mut tmp_string = String::new();
    for standing in standings.iter() {
        // writing into a String cannot fail
        let _ = writeln!(
            &mut tmp_string,
            "{}) {} - time(ms)={}",
            standing.rank, standing.name, standing.elapsed_ms
        );
    }
    tmp_string
}

/// RaceResult contains the finish order as reported by the judge.
/// * `expected` - Number of participants that started
/// * `interrupted` - The judge was interrupted before all arrivals were collected
/// * `halted` - The race was halted before every participant arrived
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RaceResult {
    pub track_name: String,
    pub expected: usize,
    pub standings: Vec<Standing>,
    pub interrupted: bool,
    pub halted: bool,
}

impl RaceResult {
    /// is_complete returns true if every participant arrived.
    pub fn is_complete(&self) -> bool {
        self.standings.len() == self.expected
    }

    pub fn to_text(&self) -> String {
        let mut content = String::new();
        let _ = writeln!(&mut content, "RESULT: Final standings on {}", self.track_name);
        content.push_str(&format_standings(&self.standings));

        if self.interrupted {
            let _ = writeln!(&mut content, "RESULT: Race interrupted");
        } else if self.halted {
            let _ = writeln!(
                &mut content,
                "RESULT: Race halted, {} of {} participants arrived",
                self.standings.len(),
                self.expected
            );
        } else if !self.is_complete() {
            let _ = writeln!(
                &mut content,
                "RESULT: {} of {} participants arrived",
                self.standings.len(),
                self.expected
            );
        }
        content
    }

    /// print_standings prints the final standings to the console output.
    pub fn print_standings(&self) {
        print!("{}", self.to_text());
    }
}
