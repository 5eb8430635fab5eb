use crate::post::race_result::Standing;
use flume::Sender;

/// RaceReporter receives the user-visible events of a race, in the order they happen.
pub trait RaceReporter {
    /// `remaining` countdown steps before the start, called once per announcement
    fn countdown(&mut self, remaining: u32);
    fn race_started(&mut self, no_participants: usize);
    fn participant_finished(&mut self, name: &str, rank: usize);
    fn race_interrupted(&mut self);
    /// The race ended before every participant arrived, e.g. because it was halted.
    fn race_halted(&mut self, finished: usize, expected: usize);
    fn final_standings(&mut self, standings: &[Standing]);
}

/// ConsoleReporter prints the race to the console output.
#[derive(Debug, Default)]
pub struct ConsoleReporter;

impl RaceReporter for ConsoleReporter {
    fn countdown(&mut self, remaining: u32) {
        println!("INFO: Judge: {}...", remaining);
    }

    fn race_started(&mut self, no_participants: usize) {
        println!("INFO: Judge: go! ({} participants)", no_participants);
    }

    fn participant_finished(&mut self, name: &str, rank: usize) {
        println!("INFO: Judge: {} crossed the finish line! ({}.)", name, rank);
    }

    fn race_interrupted(&mut self) {
        println!("WARNING: Judge: race interrupted");
    }

    fn race_halted(&mut self, finished: usize, expected: usize) {
        println!(
            "WARNING: Judge: race stopped, {} of {} participants arrived",
            finished, expected
        );
    }

    fn final_standings(&mut self, standings: &[Standing]) {
        println!("INFO: Judge: {} participants classified", standings.len());
        if let Some(winner) = standings.first() {
            println!("INFO: Judge: winner is {}", winner.name);
        }
    }
}

/// RaceEvent mirrors the RaceReporter calls so they can be sent to another thread.
#[derive(Debug, Clone, PartialEq)]
pub enum RaceEvent {
    Countdown(u32),
    Started { no_participants: usize },
    Finished { name: String, rank: usize },
    Interrupted,
    Halted { finished: usize, expected: usize },
    FinalStandings(Vec<Standing>),
}

/// ChannelReporter forwards every event over a channel. Events are dropped silently once the
/// receiving side is gone.
#[derive(Debug, Clone)]
pub struct ChannelReporter {
    tx: Sender<RaceEvent>,
}

impl ChannelReporter {
    pub fn new(tx: Sender<RaceEvent>) -> ChannelReporter {
        ChannelReporter { tx }
    }

    fn send(&self, event: RaceEvent) {
        let _ = self.tx.send(event);
    }
}

impl RaceReporter for ChannelReporter {
    fn countdown(&mut self, remaining: u32) {
        self.send(RaceEvent::Countdown(remaining));
    }

    fn race_started(&mut self, no_participants: usize) {
        self.send(RaceEvent::Started { no_participants });
    }

    fn participant_finished(&mut self, name: &str, rank: usize) {
        self.send(RaceEvent::Finished {
            name: name.to_owned(),
            rank,
        });
    }

    fn race_interrupted(&mut self) {
        self.send(RaceEvent::Interrupted);
    }

    fn race_halted(&mut self, finished: usize, expected: usize) {
        self.send(RaceEvent::Halted { finished, expected });
    }

    fn final_standings(&mut self, standings: &[Standing]) {
        self.send(RaceEvent::FinalStandings(standings.to_vec()));
    }
}
