use crate::pre::race_pars::TimingPars;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser, Clone)]
#[clap(
    version = "0.1.0",
    name = "race-cli",
    about = "A real-time race between concurrently moving participants"
)]
pub struct SimOpts {
    // FLAGS ---------------------------------------------------------------------------------------
    /// Print the previously saved ranking before the race
    #[clap(short, long)]
    pub show_last: bool,

    /// Do not save the final ranking
    #[clap(long)]
    pub no_save: bool,

    // OPTIONS -------------------------------------------------------------------------------------
    /// Set path to the race parameter file (OPTIONAL: if not set, the race is set up interactively)
    #[clap(short, long)]
    pub parfile_path: Option<PathBuf>,

    /// Set path of the ranking file
    #[clap(short, long, default_value = "output/ranking.csv")]
    pub ranking_file: PathBuf,

    /// Override the real time of one tick in milliseconds
    #[clap(short, long)]
    pub tick_ms: Option<u64>,

    /// Override the pause between two countdown announcements in milliseconds
    #[clap(short, long)]
    pub countdown_step_ms: Option<u64>,
}

impl SimOpts {
    /// apply_timing overrides the timing parameters with the values given on the command line.
    pub fn apply_timing(&self, timing: &mut TimingPars) {
        if let Some(tick_ms) = self.tick_ms {
            timing.tick_ms = tick_ms;
        }
        if let Some(countdown_step_ms) = self.countdown_step_ms {
            timing.countdown_step_ms = countdown_step_ms;
        }
    }
}
