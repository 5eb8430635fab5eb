use clap::Parser;
use log::info;
use racesim::core::handle_race::handle_race;
use racesim::core::track::Track;
use racesim::error::RaceError;
use racesim::interfaces::reporter::ConsoleReporter;
use racesim::post::race_result::format_standings;
use racesim::post::ranking_file::{read_last_ranking, write_ranking};
use racesim::pre::prompt::prompt_race_pars;
use racesim::pre::race_pars::{read_race_pars, RacePars};
use racesim::pre::sim_opts::SimOpts;
use std::fmt::Write;
use std::io;
use std::path::Path;
use std::time::Instant;

/// last_ranking_text renders the previously saved ranking. A ranking file that cannot be read
/// only results in a warning, the race can run anyway.
fn last_ranking_text(ranking_file: &Path) -> String {
    match read_last_ranking(ranking_file) {
        Ok(Some(standings)) => format!(
            "INFO: Last saved ranking:\n{}INFO: End of the last ranking.\n",
            format_standings(&standings)
        ),
        Ok(None) => "INFO: No previous ranking found.\n".to_owned(),
        Err(e) => format!("WARNING: Could not read the last ranking: {:#}\n", e),
    }
}

/// race_summary lists the participants together with the number of ticks they need at best.
fn race_summary(race_pars: &RacePars) -> Result<String, RaceError> {
    let track = Track::new(&race_pars.track)?;
    let mut summary = String::new();

    let _ = writeln!(
        &mut summary,
        "INFO: Racing {} participants on {} ({:.1}m) with a tick of {}ms",
        race_pars.participants.len(),
        track.name,
        track.length,
        race_pars.timing.tick_ms
    );
    for participant_pars in race_pars.participants.iter() {
        let ticks = match track.ticks_to_finish(participant_pars.speed) {
            Some(ticks) => format!("{} ticks", ticks),
            None => "never arrives".to_owned(),
        };
        let _ = writeln!(
            &mut summary,
            "INFO:   {} ({}): {:.1} m/tick, {}",
            participant_pars.name, participant_pars.id, participant_pars.speed, ticks
        );
    }
    Ok(summary)
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // PRE-PROCESSING ------------------------------------------------------------------------------
    // get simulation options from the command line arguments
    let sim_opts: SimOpts = SimOpts::parse();

    if sim_opts.show_last {
        println!("{}", last_ranking_text(&sim_opts.ranking_file));
    }

    // get race parameters, either from file or interactively
    let mut race_pars = if let Some(parfile_path) = &sim_opts.parfile_path {
        info!("Reading race parameters from {:?}", parfile_path);
        read_race_pars(parfile_path)?
    } else {
        let stdin = io::stdin();
        let stdout = io::stdout();
        prompt_race_pars(&mut stdin.lock(), &mut stdout.lock())?
    };
    sim_opts.apply_timing(&mut race_pars.timing);

    print!("{}", race_summary(&race_pars)?);

    // EXECUTION -----------------------------------------------------------------------------------
    let t_start = Instant::now();
    let race_result = handle_race(&race_pars, &mut ConsoleReporter::default())?;
    info!("Execution time: {}ms", t_start.elapsed().as_millis());

    // POST-PROCESSING -----------------------------------------------------------------------------
    race_result.print_standings();

    if !sim_opts.no_save {
        match write_ranking(&sim_opts.ranking_file, &race_result) {
            Ok(()) => println!("INFO: Ranking saved to {:?}", sim_opts.ranking_file),
            Err(e) => eprintln!("WARNING: Could not save the ranking: {:#}", e),
        }
    }

    println!("\nINFO: Race over, exiting.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use racesim::core::participant::ParticipantPars;
    use racesim::core::track::TrackPars;
    use racesim::pre::race_pars::TimingPars;

    #[test]
    fn corrupt_ranking_file_is_only_a_warning() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ranking.csv");
        std::fs::write(&path, "Ranking of the passes:\nrubbish line\n").unwrap();

        let text = last_ranking_text(&path);
        assert!(text.starts_with("WARNING: Could not read the last ranking:"));
        assert!(text.contains("Failed to parse ranking file"));
    }

    #[test]
    fn missing_ranking_file() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            last_ranking_text(&dir.path().join("ranking.csv")),
            "INFO: No previous ranking found.\n"
        );
    }

    #[test]
    fn summary_lists_ticks_to_finish() {
        let race_pars = RacePars {
            track: TrackPars::default(),
            participants: vec![
                ParticipantPars {
                    id: "A1".to_owned(),
                    name: "Lightning".to_owned(),
                    speed: 30.0,
                },
                ParticipantPars {
                    id: "A2".to_owned(),
                    name: "Snail".to_owned(),
                    speed: 0.0,
                },
            ],
            timing: TimingPars::default(),
        };

        let summary = race_summary(&race_pars).unwrap();
        assert!(summary.contains("Racing 2 participants on Main Track (100.0m)"));
        assert!(summary.contains("Lightning (A1): 30.0 m/tick, 4 ticks"));
        assert!(summary.contains("Snail (A2): 0.0 m/tick, never arrives"));
    }
}
