use crate::core::coordinator::RaceCoordinator;
use crate::core::start_controller::StartController;
use crate::interfaces::reporter::RaceReporter;
use crate::post::race_result::RaceResult;
use crate::pre::race_pars::RacePars;
use anyhow::Context;
use log::info;
use std::sync::Arc;
use std::thread;

/// handle_race creates the race on the basis of the inserted parameters, lets the participant
/// workers wait at the start, runs the judge on its own thread and returns the result once the
/// judge is done. All workers are stopped when this returns.
pub fn handle_race<R: RaceReporter + Send>(
    race_pars: &RacePars,
    reporter: &mut R,
) -> anyhow::Result<RaceResult> {
    let coordinator = Arc::new(
        RaceCoordinator::from_pars(race_pars).context("Failed to set up the race!")?,
    );

    let no_workers = coordinator
        .start_workers()
        .context("Failed to start the participant workers!")?;
    info!(
        "{} participants waiting at the start of {} ({:.1}m)",
        no_workers,
        coordinator.track().name,
        coordinator.track().length
    );

    let judge = match StartController::new(
        Arc::clone(&coordinator),
        race_pars.timing.countdown(),
        race_pars.timing.arrival_poll(),
    ) {
        Ok(judge) => judge,
        Err(e) => {
            coordinator.shutdown();
            return Err(e).context("Failed to set up the judge!");
        }
    };

    let race_result: anyhow::Result<RaceResult> = thread::scope(|s| {
        let judge_thread = thread::Builder::new()
            .name("judge".to_owned())
            .spawn_scoped(s, || judge.run(reporter))
            .context("Failed to spawn the judge thread!")?;

        judge_thread
            .join()
            .map_err(|_| anyhow::anyhow!("Judge thread panicked!"))?
            .context("Judge could not run the race!")
    });

    // the judge shuts the workers down itself, this covers a judge that never ran
    coordinator.shutdown();

    race_result
}
