use crate::core::participant::ParticipantPars;
use crate::core::track::TrackPars;
use crate::pre::race_pars::{RacePars, TimingPars};
use anyhow::Context;
use helpers::general::{non_empty_or, parse_non_negative_or, parse_or, parse_positive_or};
use std::io::{BufRead, Write};

pub const DEFAULT_NO_PARTICIPANTS: usize = 3;
pub const DEFAULT_SPEED: f64 = 5.0;
pub const DEFAULT_TRACK_LENGTH: f64 = 100.0;

fn ask<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    question: &str,
) -> anyhow::Result<String> {
    write!(output, "{}", question)?;
    output.flush()?;

    let mut line = String::new();
    input
        .read_line(&mut line)
        .context("Failed to read from input!")?;
    Ok(line)
}

/// prompt_race_pars sets up a race interactively. Invalid answers fall back to defaults instead
/// of failing: 3 participants, a speed of 5 m/s, a track of 100 m and `Car{i}` as name.
pub fn prompt_race_pars<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
) -> anyhow::Result<RacePars> {
    writeln!(output, "Car race")?;

    let no_participants = parse_or(
        &ask(input, output, "Number of participating cars: ")?,
        DEFAULT_NO_PARTICIPANTS,
    );

    let mut participants = Vec::with_capacity(no_participants);
    for i in 1..=no_participants {
        let name = non_empty_or(&ask(input, output, &format!("Name of car {}: ", i))?, || {
            format!("Car{}", i)
        });
        let speed = parse_non_negative_or(&ask(input, output, "Speed (m/s): ")?, DEFAULT_SPEED);

        participants.push(ParticipantPars {
            id: format!("A{}", i),
            name,
            speed,
        });
    }

    let length = parse_positive_or(
        &ask(input, output, "Track length (m): ")?,
        DEFAULT_TRACK_LENGTH,
    );

    Ok(RacePars {
        track: TrackPars {
            length,
            ..TrackPars::default()
        },
        participants,
        timing: TimingPars::default(),
    })
}
