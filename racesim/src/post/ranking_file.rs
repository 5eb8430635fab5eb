use crate::post::race_result::{RaceResult, Standing};
use anyhow::Context;
use std::path::Path;

/// write_ranking saves the final standings as CSV, replacing an older ranking.
pub fn write_ranking(path: &Path, race_result: &RaceResult) -> anyhow::Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)
                .context(format!("Failed to create directory {}!", dir.display()))?;
        }
    }

    let mut csv_writer = csv::Writer::from_path(path)
        .context(format!("Failed to open ranking file {}!", path.display()))?;

    for standing in race_result.standings.iter() {
        csv_writer.serialize(standing)?;
    }
    csv_writer
        .flush()
        .context(format!("Failed to write ranking file {}!", path.display()))?;

    Ok(())
}

/// read_last_ranking reads the standings saved by the last race. Returns None if no ranking was
/// saved yet.
pub fn read_last_ranking(path: &Path) -> anyhow::Result<Option<Vec<Standing>>> {
    if !path.exists() {
        return Ok(None);
    }

    let mut csv_reader = csv::Reader::from_path(path)
        .context(format!("Failed to open ranking file {}!", path.display()))?;
    let mut standings = vec![];

    for result in csv_reader.deserialize() {
        let standing: Standing =
            result.context(format!("Failed to parse ranking file {}!", path.display()))?;
        standings.push(standing);
    }

    Ok(Some(standings))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn race_result() -> RaceResult {
        RaceResult {
            track_name: "Main Track".to_owned(),
            expected: 2,
            standings: vec![
                Standing {
                    rank: 1,
                    participant_id: "A2".to_owned(),
                    name: "Thunder, the fast".to_owned(),
                    elapsed_ms: 1001,
                },
                Standing {
                    rank: 2,
                    participant_id: "A1".to_owned(),
                    name: "Lightning".to_owned(),
                    elapsed_ms: 4012,
                },
            ],
            interrupted: false,
            halted: false,
        }
    }

    #[test]
    fn saved_ranking_can_be_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output").join("ranking.csv");

        write_ranking(&path, &race_result()).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("rank,participant_id,name,elapsed_ms\n"));

        let standings = read_last_ranking(&path).unwrap().unwrap();
        assert_eq!(standings, race_result().standings);
    }

    #[test]
    fn newer_ranking_replaces_older_one() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ranking.csv");

        write_ranking(&path, &race_result()).unwrap();
        let mut shorter = race_result();
        shorter.standings.truncate(1);
        write_ranking(&path, &shorter).unwrap();

        assert_eq!(read_last_ranking(&path).unwrap().unwrap().len(), 1);
    }

    #[test]
    fn no_ranking_yet() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_last_ranking(&dir.path().join("ranking.csv"))
            .unwrap()
            .is_none());
    }
}
