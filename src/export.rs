// Saving normalized entries and derived aggregates to CSV or JSON.

use serde::Serialize;
use std::io::Write;
use std::path::Path;

use crate::WorkoutEntry;
use crate::analysis::{AnalyticsData, ExerciseStats};

pub fn write_json<T: Serialize + ?Sized, P: AsRef<Path>>(
    value: &T,
    path: P,
) -> std::io::Result<()> {
    let file = std::fs::File::create(path)?;
    serde_json::to_writer_pretty(file, value).map_err(std::io::Error::other)
}

pub fn write_csv<T: Serialize>(writer: impl Write, records: &[T]) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for r in records {
        wtr.serialize(r)?;
    }
    wtr.flush().map_err(Into::into)
}

/// Entries as flat CSV rows. The per-set details do not fit a flat row and
/// are left to the JSON export.
pub fn save_entries_csv<P: AsRef<Path>>(path: P, entries: &[WorkoutEntry]) -> csv::Result<()> {
    #[derive(Serialize)]
    struct Row<'a> {
        date: &'a str,
        exercise: &'a str,
        sets: u32,
        reps: u32,
        weight: f32,
        volume: f32,
    }
    let rows: Vec<Row> = entries
        .iter()
        .map(|e| Row {
            date: &e.date,
            exercise: &e.exercise,
            sets: e.sets,
            reps: e.reps,
            weight: e.weight,
            volume: e.volume,
        })
        .collect();
    write_csv(std::fs::File::create(path)?, &rows)
}

pub fn save_entries_json<P: AsRef<Path>>(path: P, entries: &[WorkoutEntry]) -> std::io::Result<()> {
    write_json(entries, path)
}

pub fn save_analytics_csv<P: AsRef<Path>>(path: P, data: &[AnalyticsData]) -> csv::Result<()> {
    #[derive(Serialize)]
    struct Row<'a> {
        date: &'a str,
        total_volume: f32,
        total_reps: u32,
        max_weight: f32,
        workouts_count: usize,
    }
    let rows: Vec<Row> = data
        .iter()
        .map(|d| Row {
            date: &d.date,
            total_volume: d.total_volume,
            total_reps: d.total_reps,
            max_weight: d.max_weight,
            workouts_count: d.workouts_count,
        })
        .collect();
    write_csv(std::fs::File::create(path)?, &rows)
}

pub fn save_analytics_json<P: AsRef<Path>>(path: P, data: &[AnalyticsData]) -> std::io::Result<()> {
    write_json(data, path)
}

pub fn save_exercise_stats_csv<P: AsRef<Path>>(
    path: P,
    stats: &[ExerciseStats],
) -> csv::Result<()> {
    #[derive(Serialize)]
    struct Row<'a> {
        exercise: &'a str,
        max_weight: f32,
        avg_weight: f32,
        total_volume: f32,
        entries: usize,
    }
    let rows: Vec<Row> = stats
        .iter()
        .map(|s| Row {
            exercise: &s.exercise,
            max_weight: s.max_weight,
            avg_weight: s.avg_weight,
            total_volume: s.total_volume,
            entries: s.data.len(),
        })
        .collect();
    write_csv(std::fs::File::create(path)?, &rows)
}

pub fn save_exercise_stats_json<P: AsRef<Path>>(
    path: P,
    stats: &[ExerciseStats],
) -> std::io::Result<()> {
    write_json(stats, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RawSet;
    use crate::analysis::group_by_date;

    fn entries() -> Vec<WorkoutEntry> {
        vec![
            WorkoutEntry {
                date: "2024-01-01".into(),
                exercise: "Squat".into(),
                sets: 2,
                reps: 10,
                weight: 100.0,
                volume: 1000.0,
                details: vec![
                    RawSet { set_number: 1, weight: 100.0, reps: 5 },
                    RawSet { set_number: 2, weight: 100.0, reps: 5 },
                ],
            },
            WorkoutEntry {
                date: "2024-01-02".into(),
                exercise: "Bench".into(),
                sets: 1,
                reps: 8,
                weight: 60.0,
                volume: 480.0,
                details: Vec::new(),
            },
        ]
    }

    #[test]
    fn entries_json_round_trips_with_details() {
        let file = tempfile::NamedTempFile::new().unwrap();
        save_entries_json(file.path(), &entries()).unwrap();

        let data = std::fs::read_to_string(file.path()).unwrap();
        let loaded: Vec<WorkoutEntry> = serde_json::from_str(&data).unwrap();
        assert_eq!(loaded, entries());
    }

    #[test]
    fn entries_csv_is_flat() {
        let file = tempfile::NamedTempFile::new().unwrap();
        save_entries_csv(file.path(), &entries()).unwrap();

        let data = std::fs::read_to_string(file.path()).unwrap();
        let mut lines = data.lines();
        assert_eq!(
            lines.next(),
            Some("date,exercise,sets,reps,weight,volume")
        );
        assert_eq!(lines.next(), Some("2024-01-01,Squat,2,10,100.0,1000.0"));
    }

    #[test]
    fn analytics_csv_has_one_row_per_date() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let data = group_by_date(&entries());
        save_analytics_csv(file.path(), &data).unwrap();

        let text = std::fs::read_to_string(file.path()).unwrap();
        assert_eq!(text.lines().count(), 1 + data.len());
    }
}
