// Aggregations over normalized workout entries.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::{RawSet, WorkoutEntry};

/// Rollup of every entry recorded on one date.
///
/// `metrics` is an open extension map for exercise-specific derived values;
/// it serializes flattened next to the fixed fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsData {
    pub date: String,
    pub total_volume: f32,
    pub total_reps: u32,
    pub max_weight: f32,
    pub workouts_count: usize,
    #[serde(flatten, skip_serializing_if = "BTreeMap::is_empty")]
    pub metrics: BTreeMap<String, f64>,
}

/// Aggregated statistics for a single exercise.
///
/// `avg_weight` is volume-weighted: total volume divided by the total reps
/// across the exercise's entries, not a mean of the per-entry weights.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExerciseStats {
    pub exercise: String,
    pub max_weight: f32,
    pub avg_weight: f32,
    pub total_volume: f32,
    pub data: Vec<WorkoutEntry>,
}

/// Fold entries into one [`AnalyticsData`] per distinct date string.
///
/// Dates group by exact string equality and the output comes back ascending
/// by date string, which is chronological for ISO dates. All accumulations
/// are commutative, so input order never changes the result.
pub fn group_by_date(entries: &[WorkoutEntry]) -> Vec<AnalyticsData> {
    let mut groups: BTreeMap<&str, AnalyticsData> = BTreeMap::new();
    for e in entries {
        let bucket = groups
            .entry(e.date.as_str())
            .or_insert_with(|| AnalyticsData {
                date: e.date.clone(),
                ..AnalyticsData::default()
            });
        bucket.total_volume += e.volume;
        bucket.total_reps += e.reps;
        bucket.max_weight = bucket.max_weight.max(e.weight);
        bucket.workouts_count += 1;
    }
    groups.into_values().collect()
}

/// Aggregate per-exercise statistics, one [`ExerciseStats`] per unique
/// exercise name in first-seen order.
pub fn aggregate_exercise_stats(entries: &[WorkoutEntry]) -> Vec<ExerciseStats> {
    let mut stats: Vec<ExerciseStats> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for e in entries {
        let slot = match index.get(e.exercise.as_str()) {
            Some(&i) => i,
            None => {
                index.insert(e.exercise.clone(), stats.len());
                stats.push(ExerciseStats {
                    exercise: e.exercise.clone(),
                    ..ExerciseStats::default()
                });
                stats.len() - 1
            }
        };
        let s = &mut stats[slot];
        s.max_weight = s.max_weight.max(e.weight);
        s.total_volume += e.volume;
        s.data.push(e.clone());
    }

    for s in &mut stats {
        let total_reps: u32 = s.data.iter().map(|e| e.reps).sum();
        s.avg_weight = if total_reps > 0 {
            s.total_volume / total_reps as f32
        } else {
            0.0
        };
    }
    stats
}

/// Keep only entries for `exercise`. An empty name or the `"All"` sentinel
/// returns the input unchanged.
pub fn filter_by_exercise(entries: &[WorkoutEntry], exercise: &str) -> Vec<WorkoutEntry> {
    if exercise.is_empty() || exercise == "All" {
        return entries.to_vec();
    }
    entries
        .iter()
        .filter(|e| e.exercise == exercise)
        .cloned()
        .collect()
}

/// Cap an entry to its first `n` sets, recomputing the scalar fields from
/// the truncated details. The input is never mutated; entries without more
/// than `n` details come back as plain clones, so scalar-only rows survive
/// a no-op truncation unchanged.
pub fn truncate_to_sets(entry: &WorkoutEntry, n: usize) -> WorkoutEntry {
    if entry.details.len() <= n {
        return entry.clone();
    }
    let details: Vec<RawSet> = entry.details[..n].to_vec();
    let reps: u32 = details.iter().map(|s| s.reps).sum();
    let counted: Vec<f32> = details
        .iter()
        .map(|s| s.weight)
        .filter(|w| *w > 0.0)
        .collect();
    let weight = if counted.is_empty() {
        0.0
    } else {
        counted.iter().sum::<f32>() / counted.len() as f32
    };
    let volume = details.iter().map(|s| s.weight * s.reps as f32).sum();
    WorkoutEntry {
        date: entry.date.clone(),
        exercise: entry.exercise.clone(),
        sets: details.len() as u32,
        reps,
        weight,
        volume,
        details,
    }
}

/// Which per-entry measure a time-series view plots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Metric {
    Weight,
    Volume,
    Reps,
}

impl Metric {
    pub fn value_of(self, entry: &WorkoutEntry) -> f64 {
        match self {
            Metric::Weight => entry.weight as f64,
            Metric::Volume => entry.volume as f64,
            Metric::Reps => entry.reps as f64,
        }
    }
}

impl Default for Metric {
    fn default() -> Self {
        Metric::Volume
    }
}

/// Chart-ready `[x, y]` points for one metric, with x as days from the
/// common era. Entries whose date does not parse are skipped.
pub fn metric_series(entries: &[WorkoutEntry], metric: Metric) -> Vec<[f64; 2]> {
    let mut points = Vec::with_capacity(entries.len());
    for e in entries {
        if let Ok(d) = NaiveDate::parse_from_str(&e.date, "%Y-%m-%d") {
            points.push([d.num_days_from_ce() as f64, metric.value_of(e)]);
        }
    }
    points
}
