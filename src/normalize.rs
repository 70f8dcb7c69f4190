// Turning raw sheet grids into typed workout entries.

use chrono::{Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

use crate::error::LoadError;
use crate::workbook::{Cell, SheetGrid, Workbook, serial_to_date};
use crate::{RawSet, WorkoutEntry};

/// Sheet picker for [`build_entries`]: one sheet by name, or every sheet
/// merged into a single chronological sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetSelection {
    All,
    Sheet(String),
}

static SET_REPS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)Set (\d+), reps").unwrap());
static SET_KG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)Set (\d+), kg").unwrap());

/// Where a fixed field's data lives, ranked by header spelling. The
/// capitalized header wins over the lowercase one when both exist; a blank
/// cell falls through to the next candidate.
#[derive(Debug, Default)]
struct FieldColumn {
    candidates: Vec<(usize, usize)>, // (rank, column index)
}

impl FieldColumn {
    fn note(&mut self, rank: usize, idx: usize) {
        self.candidates.push((rank, idx));
        self.candidates.sort_unstable();
    }

    fn cell<'a>(&self, row: &'a [Cell]) -> Option<&'a Cell> {
        self.candidates.iter().find_map(|&(_, idx)| match row.get(idx) {
            None | Some(Cell::Empty) => None,
            Some(Cell::Text(s)) if s.trim().is_empty() => None,
            Some(cell) => Some(cell),
        })
    }

    fn number(&self, row: &[Cell]) -> Option<f64> {
        self.cell(row).and_then(Cell::as_number)
    }
}

/// Classification of a sheet's header row, built once per sheet so row
/// folding never re-scans column names.
#[derive(Debug, Default)]
struct SheetSchema {
    date: FieldColumn,
    exercise: FieldColumn,
    sets: FieldColumn,
    reps: FieldColumn,
    weight: FieldColumn,
    volume: FieldColumn,
    set_reps: Vec<(u32, usize)>,    // (set number, column index)
    set_weights: Vec<(u32, usize)>, // (set number, column index)
}

fn build_schema(headers: &[String]) -> SheetSchema {
    let mut schema = SheetSchema::default();
    for (idx, header) in headers.iter().enumerate() {
        let header = header.trim();
        if let Some(n) = set_number(&SET_REPS_RE, header) {
            schema.set_reps.push((n, idx));
            continue;
        }
        if let Some(n) = set_number(&SET_KG_RE, header) {
            schema.set_weights.push((n, idx));
            continue;
        }
        match header {
            "Date" => schema.date.note(0, idx),
            "date" => schema.date.note(1, idx),
            "Exercise" => schema.exercise.note(0, idx),
            "exercise" => schema.exercise.note(1, idx),
            "Sets" => schema.sets.note(0, idx),
            "sets" => schema.sets.note(1, idx),
            "Reps" => schema.reps.note(0, idx),
            "reps" => schema.reps.note(1, idx),
            "Weight" => schema.weight.note(0, idx),
            "weight" => schema.weight.note(1, idx),
            "Weight (kg)" => schema.weight.note(2, idx),
            "Tonnage, kg" => schema.volume.note(0, idx),
            "volume" => schema.volume.note(1, idx),
            _ => {}
        }
    }
    schema
}

fn set_number(re: &Regex, header: &str) -> Option<u32> {
    let n: u32 = re.captures(header)?.get(1)?.as_str().parse().ok()?;
    (n > 0).then_some(n)
}

/// Convert one sheet's grid into typed workout entries.
///
/// Rows never fail individually: missing or malformed values degrade to 0
/// or to the scalar fallback columns, and rows carrying neither an
/// identifiable exercise nor any quantifiable work are dropped as noise.
pub fn normalize_sheet(grid: &SheetGrid) -> Vec<WorkoutEntry> {
    let schema = build_schema(&grid.headers);
    let mut entries = Vec::with_capacity(grid.rows.len());
    let mut dropped = 0usize;
    for row in &grid.rows {
        match normalize_row(&schema, row) {
            Some(entry) => entries.push(entry),
            None => dropped += 1,
        }
    }
    if dropped > 0 {
        log::debug!("dropped {dropped} row(s) without exercise or work");
    }
    entries
}

#[derive(Debug, Default)]
struct SetAccum {
    weight: f32,
    reps: u32,
}

fn normalize_row(schema: &SheetSchema, row: &[Cell]) -> Option<WorkoutEntry> {
    let date = match schema.date.cell(row) {
        Some(cell) => resolve_date(cell),
        None => today(),
    };
    let exercise = schema
        .exercise
        .cell(row)
        .map(Cell::display)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "Unknown".to_string());

    let mut raw_sets: BTreeMap<u32, SetAccum> = BTreeMap::new();
    let mut total_reps = 0u32;
    let mut total_sets = 0u32;
    let mut total_weight = 0.0f32;
    let mut weights_found = 0u32;

    for &(n, idx) in &schema.set_reps {
        if let Some(v) = row.get(idx).and_then(Cell::as_number).filter(|v| *v > 0.0) {
            let reps = v as u32;
            raw_sets.entry(n).or_default().reps = reps;
            total_reps += reps;
            total_sets += 1;
        }
    }
    for &(n, idx) in &schema.set_weights {
        if let Some(v) = row.get(idx).and_then(Cell::as_number).filter(|v| *v > 0.0) {
            let weight = v as f32;
            raw_sets.entry(n).or_default().weight = weight;
            total_weight += weight;
            weights_found += 1;
        }
    }

    // BTreeMap iteration keeps details ascending by set number.
    let details: Vec<RawSet> = raw_sets
        .into_iter()
        .map(|(set_number, acc)| RawSet {
            set_number,
            weight: acc.weight,
            reps: acc.reps,
        })
        .collect();

    let sets = if total_sets > 0 {
        total_sets
    } else {
        scalar_count(schema.sets.number(row))
    };
    let reps = if total_reps > 0 {
        total_reps
    } else {
        scalar_count(schema.reps.number(row))
    };
    let weight = if weights_found > 0 {
        total_weight / weights_found as f32
    } else {
        schema.weight.number(row).map(|v| v.max(0.0) as f32).unwrap_or(0.0)
    };

    let explicit_volume = schema.volume.number(row).filter(|v| *v > 0.0);
    let calculated: f32 = details.iter().map(|s| s.weight * s.reps as f32).sum();
    let volume = match explicit_volume {
        Some(v) => v as f32,
        None if calculated > 0.0 => calculated,
        None => sets as f32 * reps as f32 * weight,
    };

    // Data-quality gate: no exercise name and no measurable work means the
    // row is noise, not a workout.
    if exercise == "Unknown" || (sets == 0 && volume <= 0.0) {
        return None;
    }

    Some(WorkoutEntry {
        date,
        exercise,
        sets,
        reps,
        weight,
        volume,
        details,
    })
}

fn scalar_count(value: Option<f64>) -> u32 {
    value.filter(|v| *v > 0.0).map(|v| v as u32).unwrap_or(0)
}

fn resolve_date(cell: &Cell) -> String {
    match cell {
        Cell::Date(d) => d.format("%Y-%m-%d").to_string(),
        // A bare number in the date column is a legacy serial date.
        Cell::Number(n) => match serial_to_date(*n) {
            Some(d) => d.format("%Y-%m-%d").to_string(),
            None => cell.display(),
        },
        _ => cell.display(),
    }
}

fn today() -> String {
    Local::now().date_naive().format("%Y-%m-%d").to_string()
}

/// Normalize one sheet, or merge every sheet of the workbook.
///
/// The merged sequence is stable-sorted ascending by parsed entry date, so
/// entries sharing a date keep sheet order then in-sheet order. Single-sheet
/// results keep original row order. A failure in any sheet aborts the whole
/// merge; partial merges are never returned.
pub fn build_entries(
    workbook: &Workbook,
    selection: &SheetSelection,
) -> Result<Vec<WorkoutEntry>, LoadError> {
    match selection {
        SheetSelection::Sheet(name) => {
            let grid = workbook
                .sheet(name)
                .ok_or_else(|| LoadError::SheetNotFound(name.clone()))?;
            Ok(normalize_sheet(grid))
        }
        SheetSelection::All => {
            let mut merged = Vec::new();
            for name in workbook.sheet_names() {
                let grid = workbook
                    .sheet(name)
                    .ok_or_else(|| LoadError::SheetNotFound(name.clone()))?;
                merged.extend(normalize_sheet(grid));
            }
            merged.sort_by_key(|e| entry_date(&e.date));
            Ok(merged)
        }
    }
}

/// Sort key for merged entries; unparseable dates group at the front.
fn entry_date(date: &str) -> NaiveDate {
    NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap_or(NaiveDate::MIN)
}
