// Loading spreadsheet containers into generic sheet grids.

use calamine::{Data, Reader, open_workbook_auto, open_workbook_auto_from_rs};
use chrono::{Duration, NaiveDate};
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;

use crate::error::LoadError;

/// Largest workbook accepted, in bytes. Inputs over this fail with
/// [`LoadError::SizeExceeded`] before any container parsing starts.
pub const MAX_WORKBOOK_BYTES: u64 = 6 * 1024 * 1024;

/// A single decoded cell. Decoding stops at the container's own typing;
/// header matching and value coercion happen during normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
    Date(NaiveDate),
    Bool(bool),
}

impl Cell {
    /// Numeric view of the cell. Loosely structured sheets often store
    /// numbers as text, so text cells are parsed too.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) if n.is_finite() => Some(*n),
            Cell::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }

    /// Display form of the cell, used for exercise names and headers.
    pub fn display(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Number(n) => format_number(*n),
            Cell::Text(s) => s.trim().to_string(),
            Cell::Date(d) => d.format("%Y-%m-%d").to_string(),
            Cell::Bool(b) => b.to_string(),
        }
    }
}

/// One sheet reduced to a column-header row plus data rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetGrid {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

/// A loaded spreadsheet: ordered sheet names plus one grid per sheet.
/// Read-only after construction; a new file replaces the whole value.
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    sheet_names: Vec<String>,
    sheets: HashMap<String, SheetGrid>,
}

impl Workbook {
    /// Assemble a workbook from already-decoded grids, keeping their order.
    pub fn from_sheets(sheets: Vec<(String, SheetGrid)>) -> Self {
        let sheet_names = sheets.iter().map(|(name, _)| name.clone()).collect();
        let sheets = sheets.into_iter().collect();
        Workbook {
            sheet_names,
            sheets,
        }
    }

    /// Sheet names in original container order.
    pub fn sheet_names(&self) -> &[String] {
        &self.sheet_names
    }

    pub fn sheet(&self, name: &str) -> Option<&SheetGrid> {
        self.sheets.get(name)
    }
}

/// Read a workbook from disk. The size gate runs before the container is
/// opened; open or I/O failures map to [`LoadError::Read`].
pub fn read_workbook<P: AsRef<Path>>(path: P) -> Result<Workbook, LoadError> {
    let path = path.as_ref();
    let actual = std::fs::metadata(path)?.len();
    if actual > MAX_WORKBOOK_BYTES {
        return Err(LoadError::SizeExceeded {
            actual,
            limit: MAX_WORKBOOK_BYTES,
        });
    }
    let mut reader = open_workbook_auto(path)?;
    collect_sheets(&mut reader)
}

/// Read a workbook from an in-memory byte buffer, e.g. a file drop.
pub fn read_workbook_bytes(bytes: &[u8]) -> Result<Workbook, LoadError> {
    let actual = bytes.len() as u64;
    if actual > MAX_WORKBOOK_BYTES {
        return Err(LoadError::SizeExceeded {
            actual,
            limit: MAX_WORKBOOK_BYTES,
        });
    }
    let mut reader = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    collect_sheets(&mut reader)
}

/// Convert a numeric spreadsheet serial date to a calendar date.
/// Serials count days from 1899-12-30; fractional time-of-day is dropped.
pub fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_signed(Duration::days(serial.trunc() as i64))
}

fn collect_sheets<RS, R>(reader: &mut R) -> Result<Workbook, LoadError>
where
    RS: std::io::Read + std::io::Seek,
    R: Reader<RS>,
    R::Error: std::fmt::Display,
{
    let sheet_names: Vec<String> = reader.sheet_names().to_vec();
    let mut sheets = HashMap::with_capacity(sheet_names.len());
    for name in &sheet_names {
        let range = reader
            .worksheet_range(name)
            .map_err(|e| LoadError::Parse {
                sheet: name.clone(),
                reason: e.to_string(),
            })?;
        sheets.insert(name.clone(), grid_from_range(&range));
    }
    log::debug!("read {} sheet(s)", sheet_names.len());
    Ok(Workbook {
        sheet_names,
        sheets,
    })
}

fn grid_from_range(range: &calamine::Range<Data>) -> SheetGrid {
    let mut rows = range.rows();
    let headers = match rows.next() {
        Some(row) => row.iter().map(|d| cell_from_data(d).display()).collect(),
        None => Vec::new(),
    };
    let rows = rows
        .map(|row| row.iter().map(cell_from_data).collect())
        .collect();
    SheetGrid { headers, rows }
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Bool(*b),
        // as_datetime already anchors serials at the 1899-12-30 epoch; the
        // calendar date comes back exact, no day offset applies.
        Data::DateTime(dt) => {
            if dt.is_duration() {
                Cell::Number(dt.as_f64())
            } else {
                match dt.as_datetime() {
                    Some(ndt) => Cell::Date(ndt.date()),
                    None => Cell::Number(dt.as_f64()),
                }
            }
        }
        Data::DateTimeIso(s) => s
            .get(..10)
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .map(Cell::Date)
            .unwrap_or_else(|| Cell::Text(s.clone())),
        Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(_) => Cell::Empty,
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{}", value)
    }
}
