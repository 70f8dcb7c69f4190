//! Core pipeline turning workout log spreadsheets into typed entries and
//! per-day / per-exercise analytics. Chart and UI layers consume the types
//! exported here; they are not part of this crate.

use serde::{Deserialize, Serialize};

pub mod analysis;
pub mod error;
pub mod export;
pub mod normalize;
pub mod session;
pub mod workbook;

pub use analysis::{AnalyticsData, ExerciseStats, Metric};
pub use error::LoadError;
pub use normalize::SheetSelection;
pub use session::Session;
pub use workbook::Workbook;

/// One recorded set inside a workout entry.
///
/// Created during normalization from the `Set N, kg` / `Set N, reps`
/// columns and never mutated afterwards. A side that was missing in the
/// sheet is stored as 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSet {
    pub set_number: u32,
    pub weight: f32,
    pub reps: u32,
}

/// One normalized workout record: one exercise on one date.
///
/// `weight` is the representative (average) working weight and `volume` the
/// total work done. `details` holds the individual sets in ascending
/// `set_number` order when per-set columns were present; otherwise it is
/// empty and the scalar fields carry the row's totals. Entries are built
/// once per admitted sheet row; downstream transforms return new entries
/// instead of editing these in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkoutEntry {
    pub date: String,
    pub exercise: String,
    pub sets: u32,
    pub reps: u32,
    pub weight: f32,
    pub volume: f32,
    pub details: Vec<RawSet>,
}
