// Session-scoped view state over one loaded workbook.
//
// The session is a plain record with replace-on-update semantics: every
// load or sheet switch swaps in a whole new entries snapshot, and a failed
// operation leaves the previous snapshot fully intact. Consumers treat the
// snapshot as immutable and derive their views from it.

use std::collections::BTreeSet;
use std::path::Path;

use crate::analysis::{Metric, filter_by_exercise, truncate_to_sets};
use crate::error::LoadError;
use crate::normalize::{SheetSelection, build_entries};
use crate::workbook::{Workbook, read_workbook, read_workbook_bytes};
use crate::WorkoutEntry;

/// How many sets of each entry the chart views look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SetsWindow {
    #[default]
    All,
    First(usize),
}

/// State for one user session: the loaded workbook, the current entries
/// snapshot, and the active selections.
#[derive(Debug, Default)]
pub struct Session {
    workbook: Option<Workbook>,
    source_name: Option<String>,
    entries: Vec<WorkoutEntry>,
    selected_sheet: Option<SheetSelection>,
    selected_exercise: Option<String>,
    metric: Metric,
    sets_window: SetsWindow,
}

impl Session {
    pub fn new() -> Self {
        Session::default()
    }

    /// Load a workbook file, replacing any previously loaded data. Only the
    /// two common spreadsheet container formats are accepted, decided by
    /// file extension at selection time.
    pub fn load_path<P: AsRef<Path>>(&mut self, path: P) -> Result<(), LoadError> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|f| f.to_string_lossy().to_string())
            .unwrap_or_default();
        if !supported_extension(&name) {
            return Err(LoadError::Read(format!(
                "unsupported file type: {name}"
            )));
        }
        let workbook = read_workbook(path)?;
        self.install(name, workbook)
    }

    /// Load a workbook from raw bytes, e.g. a drag-and-dropped file.
    pub fn load_bytes(&mut self, name: &str, bytes: &[u8]) -> Result<(), LoadError> {
        if !supported_extension(name) {
            return Err(LoadError::Read(format!(
                "unsupported file type: {name}"
            )));
        }
        let workbook = read_workbook_bytes(bytes)?;
        self.install(name.to_string(), workbook)
    }

    fn install(&mut self, name: String, workbook: Workbook) -> Result<(), LoadError> {
        let first = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| LoadError::Read("workbook has no sheets".into()))?;
        let selection = SheetSelection::Sheet(first);
        let entries = build_entries(&workbook, &selection)?;

        log::info!("loaded {} entries from {}", entries.len(), name);
        self.workbook = Some(workbook);
        self.source_name = Some(name);
        self.selected_sheet = Some(selection);
        self.entries = entries;
        self.reconcile_exercise();
        Ok(())
    }

    /// Switch to another sheet, or to the merged view of all sheets. On
    /// failure the previous selection and entries stay in place.
    pub fn change_sheet(&mut self, selection: SheetSelection) -> Result<(), LoadError> {
        let workbook = self
            .workbook
            .as_ref()
            .ok_or_else(|| LoadError::Read("no workbook loaded".into()))?;
        let entries = build_entries(workbook, &selection)?;
        self.selected_sheet = Some(selection);
        self.entries = entries;
        self.reconcile_exercise();
        Ok(())
    }

    /// Drop the loaded workbook and all selections.
    pub fn clear(&mut self) {
        *self = Session {
            metric: self.metric,
            ..Session::default()
        };
    }

    /// Keep the selected exercise if the new snapshot still contains it,
    /// otherwise fall back to the first exercise in sorted order.
    fn reconcile_exercise(&mut self) {
        let exercises = self.unique_exercises();
        let keep = self
            .selected_exercise
            .as_ref()
            .is_some_and(|ex| exercises.iter().any(|e| e == ex));
        if !keep {
            self.selected_exercise = exercises.into_iter().next();
        }
    }

    /// Exercise names present in the current snapshot, sorted.
    pub fn unique_exercises(&self) -> Vec<String> {
        let set: BTreeSet<String> = self.entries.iter().map(|e| e.exercise.clone()).collect();
        set.into_iter().collect()
    }

    /// The normalized entries exactly as loaded.
    pub fn entries(&self) -> &[WorkoutEntry] {
        &self.entries
    }

    /// Entries as a chart view sees them: capped to the selected set
    /// window, then filtered to the selected exercise. Always freshly built
    /// so the underlying snapshot is never touched.
    pub fn processed_entries(&self) -> Vec<WorkoutEntry> {
        let truncated: Vec<WorkoutEntry> = match self.sets_window {
            SetsWindow::All => self.entries.clone(),
            SetsWindow::First(n) => self
                .entries
                .iter()
                .map(|e| truncate_to_sets(e, n))
                .collect(),
        };
        match &self.selected_exercise {
            Some(ex) => filter_by_exercise(&truncated, ex),
            None => truncated,
        }
    }

    pub fn workbook(&self) -> Option<&Workbook> {
        self.workbook.as_ref()
    }

    pub fn sheet_names(&self) -> &[String] {
        self.workbook.as_ref().map(Workbook::sheet_names).unwrap_or(&[])
    }

    pub fn source_name(&self) -> Option<&str> {
        self.source_name.as_deref()
    }

    pub fn selected_sheet(&self) -> Option<&SheetSelection> {
        self.selected_sheet.as_ref()
    }

    pub fn selected_exercise(&self) -> Option<&str> {
        self.selected_exercise.as_deref()
    }

    pub fn select_exercise(&mut self, exercise: Option<String>) {
        self.selected_exercise = exercise;
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn set_metric(&mut self, metric: Metric) {
        self.metric = metric;
    }

    pub fn sets_window(&self) -> SetsWindow {
        self.sets_window
    }

    pub fn set_sets_window(&mut self, window: SetsWindow) {
        self.sets_window = window;
    }
}

fn supported_extension(name: &str) -> bool {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    matches!(ext.as_deref(), Some("xlsx") | Some("xls"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook as XlsxBook;

    fn write_row(
        sheet: &mut rust_xlsxwriter::Worksheet,
        row: u32,
        date: &str,
        exercise: &str,
        cells: &[(u16, f64)],
    ) {
        sheet.write_string(row, 0, date).unwrap();
        sheet.write_string(row, 1, exercise).unwrap();
        for &(col, value) in cells {
            sheet.write_number(row, col, value).unwrap();
        }
    }

    fn two_sheet_book() -> Vec<u8> {
        let mut book = XlsxBook::new();

        let sheet = book.add_worksheet();
        sheet.set_name("Push").unwrap();
        for (col, header) in ["Date", "Exercise", "Set 1, kg", "Set 1, reps"]
            .iter()
            .enumerate()
        {
            sheet.write_string(0, col as u16, *header).unwrap();
        }
        write_row(sheet, 1, "2024-02-01", "Bench Press", &[(2, 80.0), (3, 10.0)]);
        write_row(sheet, 2, "2024-02-03", "Overhead Press", &[(2, 40.0), (3, 8.0)]);

        let sheet = book.add_worksheet();
        sheet.set_name("Pull").unwrap();
        for (col, header) in ["Date", "Exercise", "Sets", "Reps", "Weight"]
            .iter()
            .enumerate()
        {
            sheet.write_string(0, col as u16, *header).unwrap();
        }
        write_row(sheet, 1, "2024-02-02", "Deadlift", &[(2, 3.0), (3, 15.0), (4, 120.0)]);

        book.save_to_buffer().unwrap()
    }

    #[test]
    fn load_selects_first_sheet_and_an_exercise() {
        let mut session = Session::new();
        session.load_bytes("log.xlsx", &two_sheet_book()).unwrap();

        assert_eq!(session.sheet_names(), ["Push", "Pull"]);
        assert_eq!(
            session.selected_sheet(),
            Some(&SheetSelection::Sheet("Push".into()))
        );
        assert_eq!(session.entries().len(), 2);
        // Sorted fallback: "Bench Press" < "Overhead Press".
        assert_eq!(session.selected_exercise(), Some("Bench Press"));
        assert_eq!(session.source_name(), Some("log.xlsx"));
    }

    #[test]
    fn change_sheet_to_merge_all_orders_by_date() {
        let mut session = Session::new();
        session.load_bytes("log.xlsx", &two_sheet_book()).unwrap();
        session.change_sheet(SheetSelection::All).unwrap();

        let dates: Vec<&str> = session.entries().iter().map(|e| e.date.as_str()).collect();
        assert_eq!(dates, ["2024-02-01", "2024-02-02", "2024-02-03"]);
    }

    #[test]
    fn missing_sheet_leaves_state_untouched() {
        let mut session = Session::new();
        session.load_bytes("log.xlsx", &two_sheet_book()).unwrap();
        session.select_exercise(Some("Overhead Press".into()));

        let err = session
            .change_sheet(SheetSelection::Sheet("Legs".into()))
            .unwrap_err();
        assert!(matches!(err, LoadError::SheetNotFound(_)));
        assert_eq!(
            session.selected_sheet(),
            Some(&SheetSelection::Sheet("Push".into()))
        );
        assert_eq!(session.entries().len(), 2);
        assert_eq!(session.selected_exercise(), Some("Overhead Press"));
    }

    #[test]
    fn selection_survives_sheet_switch_when_exercise_remains() {
        let mut session = Session::new();
        session.load_bytes("log.xlsx", &two_sheet_book()).unwrap();
        session.select_exercise(Some("Overhead Press".into()));

        session.change_sheet(SheetSelection::All).unwrap();
        assert_eq!(session.selected_exercise(), Some("Overhead Press"));

        session
            .change_sheet(SheetSelection::Sheet("Pull".into()))
            .unwrap();
        // Gone from the new snapshot: falls back to the sorted first.
        assert_eq!(session.selected_exercise(), Some("Deadlift"));
    }

    #[test]
    fn rejects_unsupported_extensions() {
        let mut session = Session::new();
        let err = session.load_bytes("log.csv", &two_sheet_book()).unwrap_err();
        assert!(matches!(err, LoadError::Read(_)));
        assert!(session.workbook().is_none());
    }

    #[test]
    fn processed_entries_truncate_then_filter() {
        let mut book = XlsxBook::new();
        let sheet = book.add_worksheet();
        sheet.set_name("Log").unwrap();
        for (col, header) in [
            "Date",
            "Exercise",
            "Set 1, kg",
            "Set 1, reps",
            "Set 2, kg",
            "Set 2, reps",
        ]
        .iter()
        .enumerate()
        {
            sheet.write_string(0, col as u16, *header).unwrap();
        }
        write_row(
            sheet,
            1,
            "2024-02-01",
            "Bench Press",
            &[(2, 80.0), (3, 10.0), (4, 80.0), (5, 8.0)],
        );
        write_row(sheet, 2, "2024-02-01", "Squat", &[(2, 100.0), (3, 5.0)]);
        let bytes = book.save_to_buffer().unwrap();

        let mut session = Session::new();
        session.load_bytes("log.xlsx", &bytes).unwrap();
        session.select_exercise(Some("Bench Press".into()));
        session.set_sets_window(SetsWindow::First(1));

        let processed = session.processed_entries();
        assert_eq!(processed.len(), 1);
        assert_eq!(processed[0].sets, 1);
        assert_eq!(processed[0].reps, 10);
        assert_eq!(processed[0].volume, 800.0);
        // The snapshot itself is untouched.
        assert_eq!(session.entries()[0].sets, 2);
    }

    #[test]
    fn clear_resets_everything_but_the_metric() {
        let mut session = Session::new();
        session.load_bytes("log.xlsx", &two_sheet_book()).unwrap();
        session.set_metric(Metric::Reps);
        session.clear();

        assert!(session.workbook().is_none());
        assert!(session.entries().is_empty());
        assert_eq!(session.selected_sheet(), None);
        assert_eq!(session.selected_exercise(), None);
        assert_eq!(session.metric(), Metric::Reps);
    }
}
