//! Command line consumer of the analytics core: loads a workbook, applies
//! the sheet/exercise/set-window selections, and prints or exports the
//! resulting views.

use anyhow::Context;
use clap::Parser;
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL};
use std::path::PathBuf;

use liftsheet::analysis::{aggregate_exercise_stats, group_by_date};
use liftsheet::export::{
    save_analytics_csv, save_analytics_json, save_entries_csv, save_entries_json,
    save_exercise_stats_csv, save_exercise_stats_json,
};
use liftsheet::session::SetsWindow;
use liftsheet::{Session, SheetSelection, WorkoutEntry};

#[derive(Parser)]
#[command(name = "liftsheet", about = "Workout spreadsheet analytics", version)]
struct Cli {
    /// Workbook to load (.xlsx or .xls)
    file: PathBuf,

    /// Read one sheet by name (default: the first sheet)
    #[arg(long, value_name = "NAME", conflicts_with = "all_sheets")]
    sheet: Option<String>,

    /// Merge every sheet into one chronological sequence
    #[arg(long)]
    all_sheets: bool,

    /// Only show entries for one exercise ("All" shows everything)
    #[arg(long, value_name = "NAME")]
    exercise: Option<String>,

    /// Cap every entry to its first N sets
    #[arg(long, value_name = "N")]
    sets: Option<usize>,

    /// Print per-date aggregates instead of raw entries
    #[arg(long)]
    daily: bool,

    /// Print per-exercise aggregates instead of raw entries
    #[arg(long, conflicts_with = "daily")]
    summary: bool,

    /// Also write the printed view to a JSON file
    #[arg(long, value_name = "FILE")]
    json: Option<PathBuf>,

    /// Also write the printed view to a CSV file
    #[arg(long, value_name = "FILE")]
    csv: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut session = Session::new();
    session
        .load_path(&cli.file)
        .with_context(|| format!("loading {}", cli.file.display()))?;

    if cli.all_sheets {
        session.change_sheet(SheetSelection::All)?;
    } else if let Some(name) = &cli.sheet {
        session.change_sheet(SheetSelection::Sheet(name.clone()))?;
    }

    if let Some(n) = cli.sets {
        session.set_sets_window(SetsWindow::First(n));
    }
    // The session auto-selects an exercise on load; the CLI shows all
    // entries unless one was asked for.
    session.select_exercise(cli.exercise.clone());

    println!(
        "Loaded {} entries from {}",
        session.entries().len(),
        session.source_name().unwrap_or("workbook")
    );

    let entries = session.processed_entries();
    if cli.daily {
        let data = group_by_date(&entries);
        print_daily(&data);
        if let Some(path) = &cli.json {
            save_analytics_json(path, &data)?;
        }
        if let Some(path) = &cli.csv {
            save_analytics_csv(path, &data)?;
        }
    } else if cli.summary {
        let stats = aggregate_exercise_stats(&entries);
        print_summary(&stats);
        if let Some(path) = &cli.json {
            save_exercise_stats_json(path, &stats)?;
        }
        if let Some(path) = &cli.csv {
            save_exercise_stats_csv(path, &stats)?;
        }
    } else {
        print_entries(&entries);
        if let Some(path) = &cli.json {
            save_entries_json(path, &entries)?;
        }
        if let Some(path) = &cli.csv {
            save_entries_csv(path, &entries)?;
        }
    }

    Ok(())
}

fn base_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers.to_vec());
    table
}

fn print_entries(entries: &[WorkoutEntry]) {
    let mut table = base_table(&["Date", "Exercise", "Sets", "Reps", "Weight", "Volume"]);
    for e in entries {
        table.add_row(vec![
            e.date.clone(),
            e.exercise.clone(),
            e.sets.to_string(),
            e.reps.to_string(),
            format!("{:.1}", e.weight),
            format!("{:.1}", e.volume),
        ]);
    }
    println!("{table}");
}

fn print_daily(data: &[liftsheet::AnalyticsData]) {
    let mut table = base_table(&["Date", "Volume", "Reps", "Max weight", "Workouts"]);
    for d in data {
        table.add_row(vec![
            d.date.clone(),
            format!("{:.1}", d.total_volume),
            d.total_reps.to_string(),
            format!("{:.1}", d.max_weight),
            d.workouts_count.to_string(),
        ]);
    }
    println!("{table}");
}

fn print_summary(stats: &[liftsheet::ExerciseStats]) {
    let mut table = base_table(&["Exercise", "Max weight", "Avg weight", "Volume", "Entries"]);
    for s in stats {
        table.add_row(vec![
            s.exercise.clone(),
            format!("{:.1}", s.max_weight),
            format!("{:.1}", s.avg_weight),
            format!("{:.1}", s.total_volume),
            s.data.len().to_string(),
        ]);
    }
    println!("{table}");
}
