use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "campus-timetable")]
#[command(about = "Class timetable, exam calendar and exam seating generator")]
pub struct Cli {
    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log CPU and memory usage per phase")]
    pub monitor: bool,

    #[arg(long, global = true, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run the class (5000) and exam (5001) servers until Ctrl-C
    Serve(ServeArgs),
    /// Generate class timetables for every department and semester
    Class(ClassArgs),
    /// Generate the exam calendar workbook
    ExamCalendar(ExamCalendarArgs),
    /// Generate exam seating from course rosters
    Seating(SeatingArgs),
}

#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    #[arg(long, help = "Server TOML configuration")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub struct ClassArgs {
    #[arg(long, default_value = "inputs")]
    pub inputs: PathBuf,

    #[arg(long, default_value = "outputs")]
    pub outputs: PathBuf,

    #[arg(long, default_value = "config.json")]
    pub schedule_config: PathBuf,

    #[arg(long, help = "Seed for reproducible timetables")]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Args)]
pub struct ExamCalendarArgs {
    #[arg(long, help = "Directory holding the eight calendar CSVs")]
    pub inputs: PathBuf,

    #[arg(long)]
    pub outputs: PathBuf,

    #[arg(long, value_parser = parse_date)]
    pub start: NaiveDate,

    #[arg(long, value_parser = parse_date)]
    pub end: NaiveDate,

    #[arg(long, default_value = "5")]
    pub max_credits: u32,

    #[arg(long, help = "JSON map of year -> slot -> branches")]
    pub allocation: PathBuf,

    #[arg(long, value_delimiter = ',', value_parser = parse_date)]
    pub holidays: Vec<NaiveDate>,

    #[arg(long, default_value = "48")]
    pub seats_per_room: u32,
}

#[derive(Debug, Clone, Args)]
pub struct SeatingArgs {
    /// Roster CSVs in year order (first file is year 1)
    #[arg(long, num_args = 1.., required = true)]
    pub courses: Vec<PathBuf>,

    #[arg(long)]
    pub rooms: PathBuf,

    #[arg(long)]
    pub faculty: PathBuf,

    #[arg(long, value_parser = parse_date)]
    pub start_date: NaiveDate,

    #[arg(long, default_value = "2")]
    pub courses_per_room: usize,

    #[arg(long)]
    pub outputs: PathBuf,
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {}", e))
}
