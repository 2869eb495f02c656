pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod ingest;
pub mod utils;
pub mod web;

pub use adapters::LocalStorage;
pub use app::pipelines::{ClassPipeline, ExamCalendarPipeline, SeatingPipeline};
pub use core::{GenerationEngine, GenerationReport, Pipeline, Storage};
pub use utils::error::{Result, TimetableError};
