pub mod class_reports;
pub mod class_scheduler;
pub mod engine;
pub mod exam_calendar;
pub mod exam_seating;

pub use crate::domain::ports::{Pipeline, Storage};
pub use crate::utils::error::Result;
pub use engine::{GenerationEngine, GenerationReport};
