use super::CsvTable;
use crate::utils::error::{Result, TimetableError};

/// One roster column: a course and the roll numbers sitting it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterCourse {
    pub year: u32,
    pub course: String,
    pub students: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamRoom {
    pub name: String,
    pub capacity: u32,
}

/// Reads one roster file; `year` is its 1-based upload position.
pub fn parse_roster(table: &CsvTable, year: u32) -> Vec<RosterCourse> {
    table
        .headers()
        .iter()
        .enumerate()
        .filter(|(_, header)| !super::is_blank(header))
        .filter_map(|(index, header)| {
            let students = table.column_values(index);
            if students.is_empty() {
                tracing::warn!("⚠️ Course {} in {} has no students, skipping", header, table.file());
                return None;
            }
            Some(RosterCourse {
                year,
                course: header.clone(),
                students,
            })
        })
        .collect()
}

pub fn parse_exam_rooms(table: &CsvTable) -> Result<Vec<ExamRoom>> {
    table.require_column("Room")?;
    table.require_column("Capacity")?;

    let mut rooms = Vec::with_capacity(table.len());
    for row in table.rows() {
        rooms.push(ExamRoom {
            name: row.require("Room")?.to_string(),
            capacity: row.require_number("Capacity")?,
        });
    }
    if rooms.is_empty() {
        return Err(TimetableError::invalid_input(table.file(), 1, "no rooms listed"));
    }
    Ok(rooms)
}

/// First column, header excluded.
pub fn parse_faculty_column(table: &CsvTable) -> Vec<String> {
    table.column_values(0)
}
