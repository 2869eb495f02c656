use super::{parse_count, split_list, CsvTable};
use crate::domain::model::{Course, ElectiveBasket, Room, RoomKind};
use crate::utils::error::Result;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

pub const COURSES_FILE: &str = "combined.csv";
pub const ROOMS_FILE: &str = "rooms.csv";
pub const ELECTIVES_FILE: &str = "elective.csv";

const DEFAULT_ROOM_CAPACITY: u32 = 60;
const DEFAULT_ELECTIVE_COUNT: u32 = 60;

static SEMESTER_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(\d+)\s*(?:st|nd|rd|th)\s*(?:\(\s*(b\d+)\s*\))?")
        .expect("semester tag pattern is valid")
});

/// Semesters that carry electives, with the basket labels each one accepts.
/// An empty list means a single unlabelled basket.
const ELECTIVE_SEMESTERS: [(u32, &[&str]); 4] = [
    (1, &[]),
    (3, &[]),
    (5, &["B1", "B2"]),
    (7, &["B1", "B2", "B3", "B4"]),
];

#[derive(Debug, Clone, Default)]
pub struct ClassInputs {
    pub courses: Vec<Course>,
    pub rooms: Vec<Room>,
    pub baskets: Vec<ElectiveBasket>,
}

pub fn parse_courses(table: &CsvTable) -> Result<Vec<Course>> {
    for column in ["Department", "Semester", "Course Code"] {
        table.require_column(column)?;
    }

    let mut courses = Vec::with_capacity(table.len());
    for row in table.rows() {
        let yes = |column: &str| {
            row.get(column)
                .map(|v| v.trim().eq_ignore_ascii_case("yes"))
        };

        courses.push(Course {
            department: row.require("Department")?.to_string(),
            semester: row.require_number("Semester")?,
            code: row.require("Course Code")?.to_string(),
            name: row.get("Course Name").unwrap_or_default().to_string(),
            lecture_hours: row.number("L")?.unwrap_or(0),
            tutorial_hours: row.number("T")?.unwrap_or(0),
            lab_hours: row.number("P")?.unwrap_or(0),
            self_study_hours: row.number("S")?.unwrap_or(0),
            faculty: row.get("Faculty").unwrap_or_default().to_string(),
            // blank Schedule means yes
            schedule: yes("Schedule").unwrap_or(true),
            auditorium: yes("240").unwrap_or(false),
            students: row.number("Students")?,
        });
    }

    tracing::info!("📚 Loaded {} course rows from {}", courses.len(), table.file());
    Ok(courses)
}

pub fn parse_rooms(table: &CsvTable) -> Result<Vec<Room>> {
    table.require_column("roomNumber")?;
    table.require_column("type")?;

    let mut rooms = Vec::with_capacity(table.len());
    for row in table.rows() {
        let number = row.require("roomNumber")?.to_string();
        let raw_kind = row.get("type").unwrap_or_default();
        let Some(kind) = RoomKind::parse(raw_kind) else {
            tracing::warn!("⚠️ Skipping room {} with unknown type '{}'", number, raw_kind);
            continue;
        };
        rooms.push(Room {
            number,
            kind,
            capacity: row.number("capacity")?.unwrap_or(DEFAULT_ROOM_CAPACITY),
        });
    }

    tracing::info!("🏫 Loaded {} rooms from {}", rooms.len(), table.file());
    Ok(rooms)
}

/// Reads the semester tag of an elective row into (semester, basket label).
/// Only `1st`, `3rd`, `5th(B1..B2)` and `7th(B1..B4)` are known; anything
/// else is `None`.
pub fn parse_semester_tag(tag: &str) -> Option<(u32, String)> {
    let caps = SEMESTER_TAG.captures(tag)?;
    let semester: u32 = caps.get(1)?.as_str().parse().ok()?;
    let label = caps.get(2).map(|m| m.as_str().to_ascii_uppercase());

    let (_, labels) = ELECTIVE_SEMESTERS.iter().find(|(s, _)| *s == semester)?;
    match label {
        None if labels.is_empty() => Some((semester, "ELECTIVE".to_string())),
        Some(label) if labels.contains(&label.as_str()) => Some((semester, label)),
        _ => None,
    }
}

/// Columns are positional: tag, electives, faculty, N, counts.
pub fn parse_electives(table: &CsvTable) -> Vec<ElectiveBasket> {
    let mut baskets: BTreeMap<(u32, String), ElectiveBasket> = BTreeMap::new();

    for row in table.rows() {
        let tag = row.at(0).unwrap_or_default();
        let Some((semester, label)) = parse_semester_tag(tag) else {
            tracing::debug!("Skipping elective row {} with tag '{}'", row.line(), tag);
            continue;
        };

        let electives = split_list(row.at(1).unwrap_or_default(), ',');
        let faculty = split_list(row.at(2).unwrap_or_default(), ',');
        let rooms_per_slot = row.at(3).and_then(parse_count).unwrap_or(1);

        let mut counts: Vec<u32> = split_list(row.at(4).unwrap_or_default(), ',')
            .iter()
            .map(|c| parse_count(c).unwrap_or(DEFAULT_ELECTIVE_COUNT))
            .collect();
        if counts.len() < electives.len() {
            counts.resize(electives.len(), DEFAULT_ELECTIVE_COUNT);
        }

        baskets.insert(
            (semester, label.clone()),
            ElectiveBasket {
                semester,
                label,
                electives,
                faculty,
                rooms_per_slot,
                counts,
            },
        );
    }

    tracing::info!("🧺 Loaded {} elective baskets from {}", baskets.len(), table.file());
    baskets.into_values().collect()
}
