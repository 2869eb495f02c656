//! Exam seating: packs whole courses into dated Morning/Evening slots across
//! room divisions.

use crate::domain::model::{year_label, ExamSlot, Sheet};
use crate::ingest::seating_inputs::{ExamRoom, RosterCourse};
use crate::utils::error::{Result, TimetableError};
use crate::utils::validation::{self, Validate};
use chrono::{Days, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub const DEFAULT_SPECIAL_ROOM_PATTERN: &str = "^C40[3-8]";
pub const SCHEDULE_FILE: &str = "exam_schedule.csv";
pub const CONFIG_FILE: &str = "configurations.json";
pub const UNSCHEDULED_FILE: &str = "unscheduled_courses.csv";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatingParams {
    pub start_date: NaiveDate,
    pub courses_per_room: usize,
    pub special_room_pattern: String,
}

impl SeatingParams {
    pub fn new(start_date: NaiveDate, courses_per_room: usize) -> Self {
        Self {
            start_date,
            courses_per_room,
            special_room_pattern: DEFAULT_SPECIAL_ROOM_PATTERN.to_string(),
        }
    }

    fn special_rooms(&self) -> Result<Regex> {
        Regex::new(&self.special_room_pattern).map_err(|e| TimetableError::InvalidConfigValueError {
            field: "special_room_pattern".to_string(),
            value: self.special_room_pattern.clone(),
            reason: e.to_string(),
        })
    }
}

impl Validate for SeatingParams {
    fn validate(&self) -> Result<()> {
        validation::validate_positive_number("courses_per_room", self.courses_per_room, 1)?;
        self.special_rooms()?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatingRow {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Slot")]
    pub slot: ExamSlot,
    #[serde(rename = "Room")]
    pub room: String,
    #[serde(rename = "Course")]
    pub course: String,
    #[serde(rename = "Year")]
    pub year: String,
    #[serde(rename = "Faculty")]
    pub faculty: String,
    #[serde(rename = "Student Count")]
    pub student_count: usize,
    #[serde(rename = "Roll Numbers")]
    pub roll_numbers: String,
}

impl SeatingRow {
    /// Room name without the division suffix.
    pub fn base_room(&self) -> &str {
        self.room.split(" (").next().unwrap_or(&self.room)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnscheduledExam {
    #[serde(rename = "Course")]
    pub course: String,
    #[serde(rename = "Year")]
    pub year: String,
    #[serde(rename = "Student Count")]
    pub student_count: usize,
    #[serde(rename = "Students")]
    pub students: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatingConfig {
    pub max_students_per_slot: usize,
    pub courses_per_room: usize,
    pub start_date: String,
    pub generated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatingPlan {
    pub rows: Vec<SeatingRow>,
    pub unscheduled: Vec<UnscheduledExam>,
    pub config: SeatingConfig,
    /// Date/slot/room groups whose course count differs from courses_per_room.
    pub violations: Vec<String>,
}

impl SeatingPlan {
    pub fn schedule_sheet(&self) -> Sheet {
        let columns = [
            "Date",
            "Slot",
            "Room",
            "Course",
            "Year",
            "Faculty",
            "Student Count",
            "Roll Numbers",
        ];
        let mut sheet = Sheet::new("Exam Schedule", columns.iter().map(|c| c.to_string()).collect());
        for row in &self.rows {
            sheet.push_row(vec![
                row.date.to_string(),
                row.slot.to_string(),
                row.room.clone(),
                row.course.clone(),
                row.year.clone(),
                row.faculty.clone(),
                row.student_count.to_string(),
                row.roll_numbers.clone(),
            ]);
        }
        sheet
    }

    pub fn unscheduled_sheet(&self) -> Sheet {
        let columns = ["Course", "Year", "Student Count", "Students"];
        let mut sheet = Sheet::new("Unscheduled Courses", columns.iter().map(|c| c.to_string()).collect());
        for course in &self.unscheduled {
            sheet.push_row(vec![
                course.course.clone(),
                course.year.clone(),
                course.student_count.to_string(),
                course.students.join(", "),
            ]);
        }
        sheet
    }

    pub fn scheduled_courses(&self) -> usize {
        let mut courses: Vec<&str> = self.rows.iter().map(|r| r.course.as_str()).collect();
        courses.sort_unstable();
        courses.dedup();
        courses.len()
    }
}

struct Division {
    name: String,
    special: bool,
    capacity: usize,
}

/// Walks Morning, Evening, then the next day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct SlotCursor {
    date: NaiveDate,
    slot: ExamSlot,
}

impl SlotCursor {
    fn advance(&mut self) -> Result<()> {
        match self.slot {
            ExamSlot::Morning => self.slot = ExamSlot::Evening,
            ExamSlot::Evening => {
                self.slot = ExamSlot::Morning;
                self.date = self
                    .date
                    .checked_add_days(Days::new(1))
                    .ok_or_else(|| TimetableError::processing("exam dates ran past the calendar"))?;
            }
        }
        Ok(())
    }
}

pub fn generate(
    courses: &[RosterCourse],
    rooms: &[ExamRoom],
    faculty: &[String],
    params: &SeatingParams,
) -> Result<SeatingPlan> {
    params.validate()?;
    if rooms.is_empty() {
        return Err(TimetableError::ValidationError {
            message: "at least one exam room is required".to_string(),
        });
    }

    let special = params.special_rooms()?;
    let per_room = params.courses_per_room;

    let divisions: Vec<Division> = rooms
        .iter()
        .map(|room| {
            let is_special = special.is_match(room.name.trim());
            let capacity = if is_special {
                room.capacity as usize / per_room
            } else {
                room.capacity as usize
            };
            Division {
                name: room.name.clone(),
                special: is_special,
                capacity,
            }
        })
        .collect();

    let max_students_per_slot = rooms
        .iter()
        .zip(&divisions)
        .map(|(room, d)| {
            let capacity = room.capacity as usize;
            if d.special {
                capacity
            } else {
                capacity.saturating_mul(per_room)
            }
        })
        .fold(0usize, usize::saturating_add);

    let config = SeatingConfig {
        max_students_per_slot,
        courses_per_room: per_room,
        start_date: params.start_date.to_string(),
        generated_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
    };
    tracing::info!(
        "✓ Seating capacity: {} students per slot, {} courses per room",
        max_students_per_slot,
        per_room
    );

    // 每間教室固定一位監考老師
    let room_faculty: Vec<String> = if faculty.is_empty() {
        tracing::warn!("⚠️ No faculty listed, rooms get TBD");
        vec!["TBD".to_string(); rooms.len()]
    } else {
        (0..rooms.len()).map(|i| faculty[i % faculty.len()].clone()).collect()
    };

    let empty_slot_capacity: usize = divisions.iter().map(|d| d.capacity).sum();

    let mut ordered: Vec<&RosterCourse> = courses.iter().collect();
    ordered.sort_by_key(|c| c.year);

    let mut usage: HashMap<SlotCursor, Vec<usize>> = HashMap::new();
    let mut cursor = SlotCursor {
        date: params.start_date,
        slot: ExamSlot::Morning,
    };
    let mut rows = Vec::new();
    let mut unscheduled = Vec::new();

    for course in ordered {
        let needed = course.students.len();
        if needed == 0 {
            continue;
        }
        let year = year_label(course.year);

        if needed > empty_slot_capacity {
            tracing::warn!(
                "❌ {} ({}) has {} students but a slot seats at most {}",
                course.course,
                year,
                needed,
                empty_slot_capacity
            );
            unscheduled.push(UnscheduledExam {
                course: course.course.clone(),
                year,
                student_count: needed,
                students: course.students.clone(),
            });
            continue;
        }

        loop {
            let used = usage
                .entry(cursor)
                .or_insert_with(|| vec![0; divisions.len()]);
            let available: usize = divisions
                .iter()
                .zip(used.iter())
                .filter(|(_, u)| **u < per_room)
                .map(|(d, _)| d.capacity)
                .sum();
            if available < needed {
                cursor.advance()?;
                continue;
            }

            let mut assigned = 0;
            for (index, division) in divisions.iter().enumerate() {
                if assigned >= needed {
                    break;
                }
                if used[index] >= per_room || division.capacity == 0 {
                    continue;
                }
                let take = division.capacity.min(needed - assigned);
                let number = used[index] + 1;
                let label = if division.special { "Division" } else { "Section" };

                rows.push(SeatingRow {
                    date: cursor.date,
                    slot: cursor.slot,
                    room: format!("{} ({} {}/{})", division.name, label, number, per_room),
                    course: course.course.clone(),
                    year: year.clone(),
                    faculty: room_faculty[index].clone(),
                    student_count: take,
                    roll_numbers: course.students[assigned..assigned + take].join(", "),
                });
                used[index] += 1;
                assigned += take;
            }
            break;
        }
    }

    rows.sort_by(|a, b| {
        (a.date, a.slot, &a.room).cmp(&(b.date, b.slot, &b.room))
    });

    let violations = verify(&rows, per_room);
    tracing::info!(
        "✓ Seating: {} rows, {} unscheduled courses, {} room-count deviations",
        rows.len(),
        unscheduled.len(),
        violations.len()
    );

    Ok(SeatingPlan {
        rows,
        unscheduled,
        config,
        violations,
    })
}

/// Lists every date/slot/room whose course count is not `courses_per_room`.
pub fn verify(rows: &[SeatingRow], courses_per_room: usize) -> Vec<String> {
    let mut counts: BTreeMap<(NaiveDate, ExamSlot, &str), usize> = BTreeMap::new();
    for row in rows {
        *counts.entry((row.date, row.slot, row.base_room())).or_default() += 1;
    }
    counts
        .into_iter()
        .filter(|(_, count)| *count != courses_per_room)
        .map(|((date, slot, room), count)| {
            format!(
                "{} {} {}: {} courses (expected {})",
                date, slot, room, count, courses_per_room
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, d).unwrap()
    }

    fn roster(year: u32, course: &str, size: usize) -> RosterCourse {
        RosterCourse {
            year,
            course: course.to_string(),
            students: (0..size).map(|i| format!("{}{:03}", course, i)).collect(),
        }
    }

    fn room(name: &str, capacity: u32) -> ExamRoom {
        ExamRoom {
            name: name.to_string(),
            capacity,
        }
    }

    #[test]
    fn test_special_rooms_split_capacity() {
        let rooms = vec![room("C403", 60), room("L101", 40)];
        let courses = vec![roster(1, "CS101", 30), roster(1, "MA101", 30)];
        let plan = generate(&courses, &rooms, &["Dr. A".to_string()], &SeatingParams::new(date(3), 2)).unwrap();

        // C403 counts once, L101 twice
        assert_eq!(plan.config.max_students_per_slot, 60 + 80);
        assert!(plan.unscheduled.is_empty());
        assert!(plan.rows.iter().all(|r| r.date == date(3) && r.slot == ExamSlot::Morning));

        let cs: Vec<&SeatingRow> = plan.rows.iter().filter(|r| r.course == "CS101").collect();
        assert_eq!(cs.len(), 1);
        assert_eq!(cs[0].room, "C403 (Division 1/2)");
        let ma: Vec<&SeatingRow> = plan.rows.iter().filter(|r| r.course == "MA101").collect();
        assert_eq!(ma[0].room, "C403 (Division 2/2)");
    }

    #[test]
    fn test_slot_capacity_saturates() {
        let rooms = vec![room("L101", u32::MAX), room("L102", u32::MAX)];
        let courses = vec![roster(1, "CS101", 30)];
        let plan = generate(&courses, &rooms, &[], &SeatingParams::new(date(3), usize::MAX)).unwrap();

        assert_eq!(plan.config.max_students_per_slot, usize::MAX);
        assert_eq!(plan.rows.len(), 1);
        assert_eq!(plan.rows[0].student_count, 30);
    }

    #[test]
    fn test_courses_stay_whole_and_move_forward() {
        let rooms = vec![room("L101", 50), room("L102", 50)];
        let courses = vec![
            roster(2, "EC201", 90),
            roster(1, "CS101", 60),
            roster(1, "MA101", 70),
        ];
        let plan = generate(&courses, &rooms, &[], &SeatingParams::new(date(3), 1)).unwrap();

        let mut seen: HashMap<&str, (NaiveDate, ExamSlot, usize)> = HashMap::new();
        for row in &plan.rows {
            let entry = seen.entry(&row.course).or_insert((row.date, row.slot, 0));
            assert_eq!((entry.0, entry.1), (row.date, row.slot), "{} split across slots", row.course);
            entry.2 += row.student_count;
            assert_eq!(row.faculty, "TBD");
        }
        assert_eq!(seen["CS101"], (date(3), ExamSlot::Morning, 60));
        assert_eq!(seen["MA101"], (date(3), ExamSlot::Evening, 70));
        assert_eq!(seen["EC201"], (date(4), ExamSlot::Morning, 90));

        let mut divisions = HashSet::new();
        for row in &plan.rows {
            assert!(divisions.insert((row.date, row.slot, row.room.clone())));
        }
    }

    #[test]
    fn test_oversize_course_is_unscheduled() {
        let rooms = vec![room("L101", 30)];
        let courses = vec![roster(1, "BIG", 100), roster(1, "SMALL", 20)];
        let plan = generate(&courses, &rooms, &["Dr. A".to_string()], &SeatingParams::new(date(3), 2)).unwrap();

        assert_eq!(plan.unscheduled.len(), 1);
        assert_eq!(plan.unscheduled[0].course, "BIG");
        assert_eq!(plan.unscheduled[0].year, "1st Year");
        assert_eq!(plan.scheduled_courses(), 1);
        assert_eq!(plan.unscheduled_sheet().rows[0][2], "100");
    }

    #[test]
    fn test_verification_flags_half_used_rooms() {
        let rooms = vec![room("L101", 40), room("L102", 40)];
        let courses = vec![roster(1, "CS101", 30)];
        let plan = generate(&courses, &rooms, &["Dr. A".to_string(), "Dr. B".to_string()], &SeatingParams::new(date(3), 2)).unwrap();

        assert_eq!(plan.violations, vec!["2025-11-03 Morning L101: 1 courses (expected 2)"]);
        assert_eq!(plan.rows[0].faculty, "Dr. A");
    }

    #[test]
    fn test_rows_sorted_by_date_slot_room() {
        let rooms = vec![room("L102", 20), room("L101", 20)];
        let courses = vec![roster(1, "A", 40), roster(1, "B", 40), roster(1, "C", 40)];
        let plan = generate(&courses, &rooms, &[], &SeatingParams::new(date(3), 1)).unwrap();

        let keys: Vec<(NaiveDate, ExamSlot, String)> =
            plan.rows.iter().map(|r| (r.date, r.slot, r.room.clone())).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
        assert_eq!(plan.rows[0].room, "L101 (Section 1/1)");
        assert_eq!(plan.rows.last().unwrap().date, date(4));
    }

    #[test]
    fn test_params_validation() {
        assert!(SeatingParams::new(date(3), 0).validate().is_err());
        let mut params = SeatingParams::new(date(3), 2);
        params.special_room_pattern = "(".to_string();
        assert!(params.validate().is_err());
    }
}
