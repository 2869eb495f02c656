//! Sheets rendered from a generated class timetable.

use super::class_scheduler::{split_faculty_names, ClassTimetable, SlotMark};
use crate::domain::model::{Cell, SectionTimetable, Sheet, Workbook};
use std::collections::{BTreeMap, BTreeSet};

pub const OVERVIEW_SHEET: &str = "Overview";
pub const FREE_ROOMS_SHEET: &str = "Free Rooms";
pub const UNSCHEDULED_SHEET: &str = "Unscheduled Courses";
pub const ELECTIVES_OUTPUT_SHEET: &str = "Electives Output";

// placeholders that show up in faculty fields but are not people
const NOT_A_TEACHER: [&str; 6] = ["", "BREAK", "MINOR SLOT", "NAN", "NONE", "MULTIPLE FACULTY"];

type FacultyGrid = Vec<Vec<Vec<String>>>;

pub fn elective_sheet_name(semester: u32) -> String {
    format!("Semester_{}_Electives", semester)
}

pub fn teacher_file_name(name: &str) -> String {
    let stem: String = name
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '.' { c } else { '_' })
        .collect();
    format!("{}_timetable.csv", stem)
}

fn is_teacher(name: &str) -> bool {
    let upper = name.trim().to_uppercase();
    !NOT_A_TEACHER.contains(&upper.as_str())
}

impl ClassTimetable {
    fn grid_columns(&self, first: &str) -> Vec<String> {
        std::iter::once(first.to_string())
            .chain(self.slots.iter().map(|s| s.label()))
            .collect()
    }

    fn mark_text(&self, slot: usize) -> Option<&'static str> {
        match self.marks.get(slot) {
            Some(SlotMark::Minor) => Some("Minor Slot"),
            Some(SlotMark::Break) => Some("BREAK"),
            _ => None,
        }
    }

    /// Day rows by slot columns; `cell` fills the open slots.
    fn day_grid(&self, name: impl Into<String>, mut cell: impl FnMut(usize, usize) -> String) -> Sheet {
        let mut sheet = Sheet::new(name, self.grid_columns("Day"));
        for (day, day_name) in self.days.iter().enumerate() {
            let mut row = Vec::with_capacity(self.slots.len() + 1);
            row.push(day_name.clone());
            for slot in 0..self.slots.len() {
                row.push(match self.mark_text(slot) {
                    Some(text) => text.to_string(),
                    None => cell(day, slot),
                });
            }
            sheet.push_row(row);
        }
        sheet
    }

    pub fn section_sheet(&self, grid: &SectionTimetable) -> Sheet {
        self.day_grid(grid.title(), |day, slot| {
            match grid.cells.get(day).and_then(|row| row.get(slot)) {
                Some(Cell::Start(booking)) => booking.display(),
                Some(Cell::Continued(kind)) => format!("{} (contd.)", kind),
                _ => String::new(),
            }
        })
    }

    pub fn basket_semesters(&self) -> BTreeSet<u32> {
        self.baskets.iter().map(|b| b.semester).collect()
    }

    /// Basket sessions only, one sheet per semester.
    pub fn elective_sheets(&self) -> Vec<Sheet> {
        self.basket_semesters()
            .into_iter()
            .map(|semester| {
                let mut cells = vec![vec![String::new(); self.slots.len()]; self.days.len()];
                for basket in self.baskets.iter().filter(|b| b.semester == semester) {
                    for session in &basket.sessions {
                        for (i, &slot) in session.slots.iter().enumerate() {
                            cells[session.day][slot] = if i == 0 {
                                let seats: Vec<String> = session
                                    .seats
                                    .iter()
                                    .map(|s| format!("{} Room: {} ({})", s.code, s.room, s.faculty))
                                    .collect();
                                format!("{} Course {}\n{}", basket.label, session.kind, seats.join("\n"))
                            } else {
                                format!("{} (contd.)", basket.label)
                            };
                        }
                    }
                }
                self.day_grid(elective_sheet_name(semester), |day, slot| cells[day][slot].clone())
            })
            .collect()
    }

    pub fn overview_sheet(&self) -> Sheet {
        let mut sheet = Sheet::new(
            OVERVIEW_SHEET,
            vec!["Department".to_string(), "Semester".to_string(), "Sheet Name".to_string()],
        );
        for grid in &self.sections {
            sheet.push_row(vec![grid.department.clone(), grid.semester.to_string(), grid.title()]);
        }
        for semester in self.basket_semesters() {
            sheet.push_row(vec![
                "Electives".to_string(),
                semester.to_string(),
                elective_sheet_name(semester),
            ]);
        }
        sheet.push_row(vec![
            FREE_ROOMS_SHEET.to_string(),
            "All".to_string(),
            FREE_ROOMS_SHEET.to_string(),
        ]);
        sheet
    }

    /// teacher -> [day][slot] -> entries like `CS301 LEC (CSE_3_A) Room: C101`.
    fn faculty_grids(&self) -> BTreeMap<String, FacultyGrid> {
        let mut grids: BTreeMap<String, FacultyGrid> = BTreeMap::new();
        let (days, slots) = (self.days.len(), self.slots.len());

        for grid in &self.sections {
            let title = grid.title();
            for session in grid.sessions() {
                let booking = session.booking;
                let mut add = |name: &str, text: String| {
                    if !is_teacher(name) {
                        return;
                    }
                    let cells = grids
                        .entry(name.trim().to_string())
                        .or_insert_with(|| vec![vec![Vec::new(); slots]; days]);
                    for slot in session.slots() {
                        let entries = &mut cells[session.day][slot];
                        if !entries.contains(&text) {
                            entries.push(text.clone());
                        }
                    }
                };

                match &booking.basket {
                    // basket teachers see their own elective, not the basket
                    Some(label) => {
                        for seat in &booking.electives {
                            for name in split_faculty_names(&seat.faculty) {
                                let text = format!(
                                    "{} {} ({} Sem {}) Room: {}",
                                    seat.code, booking.kind, label, grid.semester, seat.room
                                );
                                add(&name, text);
                            }
                        }
                    }
                    None => {
                        let text = format!(
                            "{} {} ({}) Room: {}",
                            booking.code,
                            booking.kind,
                            title,
                            booking.rooms().join(", ")
                        );
                        for name in split_faculty_names(&booking.faculty) {
                            add(&name, text.clone());
                        }
                    }
                }
            }
        }
        grids
    }

    pub fn faculty_names(&self) -> Vec<String> {
        self.faculty_grids().into_keys().collect()
    }

    fn faculty_grid_sheet(&self, name: &str, entries: &FacultyGrid) -> Sheet {
        self.day_grid(name, |day, slot| entries[day][slot].join("\n"))
    }

    pub fn faculty_sheet(&self, name: &str) -> Option<Sheet> {
        let grids = self.faculty_grids();
        let (key, entries) = grids
            .iter()
            .find(|(teacher, _)| teacher.eq_ignore_ascii_case(name.trim()))?;
        Some(self.faculty_grid_sheet(key, entries))
    }

    pub fn faculty_sheets(&self) -> Vec<Sheet> {
        self.faculty_grids()
            .iter()
            .map(|(name, entries)| self.faculty_grid_sheet(name, entries))
            .collect()
    }

    /// One row per (day, room); morning and lunch windows read BREAK.
    pub fn free_rooms_sheet(&self) -> Sheet {
        let mut sheet = Sheet::new(FREE_ROOMS_SHEET, {
            let mut columns = self.grid_columns("Day");
            columns.insert(1, "Room".to_string());
            columns
        });
        for (day, day_name) in self.days.iter().enumerate() {
            for usage in &self.rooms {
                let mut row = vec![day_name.clone(), usage.room.clone()];
                for slot in 0..self.slots.len() {
                    let busy = usage.busy.get(day).map(|b| b.contains(&slot)).unwrap_or(false);
                    let status = if self.marks.get(slot) == Some(&SlotMark::Break) {
                        "BREAK"
                    } else if busy {
                        "OCCUPIED"
                    } else {
                        "FREE"
                    };
                    row.push(status.to_string());
                }
                sheet.push_row(row);
            }
        }
        sheet
    }

    pub fn unscheduled_sheet(&self) -> Sheet {
        let columns = ["Course Code", "Department", "Semester", "Components", "Reason"];
        let mut sheet = Sheet::new(UNSCHEDULED_SHEET, columns.iter().map(|c| c.to_string()).collect());
        for course in &self.unscheduled {
            let components: Vec<&str> = course.components.iter().map(|k| k.code()).collect();
            sheet.push_row(vec![
                course.code.clone(),
                course.department.clone(),
                course.semester.to_string(),
                components.join(", "),
                course.reasons.join("; "),
            ]);
        }
        sheet
    }

    pub fn electives_output_sheet(&self) -> Sheet {
        let columns = ["Semester", "Basket", "Electives", "Faculty", "N (Rooms per slot)", "Count"];
        let mut sheet = Sheet::new(ELECTIVES_OUTPUT_SHEET, columns.iter().map(|c| c.to_string()).collect());
        for basket in &self.electives {
            let counts: Vec<String> = basket.counts.iter().map(|c| c.to_string()).collect();
            sheet.push_row(vec![
                basket.semester.to_string(),
                basket.label.clone(),
                basket.electives.join(", "),
                basket.faculty.join(", "),
                basket.rooms_per_slot.to_string(),
                counts.join(", "),
            ]);
        }
        sheet
    }

    /// Overview, section grids, elective grids, free rooms and the two reports.
    pub fn workbook(&self) -> Workbook {
        let mut sheets = vec![self.overview_sheet()];
        sheets.extend(self.sections.iter().map(|grid| self.section_sheet(grid)));
        sheets.extend(self.elective_sheets());
        sheets.push(self.free_rooms_sheet());
        sheets.push(self.unscheduled_sheet());
        sheets.push(self.electives_output_sheet());
        Workbook { sheets }
    }
}
