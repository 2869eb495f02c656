//! Exam calendar: a date-by-date Morning/Evening plan per year and branch,
//! followed by room and invigilator assignment.

use crate::domain::model::{year_label, ExamSlot, Sheet, Workbook};
use crate::ingest::calendar_inputs::{normalize_year, CalendarInputs, CalendarSettings};
use crate::utils::error::{Result, TimetableError};
use crate::utils::validation::{self, Validate};
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// year -> slot -> branches allowed to sit main courses in that slot.
pub type Allocation = BTreeMap<u32, BTreeMap<ExamSlot, Vec<String>>>;

pub const MIN_CREDITS_PER_DAY: u32 = 3;
pub const MAX_CREDITS_PER_DAY: u32 = 10;
const COURSES_PER_ROOM: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarParams {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub max_credits_per_day: u32,
    pub allocation: Allocation,
    #[serde(default)]
    pub holidays: Vec<NaiveDate>,
    /// Used when Settings.csv has no SeatsPerRoom row.
    #[serde(default = "default_seats_per_room")]
    pub default_seats_per_room: u32,
}

fn default_seats_per_room() -> u32 {
    48
}

impl Validate for CalendarParams {
    fn validate(&self) -> Result<()> {
        if self.end_date < self.start_date {
            return Err(TimetableError::ValidationError {
                message: format!(
                    "end date {} is before start date {}",
                    self.end_date, self.start_date
                ),
            });
        }
        validation::validate_range(
            "max_credits_per_day",
            self.max_credits_per_day,
            MIN_CREDITS_PER_DAY,
            MAX_CREDITS_PER_DAY,
        )?;
        validation::validate_positive_number("seats_per_room", self.default_seats_per_room as usize, 1)?;
        Ok(())
    }
}

/// Reads `{"1st Year": {"Morning": ["CSE"], "Evening": []}, ...}`.
pub fn parse_allocation(value: &serde_json::Value) -> Result<Allocation> {
    let invalid = |message: String| TimetableError::ValidationError { message };
    let years = value
        .as_object()
        .ok_or_else(|| invalid("allocation must be a JSON object keyed by year".to_string()))?;

    let mut allocation = Allocation::new();
    for (year_text, slots) in years {
        let year = normalize_year(year_text)
            .ok_or_else(|| invalid(format!("unrecognised year '{}' in allocation", year_text)))?;
        let slots = slots
            .as_object()
            .ok_or_else(|| invalid(format!("allocation for '{}' must map slots to branches", year_text)))?;

        let entry = allocation.entry(year).or_default();
        for (slot_text, branches) in slots {
            let slot = ExamSlot::parse(slot_text)
                .ok_or_else(|| invalid(format!("unknown slot '{}'", slot_text)))?;
            let branches = branches
                .as_array()
                .ok_or_else(|| invalid(format!("branches for {} {} must be a list", year_text, slot_text)))?
                .iter()
                .filter_map(|b| b.as_str())
                .map(|b| b.trim().to_uppercase())
                .filter(|b| !b.is_empty())
                .collect();
            entry.insert(slot, branches);
        }
    }
    Ok(allocation)
}

/// Inclusive range without Sundays and holidays.
pub fn exam_dates(start: NaiveDate, end: NaiveDate, holidays: &[NaiveDate]) -> Vec<NaiveDate> {
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .filter(|d| d.weekday() != Weekday::Sun && !holidays.contains(d))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExamKind {
    Common,
    Main,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledExam {
    pub code: String,
    pub credits: u32,
    pub branch: String,
    pub year: u32,
    pub students: u32,
    pub kind: ExamKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamDay {
    pub date: NaiveDate,
    pub slots: [Vec<ScheduledExam>; 2],
    pub students: [u32; 2],
    pub courses: [u32; 2],
    credits: HashMap<(u32, String), u32>,
}

impl ExamDay {
    fn new(date: NaiveDate) -> Self {
        Self {
            date,
            slots: [Vec::new(), Vec::new()],
            students: [0, 0],
            courses: [0, 0],
            credits: HashMap::new(),
        }
    }

    pub fn credits(&self, year: u32, branch: &str) -> u32 {
        self.credits
            .get(&(year, branch.to_string()))
            .copied()
            .unwrap_or(0)
    }

    pub fn exams(&self, slot: ExamSlot) -> &[ScheduledExam] {
        &self.slots[slot.index()]
    }

    fn has(&self, slot: ExamSlot, year: u32, kind: ExamKind) -> bool {
        self.exams(slot).iter().any(|e| e.year == year && e.kind == kind)
    }

    fn add(&mut self, slot: ExamSlot, exam: ScheduledExam) {
        *self.credits.entry((exam.year, exam.branch.clone())).or_default() += exam.credits;
        self.students[slot.index()] += exam.students;
        self.slots[slot.index()].push(exam);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomAssignment {
    pub date: NaiveDate,
    pub slot: ExamSlot,
    pub course: String,
    pub branch: String,
    pub students: String,
    pub room: String,
    pub faculty: String,
}

#[derive(Debug, Clone)]
pub struct ExamCalendar {
    pub days: Vec<ExamDay>,
    pub rooms: Vec<RoomAssignment>,
    /// Batches that found no room: (date, slot, course, branch, students).
    pub unplaced: Vec<RoomAssignment>,
    pub unassigned_common: Vec<String>,
    pub warnings: Vec<String>,
    pub workbook: Workbook,
}

fn validate_settings(settings: &CalendarSettings) -> Result<()> {
    validation::validate_positive_number("TotalRooms", settings.total_rooms as usize, 1)?;
    validation::validate_positive_number(
        "RoomCapacityPerCourse",
        settings.room_capacity_per_course as usize,
        1,
    )?;
    Ok(())
}

struct Planner<'a> {
    inputs: &'a CalendarInputs,
    settings: &'a CalendarSettings,
    max_credits: u32,
    capacity: u32,
    days: Vec<ExamDay>,
    remaining: HashMap<(u32, String), u32>,
    taken: HashMap<(u32, String), usize>,
    warnings: Vec<String>,
}

impl<'a> Planner<'a> {
    fn warn(&mut self, message: String) {
        tracing::warn!("⚠️ {}", message);
        self.warnings.push(message);
    }

    fn remaining_of(&self, year: u32, branch: &str) -> u32 {
        self.remaining
            .get(&(year, branch.to_string()))
            .copied()
            .unwrap_or(0)
    }

    fn remaining_in_year(&self, year: u32) -> u32 {
        self.inputs
            .branches_of(year)
            .iter()
            .map(|b| self.remaining_of(year, b))
            .sum()
    }

    fn total_remaining(&self) -> u32 {
        self.inputs.years.iter().map(|y| self.remaining_in_year(*y)).sum()
    }

    /// Next listed course, or a `<BRANCH><year>X` placeholder once the list runs out.
    fn next_course(&self, year: u32, branch: &str) -> (String, u32) {
        let key = (year, branch.to_string());
        let index = self.taken.get(&key).copied().unwrap_or(0);
        match self.inputs.course_list.get(&key).and_then(|list| list.get(index)) {
            Some(course) => (course.code.clone(), course.credits),
            None => (
                format!("{}{}X", branch, year),
                self.settings.credits_per_course,
            ),
        }
    }

    fn assign_common(&mut self) -> Vec<String> {
        let inputs = self.inputs;
        let mut assigned = vec![false; inputs.common.len()];

        for day in 0..self.days.len() {
            for (index, course) in inputs.common.iter().enumerate() {
                if assigned[index] {
                    continue;
                }
                let branches: Vec<String> = if course.branches.is_empty() {
                    inputs.branches_of(course.year).to_vec()
                } else {
                    course.branches.clone()
                };
                let total: u32 = branches
                    .iter()
                    .map(|b| inputs.strength_of(course.year, b))
                    .sum();

                for slot in ExamSlot::ALL {
                    let plan = &self.days[day];
                    let conflict = branches.iter().any(|b| {
                        plan.credits(course.year, b) + course.credits > self.max_credits
                            || plan
                                .exams(slot)
                                .iter()
                                .any(|e| e.year == course.year && &e.branch == b)
                    });
                    if conflict || plan.students[slot.index()] + total > self.capacity {
                        continue;
                    }

                    let plan = &mut self.days[day];
                    for branch in &branches {
                        plan.add(
                            slot,
                            ScheduledExam {
                                code: course.code.clone(),
                                credits: course.credits,
                                branch: branch.clone(),
                                year: course.year,
                                students: inputs.strength_of(course.year, branch),
                                kind: ExamKind::Common,
                            },
                        );
                    }
                    plan.courses[slot.index()] += 1;
                    assigned[index] = true;
                    tracing::debug!("Common course {} on {} {}", course.code, plan.date, slot);
                    break;
                }
            }
        }

        inputs
            .common
            .iter()
            .zip(assigned)
            .filter(|(_, placed)| !placed)
            .map(|(course, _)| course.code.clone())
            .collect()
    }

    /// Drops branches from each day's allocation once the slot would overflow.
    fn trim_allocation(&mut self, allocation: &Allocation) -> Vec<Allocation> {
        for (year, slots) in allocation {
            for (slot, branches) in slots {
                let total: u32 = branches
                    .iter()
                    .map(|b| self.inputs.strength_of(*year, b))
                    .sum();
                if total > self.capacity {
                    self.warn(format!(
                        "{} {} allocation totals {} students, above slot capacity {}",
                        year_label(*year),
                        slot,
                        total,
                        self.capacity
                    ));
                }
            }
        }

        let mut per_day = Vec::with_capacity(self.days.len());
        for day in 0..self.days.len() {
            let mut trimmed = Allocation::new();
            for slot in ExamSlot::ALL {
                let mut running = self.days[day].students[slot.index()];
                for year in self.inputs.years.clone() {
                    let allowed = allocation
                        .get(&year)
                        .and_then(|s| s.get(&slot))
                        .cloned()
                        .unwrap_or_default();
                    let mut kept = Vec::new();
                    for branch in allowed {
                        let strength = self.inputs.strength_of(year, &branch);
                        if running + strength <= self.capacity {
                            running += strength;
                            kept.push(branch);
                        } else {
                            tracing::debug!(
                                "Skipping {} {} {} on {}: slot capacity",
                                branch,
                                year_label(year),
                                slot,
                                self.days[day].date
                            );
                        }
                    }
                    trimmed.entry(year).or_default().insert(slot, kept);
                }
            }
            per_day.push(trimmed);
        }
        per_day
    }

    fn try_place_main(&mut self, day: usize, slot: ExamSlot, year: u32, branch: &str) -> bool {
        if self.remaining_of(year, branch) == 0 {
            return false;
        }
        let (code, credits) = self.next_course(year, branch);
        let strength = self.inputs.strength_of(year, branch);
        let plan = &self.days[day];
        if plan.credits(year, branch) + credits > self.max_credits
            || plan.students[slot.index()] + strength > self.capacity
        {
            return false;
        }

        let plan = &mut self.days[day];
        plan.add(
            slot,
            ScheduledExam {
                code,
                credits,
                branch: branch.to_string(),
                year,
                students: strength,
                kind: ExamKind::Main,
            },
        );
        plan.courses[slot.index()] += 1;

        let key = (year, branch.to_string());
        if let Some(left) = self.remaining.get_mut(&key) {
            *left -= 1;
        }
        *self.taken.entry(key).or_default() += 1;
        true
    }

    fn assign_main(&mut self, allocation: &[Allocation]) {
        // 第一門共同科目之後的日子才補空堂
        let first_common = self.inputs.common.first().map(|c| c.code.clone());
        let anchor = first_common.and_then(|code| {
            self.days.iter().position(|d| {
                d.slots.iter().flatten().any(|e| e.code == code)
            })
        });
        let backfill_from = anchor.map(|i| i + 1).unwrap_or(0);
        let years = self.inputs.years.clone();

        for day in 0..self.days.len() {
            for slot in ExamSlot::ALL {
                let blocked: HashSet<String> = self.days[day]
                    .exams(slot)
                    .iter()
                    .filter(|e| e.kind == ExamKind::Common)
                    .map(|e| e.branch.clone())
                    .collect();
                let allowed = |year: u32| -> Vec<String> {
                    allocation[day]
                        .get(&year)
                        .and_then(|s| s.get(&slot))
                        .cloned()
                        .unwrap_or_default()
                };

                for &year in &years {
                    if self.days[day].has(slot, year, ExamKind::Common) {
                        continue;
                    }
                    let mut candidates: Vec<String> = allowed(year)
                        .into_iter()
                        .filter(|b| self.remaining_of(year, b) > 0 && !blocked.contains(b))
                        .collect();
                    candidates.sort_by_key(|b| std::cmp::Reverse(self.inputs.strength_of(year, b)));

                    for branch in candidates {
                        self.try_place_main(day, slot, year, &branch);
                    }
                }

                let slot_has_main = self.days[day]
                    .exams(slot)
                    .iter()
                    .any(|e| e.kind == ExamKind::Main);
                if day < backfill_from || slot_has_main || self.total_remaining() == 0 {
                    continue;
                }

                let mut by_remaining = years.clone();
                by_remaining.sort_by_key(|y| std::cmp::Reverse(self.remaining_in_year(*y)));
                'years: for year in by_remaining {
                    if self.days[day].has(slot, year, ExamKind::Common) {
                        continue;
                    }
                    for branch in allowed(year) {
                        if blocked.contains(&branch) {
                            continue;
                        }
                        if self.try_place_main(day, slot, year, &branch) {
                            tracing::debug!("Back-filled {} {} on {}", branch, slot, self.days[day].date);
                            break 'years;
                        }
                    }
                }
            }
        }
    }
}

struct RoomPlan {
    rooms: Vec<RoomAssignment>,
    unplaced: Vec<RoomAssignment>,
}

/// Invigilators round-robin; nobody twice on one day until the list runs dry.
fn assign_faculty(
    faculty: &[String],
    rooms_used: usize,
    cursor: &mut usize,
    used_today: &mut HashSet<String>,
    warnings: &mut Vec<String>,
    date: NaiveDate,
    slot: ExamSlot,
) -> Vec<String> {
    if faculty.is_empty() {
        return vec!["TBD".to_string(); rooms_used];
    }
    let mut assigned = Vec::with_capacity(rooms_used);
    for _ in 0..rooms_used {
        let mut tries = 0;
        while used_today.contains(&faculty[*cursor % faculty.len()]) && tries < faculty.len() {
            *cursor += 1;
            tries += 1;
        }
        if tries == faculty.len() {
            let message = format!(
                "Faculty list exhausted on {} {}, reusing invigilators",
                date, slot
            );
            tracing::warn!("⚠️ {}", message);
            warnings.push(message);
            used_today.clear();
        }
        let name = faculty[*cursor % faculty.len()].clone();
        used_today.insert(name.clone());
        assigned.push(name);
        *cursor += 1;
    }
    assigned
}

fn assign_rooms(
    days: &[ExamDay],
    inputs: &CalendarInputs,
    settings: &CalendarSettings,
    warnings: &mut Vec<String>,
) -> RoomPlan {
    let rooms_used = (settings.total_rooms as usize).min(inputs.rooms.len());
    if rooms_used < settings.total_rooms as usize {
        let message = format!(
            "TotalRooms is {} but only {} rooms are listed",
            settings.total_rooms,
            inputs.rooms.len()
        );
        tracing::warn!("⚠️ {}", message);
        warnings.push(message);
    }
    let room_names = &inputs.rooms[..rooms_used];
    let batch = settings.room_capacity_per_course as usize;

    let mut plan = RoomPlan {
        rooms: Vec::new(),
        unplaced: Vec::new(),
    };
    let mut cursor = 0;

    for day in days {
        let mut used_today = HashSet::new();
        for slot in ExamSlot::ALL {
            let invigilators = assign_faculty(
                &inputs.faculty,
                rooms_used,
                &mut cursor,
                &mut used_today,
                warnings,
                day.date,
                slot,
            );

            let mut room_courses: Vec<Vec<(String, String, String)>> = vec![Vec::new(); rooms_used];
            let mut exams: Vec<&ScheduledExam> = day.exams(slot).iter().collect();
            exams.sort_by_key(|e| e.year);

            for exam in exams {
                let ids = inputs
                    .students
                    .get(&(exam.year, exam.branch.clone()))
                    .map(|v| v.as_slice())
                    .unwrap_or(&[]);
                let ranges: Vec<String> = if ids.is_empty() {
                    vec![format!("{} students", exam.students)]
                } else {
                    ids.chunks(batch)
                        .map(|chunk| format!("{}–{}", chunk[0], chunk[chunk.len() - 1]))
                        .collect()
                };

                for range in ranges {
                    let target = room_courses.iter().position(|courses| {
                        courses.len() < COURSES_PER_ROOM && !courses.iter().any(|(c, _, _)| c == &exam.code)
                    });
                    match target {
                        Some(index) => room_courses[index].push((exam.code.clone(), exam.branch.clone(), range)),
                        None => {
                            tracing::warn!(
                                "❌ No room left for {} ({}) on {} {}",
                                exam.code,
                                range,
                                day.date,
                                slot
                            );
                            plan.unplaced.push(RoomAssignment {
                                date: day.date,
                                slot,
                                course: exam.code.clone(),
                                branch: exam.branch.clone(),
                                students: range,
                                room: String::new(),
                                faculty: String::new(),
                            });
                        }
                    }
                }
            }

            for (index, courses) in room_courses.into_iter().enumerate() {
                for (course, branch, students) in courses {
                    plan.rooms.push(RoomAssignment {
                        date: day.date,
                        slot,
                        course,
                        branch,
                        students,
                        room: room_names[index].clone(),
                        faculty: invigilators[index].clone(),
                    });
                }
            }
        }
    }
    plan
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn schedule_sheet(days: &[ExamDay], inputs: &CalendarInputs) -> Sheet {
    let mut columns = vec!["Day".to_string()];
    for slot in ExamSlot::ALL {
        for year in &inputs.years {
            columns.push(format!("{} - {}", slot, year_label(*year)));
        }
    }
    for year in &inputs.years {
        for branch in inputs.branches_of(*year) {
            columns.push(format!("Credits {}-{}", year_label(*year), branch));
        }
    }
    for slot in ExamSlot::ALL {
        columns.push(format!("Total Students - {}", slot));
    }

    let mut sheet = Sheet::new("Exam Schedule", columns);
    for day in days {
        let mut row = vec![day.date.to_string()];
        for slot in ExamSlot::ALL {
            for year in &inputs.years {
                let listed: Vec<String> = day
                    .exams(slot)
                    .iter()
                    .filter(|e| e.year == *year)
                    .map(|e| format!("{} ({} students)", e.code, e.students))
                    .collect();
                row.push(if listed.is_empty() {
                    "Empty".to_string()
                } else {
                    listed.join(", ")
                });
            }
        }
        for year in &inputs.years {
            for branch in inputs.branches_of(*year) {
                row.push(day.credits(*year, branch).to_string());
            }
        }
        for slot in ExamSlot::ALL {
            row.push(day.students[slot.index()].to_string());
        }
        sheet.push_row(row);
    }
    sheet
}

fn room_sheets(days: &[ExamDay], rooms: &[RoomAssignment]) -> Vec<Sheet> {
    let columns = strings(&["Day", "Slot", "Course", "Branch", "Students", "Rooms Assigned", "Faculty"]);
    days.iter()
        .map(|day| {
            let mut sheet = Sheet::new(format!("Rooms-{}", day.date), columns.clone());
            for r in rooms.iter().filter(|r| r.date == day.date) {
                sheet.push_row(vec![
                    r.date.to_string(),
                    r.slot.to_string(),
                    r.course.clone(),
                    r.branch.clone(),
                    r.students.clone(),
                    r.room.clone(),
                    r.faculty.clone(),
                ]);
            }
            sheet
        })
        .collect()
}

fn room_summary_sheet(rooms: &[RoomAssignment]) -> Sheet {
    let mut merged: Vec<((NaiveDate, ExamSlot, String, String), Vec<String>)> = Vec::new();
    for r in rooms {
        let key = (r.date, r.slot, r.room.clone(), r.faculty.clone());
        let entry = format!("{} ({})", r.course, r.students);
        match merged.iter_mut().find(|(k, _)| *k == key) {
            Some((_, list)) => list.push(entry),
            None => merged.push((key, vec![entry])),
        }
    }

    let mut sheet = Sheet::new(
        "Room Summary",
        strings(&["Day", "Slot", "Rooms Assigned", "Faculty", "Courses + Students"]),
    );
    for ((date, slot, room, faculty), courses) in merged {
        sheet.push_row(vec![date.to_string(), slot.to_string(), room, faculty, courses.join(", ")]);
    }
    sheet
}

fn free_slots_sheet(
    days: &[ExamDay],
    rooms: &[RoomAssignment],
    inputs: &CalendarInputs,
    settings: &CalendarSettings,
) -> Sheet {
    let mut sheet = Sheet::new(
        "Free Slots",
        strings(&[
            "Day",
            "Slot",
            "Year",
            "Branch",
            "Status",
            "Available Rooms",
            "Remaining Capacity",
        ]),
    );

    for day in days {
        for slot in ExamSlot::ALL {
            let filled: HashSet<&str> = rooms
                .iter()
                .filter(|r| r.date == day.date && r.slot == slot)
                .map(|r| r.room.as_str())
                .collect();
            let available: Vec<&str> = inputs
                .rooms
                .iter()
                .map(|r| r.as_str())
                .filter(|r| !filled.contains(r))
                .collect();
            let remaining =
                settings.max_students_per_slot as i64 - day.students[slot.index()] as i64;

            let mut first = true;
            for year in &inputs.years {
                for branch in inputs.branches_of(*year) {
                    let engaged = day
                        .exams(slot)
                        .iter()
                        .any(|e| e.year == *year && &e.branch == branch);
                    let (rooms_cell, capacity_cell) = if first {
                        (available.join(", "), remaining.to_string())
                    } else {
                        (String::new(), String::new())
                    };
                    first = false;
                    sheet.push_row(vec![
                        day.date.to_string(),
                        slot.to_string(),
                        year_label(*year),
                        branch.clone(),
                        if engaged { "Engaged" } else { "Free" }.to_string(),
                        rooms_cell,
                        capacity_cell,
                    ]);
                }
            }
        }
    }
    sheet
}

fn unplaced_sheet(unplaced: &[RoomAssignment]) -> Sheet {
    let mut sheet = Sheet::new(
        "Unplaced Batches",
        strings(&["Day", "Slot", "Course", "Branch", "Students"]),
    );
    for r in unplaced {
        sheet.push_row(vec![
            r.date.to_string(),
            r.slot.to_string(),
            r.course.clone(),
            r.branch.clone(),
            r.students.clone(),
        ]);
    }
    sheet
}

pub fn generate(inputs: &CalendarInputs, params: &CalendarParams) -> Result<ExamCalendar> {
    params.validate()?;
    let settings = inputs.settings()?;
    validate_settings(settings)?;

    let dates = exam_dates(params.start_date, params.end_date, &params.holidays);
    if dates.is_empty() {
        return Err(TimetableError::ValidationError {
            message: format!(
                "no exam dates between {} and {} after removing Sundays and holidays",
                params.start_date, params.end_date
            ),
        });
    }

    let seats = settings.seats_per_room.unwrap_or(params.default_seats_per_room);
    let capacity = settings.total_rooms * seats;
    tracing::info!(
        "📅 {} exam dates, slot capacity {} ({} rooms × {} seats)",
        dates.len(),
        capacity,
        settings.total_rooms,
        seats
    );

    let mut remaining = HashMap::new();
    let mut warnings = Vec::new();
    for &year in &inputs.years {
        let count = match inputs.courses_per_year.get(&year) {
            Some(n) => *n,
            None => {
                warnings.push(format!("{} has no CoursesPerYear row", year_label(year)));
                0
            }
        };
        for branch in inputs.branches_of(year) {
            remaining.insert((year, branch.clone()), count);
        }
    }

    let mut planner = Planner {
        inputs,
        settings,
        max_credits: params.max_credits_per_day,
        capacity,
        days: dates.into_iter().map(ExamDay::new).collect(),
        remaining,
        taken: HashMap::new(),
        warnings,
    };

    let unassigned_common = planner.assign_common();
    for code in &unassigned_common {
        planner.warn(format!("Common course {} could not be placed", code));
    }

    let allocation = planner.trim_allocation(&params.allocation);
    planner.assign_main(&allocation);

    let left = planner.total_remaining();
    if left > 0 {
        planner.warn(format!("{} branch exams did not fit between the given dates", left));
    }

    let Planner { days, mut warnings, .. } = planner;
    let RoomPlan { rooms, unplaced } = assign_rooms(&days, inputs, settings, &mut warnings);

    let mut sheets = vec![schedule_sheet(&days, inputs)];
    sheets.extend(room_sheets(&days, &rooms));
    sheets.push(room_summary_sheet(&rooms));
    sheets.push(free_slots_sheet(&days, &rooms, inputs, settings));
    if !unplaced.is_empty() {
        sheets.push(unplaced_sheet(&unplaced));
    }

    tracing::info!(
        "✅ Exam calendar: {} days, {} room assignments, {} unplaced batches",
        days.len(),
        rooms.len(),
        unplaced.len()
    );

    Ok(ExamCalendar {
        days,
        rooms,
        unplaced,
        unassigned_common,
        warnings,
        workbook: Workbook { sheets },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::calendar_inputs::{CommonCourse, ListedCourse};

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    fn settings() -> CalendarSettings {
        CalendarSettings {
            credits_per_course: 3,
            max_students_per_slot: 500,
            max_courses_per_slot: 10,
            total_rooms: 4,
            room_capacity_per_course: 30,
            seats_per_room: Some(50),
        }
    }

    fn inputs() -> CalendarInputs {
        let mut inputs = CalendarInputs::default();
        inputs.years = vec![1, 2];
        inputs.branches.insert(1, vec!["CSE".to_string(), "ECE".to_string()]);
        inputs.branches.insert(2, vec!["CSE".to_string()]);
        for (year, branch, strength) in [(1, "CSE", 60), (1, "ECE", 40), (2, "CSE", 50)] {
            inputs.strength.insert((year, branch.to_string()), strength);
        }
        inputs.courses_per_year.insert(1, 2);
        inputs.courses_per_year.insert(2, 2);
        inputs.settings = Some(settings());
        inputs.faculty = (1..=10).map(|i| format!("F{}", i)).collect();
        inputs.rooms = vec!["R1".to_string(), "R2".to_string(), "R3".to_string(), "R4".to_string()];
        inputs.course_list.insert(
            (1, "CSE".to_string()),
            vec![ListedCourse {
                code: "CS101".to_string(),
                credits: 4,
            }],
        );
        inputs
    }

    fn allocation() -> Allocation {
        let mut allocation = Allocation::new();
        allocation.insert(
            1,
            BTreeMap::from([
                (ExamSlot::Morning, vec!["CSE".to_string(), "ECE".to_string()]),
                (ExamSlot::Evening, vec![]),
            ]),
        );
        allocation.insert(
            2,
            BTreeMap::from([
                (ExamSlot::Morning, vec![]),
                (ExamSlot::Evening, vec!["CSE".to_string()]),
            ]),
        );
        allocation
    }

    fn params(start: NaiveDate, end: NaiveDate, max_credits: u32) -> CalendarParams {
        CalendarParams {
            start_date: start,
            end_date: end,
            max_credits_per_day: max_credits,
            allocation: allocation(),
            holidays: vec![],
            default_seats_per_room: 48,
        }
    }

    #[test]
    fn test_exam_dates_skip_sundays_and_holidays() {
        // 2025-10-05 is a Sunday
        let dates = exam_dates(date(10, 3), date(10, 7), &[date(10, 6)]);
        assert_eq!(dates, vec![date(10, 3), date(10, 4), date(10, 7)]);
    }

    #[test]
    fn test_params_validation() {
        assert!(params(date(10, 3), date(10, 7), 5).validate().is_ok());
        assert!(params(date(10, 3), date(10, 7), 2).validate().is_err());
        assert!(params(date(10, 3), date(10, 7), 11).validate().is_err());
        assert!(params(date(10, 7), date(10, 3), 5).validate().is_err());
    }

    #[test]
    fn test_parse_allocation_normalizes_years() {
        let value = serde_json::json!({
            "1St Year": {"Morning": ["cse", "ECE"], "Evening": []},
            "2nd": {"evening": ["CSE"]}
        });
        let allocation = parse_allocation(&value).unwrap();
        assert_eq!(allocation[&1][&ExamSlot::Morning], vec!["CSE", "ECE"]);
        assert_eq!(allocation[&2][&ExamSlot::Evening], vec!["CSE"]);
        assert!(parse_allocation(&serde_json::json!({"Senior": {}})).is_err());
    }

    #[test]
    fn test_main_courses_follow_course_list_then_placeholder() {
        let calendar = generate(&inputs(), &params(date(10, 6), date(10, 11), 5)).unwrap();

        let cse1: Vec<&ScheduledExam> = calendar
            .days
            .iter()
            .flat_map(|d| d.slots.iter().flatten())
            .filter(|e| e.year == 1 && e.branch == "CSE")
            .collect();
        assert_eq!(cse1.len(), 2);
        assert_eq!(cse1[0].code, "CS101");
        assert_eq!(cse1[0].credits, 4);
        assert_eq!(cse1[1].code, "CSE1X");
        assert_eq!(cse1[1].credits, 3);

        // second-year CSE only sits in the evening
        assert!(calendar.days.iter().all(|d| !d.exams(ExamSlot::Morning).iter().any(|e| e.year == 2)));
    }

    #[test]
    fn test_course_count_setting_does_not_limit_a_slot() {
        let mut data = inputs();
        data.settings = Some(CalendarSettings {
            max_courses_per_slot: 1,
            ..settings()
        });
        let calendar = generate(&data, &params(date(10, 6), date(10, 11), 5)).unwrap();

        let first_morning = calendar.days[0].exams(ExamSlot::Morning);
        let branches: Vec<&str> = first_morning
            .iter()
            .filter(|e| e.year == 1)
            .map(|e| e.branch.as_str())
            .collect();
        assert_eq!(branches, vec!["CSE", "ECE"]);
    }

    #[test]
    fn test_daily_credits_and_capacity_hold() {
        let mut data = inputs();
        data.settings = Some(CalendarSettings {
            total_rooms: 2,
            ..settings()
        });
        let calendar = generate(&data, &params(date(10, 6), date(10, 18), 4)).unwrap();

        for day in &calendar.days {
            for slot in ExamSlot::ALL {
                assert!(day.students[slot.index()] <= 100);
            }
            for (year, branch) in [(1, "CSE"), (1, "ECE"), (2, "CSE")] {
                assert!(day.credits(year, branch) <= 4);
            }
            assert_ne!(day.date.weekday(), Weekday::Sun);
        }
    }

    #[test]
    fn test_common_course_blocks_its_branches() {
        let mut data = inputs();
        data.common.push(CommonCourse {
            code: "ENV101".to_string(),
            credits: 2,
            year: 1,
            branches: vec!["CSE".to_string(), "ECE".to_string()],
        });
        let calendar = generate(&data, &params(date(10, 6), date(10, 11), 5)).unwrap();

        let first = &calendar.days[0];
        let morning = first.exams(ExamSlot::Morning);
        assert_eq!(morning.iter().filter(|e| e.kind == ExamKind::Common).count(), 2);
        assert!(morning.iter().all(|e| e.kind == ExamKind::Common));
        assert!(calendar.unassigned_common.is_empty());
        assert_eq!(first.credits(1, "CSE"), 2);
    }

    #[test]
    fn test_workbook_sheets_and_invigilators() {
        let mut data = inputs();
        data.students.insert(
            (1, "CSE".to_string()),
            (1..=45).map(|i| format!("21CS{:03}", i)).collect(),
        );
        let calendar = generate(&data, &params(date(10, 6), date(10, 7), 5)).unwrap();
        let names = calendar.workbook.sheet_names();

        assert_eq!(names[0], "Exam Schedule");
        assert!(names.contains(&"Rooms-2025-10-06".to_string()));
        assert!(names.contains(&"Room Summary".to_string()));
        assert!(names.contains(&"Free Slots".to_string()));
        assert!(!names.contains(&"Unplaced Batches".to_string()));

        let schedule = calendar.workbook.sheet("Exam Schedule").unwrap();
        assert_eq!(schedule.columns[1], "Morning - 1st Year");
        assert!(schedule.rows[0][1].contains("CS101 (60 students)"));

        let batches: Vec<&RoomAssignment> = calendar
            .rooms
            .iter()
            .filter(|r| r.course == "CS101")
            .collect();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].students, "21CS001–21CS030");
        assert_eq!(batches[1].students, "21CS031–21CS045");
        assert_ne!(batches[0].room, batches[1].room);

        // no invigilator twice on one day
        for day in &calendar.days {
            let mut seen: HashMap<(ExamSlot, &str), &str> = HashMap::new();
            for r in calendar.rooms.iter().filter(|r| r.date == day.date) {
                seen.insert((r.slot, r.room.as_str()), r.faculty.as_str());
            }
            let mut people: Vec<&str> = seen.values().copied().collect();
            let total = people.len();
            people.sort();
            people.dedup();
            assert_eq!(people.len(), total);
        }
    }

    #[test]
    fn test_empty_date_range_is_rejected() {
        // a single Sunday
        let err = generate(&inputs(), &params(date(10, 5), date(10, 5), 5)).unwrap_err();
        assert!(matches!(err, TimetableError::ValidationError { .. }));
    }
}
