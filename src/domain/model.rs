use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One column of the weekly grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeSlot {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Length in minutes; a slot ending before it starts wraps past midnight.
    pub fn minutes(&self) -> i64 {
        let mut delta = (self.end - self.start).num_minutes();
        if delta < 0 {
            delta += 24 * 60;
        }
        delta
    }

    pub fn overlaps(&self, start: NaiveTime, end: NaiveTime) -> bool {
        self.start < end && start < self.end
    }

    pub fn label(&self) -> String {
        format!("{}-{}", self.start.format("%H:%M"), self.end.format("%H:%M"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SessionKind {
    #[serde(rename = "LEC")]
    Lecture,
    #[serde(rename = "TUT")]
    Tutorial,
    #[serde(rename = "LAB")]
    Lab,
    #[serde(rename = "SS")]
    SelfStudy,
}

impl SessionKind {
    pub const ALL: [SessionKind; 4] = [
        SessionKind::Lecture,
        SessionKind::Tutorial,
        SessionKind::Lab,
        SessionKind::SelfStudy,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            SessionKind::Lecture => "LEC",
            SessionKind::Tutorial => "TUT",
            SessionKind::Lab => "LAB",
            SessionKind::SelfStudy => "SS",
        }
    }

    /// How many times a component may be retried before it is reported.
    pub fn attempt_limit(&self) -> usize {
        match self {
            SessionKind::Lecture => 800,
            SessionKind::Tutorial => 600,
            SessionKind::Lab => 800,
            SessionKind::SelfStudy => 400,
        }
    }

    pub fn failure_reason(&self) -> &'static str {
        match self {
            SessionKind::Lecture => "Number of collisions exceeded limit",
            SessionKind::Tutorial => "No slot available",
            SessionKind::Lab => "Lab not scheduled",
            SessionKind::SelfStudy => "Self-study not scheduled",
        }
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomKind {
    LectureRoom,
    ComputerLab,
    #[serde(rename = "SEATER_120")]
    Seater120,
    #[serde(rename = "SEATER_240")]
    Seater240,
}

impl RoomKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "LECTURE_ROOM" => Some(RoomKind::LectureRoom),
            "COMPUTER_LAB" => Some(RoomKind::ComputerLab),
            "SEATER_120" => Some(RoomKind::Seater120),
            "SEATER_240" => Some(RoomKind::Seater240),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub number: String,
    pub kind: RoomKind,
    pub capacity: u32,
}

/// A row of `combined.csv`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub department: String,
    pub semester: u32,
    pub code: String,
    pub name: String,
    pub lecture_hours: u32,
    pub tutorial_hours: u32,
    pub lab_hours: u32,
    pub self_study_hours: u32,
    pub faculty: String,
    pub schedule: bool,
    pub auditorium: bool,
    pub students: Option<u32>,
}

impl Course {
    pub fn has_lab(&self) -> bool {
        self.lab_hours > 0
    }

    /// Higher is scheduled earlier; lighter courses score higher.
    pub fn priority(&self) -> i64 {
        -((self.lecture_hours + self.tutorial_hours + self.lab_hours) as i64)
    }

    pub fn is_elective(&self) -> bool {
        let name = self.name.to_lowercase();
        if name.contains("elective") {
            return true;
        }
        let is_tag = |token: &str| token == "oe" || token == "pe";
        let tokens = |text: &str| {
            text.split(|c: char| !c.is_ascii_alphanumeric())
                .map(str::to_ascii_lowercase)
                .collect::<Vec<_>>()
        };
        tokens(&self.name).iter().any(|t| is_tag(t)) || tokens(&self.code).iter().any(|t| is_tag(t))
    }
}

/// One basket row of `elective.csv`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectiveBasket {
    pub semester: u32,
    pub label: String,
    pub electives: Vec<String>,
    pub faculty: Vec<String>,
    pub rooms_per_slot: u32,
    pub counts: Vec<u32>,
}

impl ElectiveBasket {
    pub fn count_for(&self, index: usize) -> u32 {
        self.counts.get(index).copied().unwrap_or(60)
    }

    pub fn faculty_for(&self, index: usize) -> &str {
        self.faculty.get(index).map(|f| f.as_str()).unwrap_or("TBD")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectiveSeat {
    pub code: String,
    pub room: String,
    pub faculty: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub kind: SessionKind,
    pub code: String,
    pub name: String,
    pub faculty: String,
    pub room: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lab_rooms: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub electives: Vec<ElectiveSeat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basket: Option<String>,
}

impl Booking {
    /// Every room the booking holds.
    pub fn rooms(&self) -> Vec<&str> {
        if self.basket.is_some() {
            return self.electives.iter().map(|e| e.room.as_str()).collect();
        }
        if !self.lab_rooms.is_empty() {
            return self.lab_rooms.iter().map(|r| r.as_str()).collect();
        }
        vec![self.room.as_str()]
    }

    /// Text shown in a grid cell.
    pub fn display(&self) -> String {
        if let Some(label) = &self.basket {
            let mut parts: Vec<String> = self
                .electives
                .iter()
                .map(|e| format!("{} Room: {}", e.code, e.room))
                .collect();
            parts.insert(0, format!("{} Course", label));
            parts.push(self.kind.code().to_string());
            parts.push(self.faculty.clone());
            return parts.join("\n");
        }

        let rooms = if self.lab_rooms.len() >= 2 {
            format!("Rooms: {}", self.lab_rooms.join(", "))
        } else {
            format!("Room: {}", self.room)
        };
        format!("{}\n{}\n{}\n{}", self.code, self.kind, rooms, self.faculty)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "booking", rename_all = "snake_case")]
pub enum Cell {
    Free,
    Start(Booking),
    Continued(SessionKind),
}

impl Cell {
    pub fn is_free(&self) -> bool {
        matches!(self, Cell::Free)
    }

    pub fn booking(&self) -> Option<&Booking> {
        match self {
            Cell::Start(b) => Some(b),
            _ => None,
        }
    }

    pub fn kind(&self) -> Option<SessionKind> {
        match self {
            Cell::Free => None,
            Cell::Start(b) => Some(b.kind),
            Cell::Continued(k) => Some(*k),
        }
    }
}

/// Weekly grid of one department/semester/section, indexed `[day][slot]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionTimetable {
    pub department: String,
    pub semester: u32,
    pub section: char,
    pub split: bool,
    pub cells: Vec<Vec<Cell>>,
}

impl SectionTimetable {
    pub fn new(department: &str, semester: u32, section: char, split: bool, days: usize, slots: usize) -> Self {
        Self {
            department: department.to_string(),
            semester,
            section,
            split,
            cells: vec![vec![Cell::Free; slots]; days],
        }
    }

    /// `CSE_3_A` for split sections, `CSE_3` otherwise.
    pub fn title(&self) -> String {
        if self.split {
            format!("{}_{}_{}", self.department, self.semester, self.section)
        } else {
            format!("{}_{}", self.department, self.semester)
        }
    }

    pub fn is_free(&self, day: usize, slot: usize) -> bool {
        self.cells
            .get(day)
            .and_then(|row| row.get(slot))
            .map(Cell::is_free)
            .unwrap_or(false)
    }

    /// Bookings in day order, each with the run of slots it covers.
    pub fn sessions(&self) -> Vec<PlacedSession<'_>> {
        let mut sessions: Vec<PlacedSession<'_>> = Vec::new();
        for (day, row) in self.cells.iter().enumerate() {
            for (slot, cell) in row.iter().enumerate() {
                match cell {
                    Cell::Start(booking) => sessions.push(PlacedSession {
                        day,
                        start: slot,
                        len: 1,
                        booking,
                    }),
                    Cell::Continued(_) => {
                        if let Some(last) = sessions.last_mut() {
                            if last.day == day && last.start + last.len == slot {
                                last.len += 1;
                            }
                        }
                    }
                    Cell::Free => {}
                }
            }
        }
        sessions
    }

    /// Writes a booking over consecutive slots; the first cell carries the details.
    pub fn place(&mut self, day: usize, slots: &[usize], booking: Booking) {
        let kind = booking.kind;
        let mut first = Some(booking);
        for &slot in slots {
            self.cells[day][slot] = match first.take() {
                Some(b) => Cell::Start(b),
                None => Cell::Continued(kind),
            };
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PlacedSession<'a> {
    pub day: usize,
    pub start: usize,
    pub len: usize,
    pub booking: &'a Booking,
}

impl PlacedSession<'_> {
    pub fn slots(&self) -> std::ops::Range<usize> {
        self.start..self.start + self.len
    }
}

/// A course component that could not be placed. Components of the same code merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnscheduledCourse {
    pub code: String,
    pub name: String,
    pub department: String,
    pub semester: u32,
    pub faculty: String,
    pub components: Vec<SessionKind>,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ExamSlot {
    Morning,
    Evening,
}

impl ExamSlot {
    pub const ALL: [ExamSlot; 2] = [ExamSlot::Morning, ExamSlot::Evening];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExamSlot::Morning => "Morning",
            ExamSlot::Evening => "Evening",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            ExamSlot::Morning => 0,
            ExamSlot::Evening => 1,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "morning" => Some(ExamSlot::Morning),
            "evening" => Some(ExamSlot::Evening),
            _ => None,
        }
    }
}

impl fmt::Display for ExamSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `1st Year`, `2nd Year`, ...
pub fn year_label(year: u32) -> String {
    let suffix = match (year % 10, year % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{} Year", year, suffix)
}

/// A named table of text cells.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, mut row: Vec<String>) {
        row.resize(self.columns.len(), String::new());
        self.rows.push(row);
    }

    pub fn file_name(&self) -> String {
        let stem: String = self
            .name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        format!("{}.csv", stem)
    }
}

/// Ordered collection of sheets, persisted as JSON and exported as CSVs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    /// `row` and `col` are zero-based data positions (the header row is not counted).
    pub fn update_cell(&mut self, sheet: &str, row: usize, col: usize, value: String) -> bool {
        let Some(target) = self.sheets.iter_mut().find(|s| s.name == sheet) else {
            return false;
        };
        if col >= target.columns.len() {
            return false;
        }
        match target.rows.get_mut(row) {
            Some(cells) => {
                if cells.len() <= col {
                    cells.resize(col + 1, String::new());
                }
                cells[col] = value;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn course(code: &str, name: &str) -> Course {
        Course {
            department: "CSE".to_string(),
            semester: 3,
            code: code.to_string(),
            name: name.to_string(),
            lecture_hours: 3,
            tutorial_hours: 1,
            lab_hours: 0,
            self_study_hours: 0,
            faculty: "Dr. A".to_string(),
            schedule: true,
            auditorium: false,
            students: None,
        }
    }

    #[test]
    fn test_slot_minutes_wraps_midnight() {
        assert_eq!(TimeSlot::new(t(7, 30), t(9, 0)).minutes(), 90);
        assert_eq!(TimeSlot::new(t(23, 30), t(0, 30)).minutes(), 60);
        assert_eq!(TimeSlot::new(t(18, 30), t(23, 59)).label(), "18:30-23:59");
    }

    #[test]
    fn test_overlap_is_strict() {
        let slot = TimeSlot::new(t(10, 0), t(10, 30));
        assert!(!slot.overlaps(t(10, 30), t(10, 45)));
        assert!(slot.overlaps(t(10, 15), t(10, 45)));
    }

    #[test]
    fn test_elective_detection_uses_tokens() {
        assert!(course("CS301", "Program Elective I").is_elective());
        assert!(course("OE-12", "Robotics").is_elective());
        assert!(course("CS302", "PE: Cryptography").is_elective());
        // "oe" and "pe" inside words do not count
        assert!(!course("CS303", "Operating Systems Pipelines").is_elective());
        assert!(!course("CS304", "Shoe Design").is_elective());
    }

    #[test]
    fn test_place_marks_continuation() {
        let mut grid = SectionTimetable::new("CSE", 3, 'A', true, 1, 4);
        let booking = Booking {
            kind: SessionKind::Lecture,
            code: "CS301".to_string(),
            name: "Algorithms".to_string(),
            faculty: "Dr. A".to_string(),
            room: "C101".to_string(),
            lab_rooms: vec![],
            electives: vec![],
            basket: None,
        };
        grid.place(0, &[1, 2], booking);

        assert!(grid.is_free(0, 0));
        assert!(matches!(grid.cells[0][1], Cell::Start(_)));
        assert_eq!(grid.cells[0][2], Cell::Continued(SessionKind::Lecture));
        assert_eq!(grid.title(), "CSE_3_A");

        let sessions = grid.sessions();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].slots(), 1..3);
        assert_eq!(sessions[0].booking.rooms(), vec!["C101"]);
    }

    #[test]
    fn test_year_labels() {
        assert_eq!(year_label(1), "1st Year");
        assert_eq!(year_label(2), "2nd Year");
        assert_eq!(year_label(3), "3rd Year");
        assert_eq!(year_label(4), "4th Year");
        assert_eq!(year_label(11), "11th Year");
    }

    #[test]
    fn test_workbook_update_cell_bounds() {
        let mut sheet = Sheet::new("Exam Schedule", vec!["Day".to_string(), "Morning".to_string()]);
        sheet.push_row(vec!["2025-10-01".to_string()]);
        let mut workbook = Workbook { sheets: vec![sheet] };

        assert!(workbook.update_cell("Exam Schedule", 0, 1, "CS101".to_string()));
        assert_eq!(workbook.sheets[0].rows[0][1], "CS101");
        assert!(!workbook.update_cell("Exam Schedule", 3, 0, "x".to_string()));
        assert!(!workbook.update_cell("Exam Schedule", 0, 5, "x".to_string()));
        assert!(!workbook.update_cell("Nope", 0, 0, "x".to_string()));
        assert_eq!(workbook.sheets[0].file_name(), "Exam_Schedule.csv");
    }
}
