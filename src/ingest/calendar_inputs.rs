use super::{split_list, CsvTable};
use crate::utils::error::{Result, TimetableError};
use std::collections::{BTreeMap, HashMap};

pub const BRANCH_STRENGTH_FILE: &str = "BranchStrength.csv";
pub const COURSES_PER_YEAR_FILE: &str = "CoursesPerYear.csv";
pub const COMMON_COURSE_FILE: &str = "CommonCourse.csv";
pub const SETTINGS_FILE: &str = "Settings.csv";
pub const FACULTY_FILE: &str = "FACULTY.csv";
pub const ROOMS_FILE: &str = "rooms.csv";
pub const COURSE_LIST_FILE: &str = "courselist.csv";
pub const STUDENTS_FILE: &str = "students.csv";

/// (upload field, stored file name), in form order.
pub const CALENDAR_FILES: [(&str, &str); 8] = [
    ("branch_strength", BRANCH_STRENGTH_FILE),
    ("courses_per_year", COURSES_PER_YEAR_FILE),
    ("common_course", COMMON_COURSE_FILE),
    ("settings", SETTINGS_FILE),
    ("faculty", FACULTY_FILE),
    ("rooms", ROOMS_FILE),
    ("courselist", COURSE_LIST_FILE),
    ("students", STUDENTS_FILE),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommonCourse {
    pub code: String,
    pub credits: u32,
    pub year: u32,
    pub branches: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedCourse {
    pub code: String,
    pub credits: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarSettings {
    pub credits_per_course: u32,
    pub max_students_per_slot: u32,
    pub max_courses_per_slot: u32,
    pub total_rooms: u32,
    pub room_capacity_per_course: u32,
    pub seats_per_room: Option<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct CalendarInputs {
    /// Years in first-seen order.
    pub years: Vec<u32>,
    /// Branches per year in first-seen order.
    pub branches: BTreeMap<u32, Vec<String>>,
    pub strength: HashMap<(u32, String), u32>,
    pub courses_per_year: HashMap<u32, u32>,
    pub common: Vec<CommonCourse>,
    pub settings: Option<CalendarSettings>,
    pub faculty: Vec<String>,
    pub rooms: Vec<String>,
    pub course_list: HashMap<(u32, String), Vec<ListedCourse>>,
    pub students: HashMap<(u32, String), Vec<String>>,
}

impl CalendarInputs {
    pub fn strength_of(&self, year: u32, branch: &str) -> u32 {
        self.strength
            .get(&(year, branch.to_string()))
            .copied()
            .unwrap_or(0)
    }

    pub fn branches_of(&self, year: u32) -> &[String] {
        self.branches.get(&year).map(|b| b.as_slice()).unwrap_or(&[])
    }

    pub fn settings(&self) -> Result<&CalendarSettings> {
        self.settings.as_ref().ok_or_else(|| TimetableError::MissingInputError {
            file: SETTINGS_FILE.to_string(),
        })
    }
}

/// `1st`, `First Year`, `1`, `1St_Year` all read as 1.
pub fn normalize_year(raw: &str) -> Option<u32> {
    let text: String = raw
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .collect();

    const WORDS: [(&str, u32); 5] = [
        ("first", 1),
        ("second", 2),
        ("third", 3),
        ("fourth", 4),
        ("fifth", 5),
    ];
    if let Some((_, n)) = WORDS.iter().find(|(w, _)| text.contains(w)) {
        return Some(*n);
    }

    let digits: String = text.chars().take_while(|c| c.is_ascii_digit()).collect();
    let year: u32 = digits.parse().ok()?;
    (year > 0).then_some(year)
}

fn require_year(table: &CsvTable, row: &super::CsvRow<'_>, column: &str) -> Result<u32> {
    let raw = row.require(column)?;
    normalize_year(raw).ok_or_else(|| {
        TimetableError::invalid_input(table.file(), row.line(), format!("unrecognised year '{}'", raw))
    })
}

pub fn parse_branch_strength(table: &CsvTable, inputs: &mut CalendarInputs) -> Result<()> {
    for column in ["Year", "Branch", "Strength"] {
        table.require_column(column)?;
    }
    for row in table.rows() {
        let year = require_year(table, &row, "Year")?;
        let branch = row.require("Branch")?.to_uppercase();
        let strength = row.require_number("Strength")?;

        if !inputs.years.contains(&year) {
            inputs.years.push(year);
        }
        let branches = inputs.branches.entry(year).or_default();
        if !branches.contains(&branch) {
            branches.push(branch.clone());
        }
        inputs.strength.insert((year, branch), strength);
    }
    Ok(())
}

pub fn parse_courses_per_year(table: &CsvTable, inputs: &mut CalendarInputs) -> Result<()> {
    table.require_column("Year")?;
    table.require_column("CoursesPerYear")?;
    for row in table.rows() {
        let year = require_year(table, &row, "Year")?;
        inputs
            .courses_per_year
            .insert(year, row.require_number("CoursesPerYear")?);
    }
    Ok(())
}

pub fn parse_common_courses(table: &CsvTable, inputs: &mut CalendarInputs) -> Result<()> {
    for column in ["CourseCode", "Credits", "Year"] {
        table.require_column(column)?;
    }
    for row in table.rows() {
        inputs.common.push(CommonCourse {
            code: row.require("CourseCode")?.to_string(),
            credits: row.require_number("Credits")?,
            year: require_year(table, &row, "Year")?,
            branches: row
                .get("Branches")
                .map(|b| split_list(b, ',').into_iter().map(|s| s.to_uppercase()).collect())
                .unwrap_or_default(),
        });
    }
    Ok(())
}

pub fn parse_settings(table: &CsvTable, inputs: &mut CalendarInputs) -> Result<()> {
    table.require_column("SettingName")?;
    table.require_column("Value")?;

    let mut values: HashMap<String, u32> = HashMap::new();
    for row in table.rows() {
        let name = row.require("SettingName")?.to_string();
        values.insert(name, row.require_number("Value")?);
    }

    let required = |name: &str| -> Result<u32> {
        values.get(name).copied().ok_or_else(|| {
            TimetableError::invalid_input(table.file(), 1, format!("missing setting '{}'", name))
        })
    };

    inputs.settings = Some(CalendarSettings {
        credits_per_course: required("CreditsPerCourse")?,
        max_students_per_slot: required("MaxStudentsPerSlot")?,
        max_courses_per_slot: required("MaxCoursesPerSlot")?,
        total_rooms: required("TotalRooms")?,
        room_capacity_per_course: required("RoomCapacityPerCourse")?,
        seats_per_room: values.get("SeatsPerRoom").copied(),
    });
    Ok(())
}

pub fn parse_faculty(table: &CsvTable, inputs: &mut CalendarInputs) -> Result<()> {
    let column = table.require_column("Name")?;
    inputs.faculty = table.column_values(column);
    Ok(())
}

pub fn parse_rooms(table: &CsvTable, inputs: &mut CalendarInputs) -> Result<()> {
    let column = table.require_column("Room")?;
    inputs.rooms = table.column_values(column);
    Ok(())
}

/// Long format: one row per course, kept in file order per (year, branch).
pub fn parse_course_list(table: &CsvTable, inputs: &mut CalendarInputs) -> Result<()> {
    for column in ["Year", "Branch", "CourseCode", "Credits"] {
        table.require_column(column)?;
    }
    for row in table.rows() {
        let year = require_year(table, &row, "Year")?;
        let branch = row.require("Branch")?.to_uppercase();
        inputs
            .course_list
            .entry((year, branch))
            .or_default()
            .push(ListedCourse {
                code: row.require("CourseCode")?.to_string(),
                credits: row.require_number("Credits")?,
            });
    }
    Ok(())
}

pub fn parse_students(table: &CsvTable, inputs: &mut CalendarInputs) -> Result<()> {
    for column in ["Year", "Branch", "StudentId"] {
        table.require_column(column)?;
    }
    for row in table.rows() {
        let year = require_year(table, &row, "Year")?;
        let branch = row.require("Branch")?.to_uppercase();
        inputs
            .students
            .entry((year, branch))
            .or_default()
            .push(row.require("StudentId")?.to_string());
    }
    Ok(())
}

/// Parses the eight calendar files given as (file name, bytes).
pub fn parse_all(files: &HashMap<String, Vec<u8>>) -> Result<CalendarInputs> {
    let mut inputs = CalendarInputs::default();

    type Parser = fn(&CsvTable, &mut CalendarInputs) -> Result<()>;
    let parsers: [(&str, Parser); 8] = [
        (BRANCH_STRENGTH_FILE, parse_branch_strength),
        (COURSES_PER_YEAR_FILE, parse_courses_per_year),
        (COMMON_COURSE_FILE, parse_common_courses),
        (SETTINGS_FILE, parse_settings),
        (FACULTY_FILE, parse_faculty),
        (ROOMS_FILE, parse_rooms),
        (COURSE_LIST_FILE, parse_course_list),
        (STUDENTS_FILE, parse_students),
    ];

    for (file, parser) in parsers {
        let data = files.get(file).ok_or_else(|| TimetableError::MissingInputError {
            file: file.to_string(),
        })?;
        let table = CsvTable::parse(file, data)?;
        parser(&table, &mut inputs)?;
    }

    tracing::info!(
        "📚 Calendar inputs: {} years, {} common courses, {} rooms, {} faculty",
        inputs.years.len(),
        inputs.common.len(),
        inputs.rooms.len(),
        inputs.faculty.len()
    );
    Ok(inputs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_year() {
        assert_eq!(normalize_year("1st"), Some(1));
        assert_eq!(normalize_year("1St Year"), Some(1));
        assert_eq!(normalize_year("1St_Year"), Some(1));
        assert_eq!(normalize_year("Second Year"), Some(2));
        assert_eq!(normalize_year("3"), Some(3));
        assert_eq!(normalize_year("4th"), Some(4));
        assert_eq!(normalize_year("senior"), None);
        assert_eq!(normalize_year("0"), None);
    }

    #[test]
    fn test_branch_strength_keeps_order() {
        let data = "Year,Branch,Strength\n1st,cse,120\n1st,DSAI,60\n2nd,ECE,70\n";
        let table = CsvTable::parse(BRANCH_STRENGTH_FILE, data.as_bytes()).unwrap();
        let mut inputs = CalendarInputs::default();
        parse_branch_strength(&table, &mut inputs).unwrap();

        assert_eq!(inputs.years, vec![1, 2]);
        assert_eq!(inputs.branches_of(1), &["CSE".to_string(), "DSAI".to_string()]);
        assert_eq!(inputs.strength_of(2, "ECE"), 70);
        assert_eq!(inputs.strength_of(2, "CSE"), 0);
    }

    #[test]
    fn test_settings_require_all_keys() {
        let data = "SettingName,Value\nCreditsPerCourse,3\nTotalRooms,10\n";
        let table = CsvTable::parse(SETTINGS_FILE, data.as_bytes()).unwrap();
        let mut inputs = CalendarInputs::default();
        let err = parse_settings(&table, &mut inputs).unwrap_err();
        assert!(err.to_string().contains("MaxStudentsPerSlot"));
    }

    #[test]
    fn test_parse_all_reports_missing_file() {
        let files = HashMap::new();
        let err = parse_all(&files).unwrap_err();
        assert!(matches!(err, TimetableError::MissingInputError { file } if file == BRANCH_STRENGTH_FILE));
    }
}
