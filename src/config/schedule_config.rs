use crate::domain::model::TimeSlot;
use crate::utils::error::{Result, TimetableError};
use crate::utils::validation::{self, Validate};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Class timetable settings, stored as `config.json` and edited from the web UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub days: Vec<String>,
    #[serde(rename = "LECTURE_MIN")]
    pub lecture_min: u32,
    #[serde(rename = "LAB_MIN")]
    pub lab_min: u32,
    #[serde(rename = "TUTORIAL_MIN")]
    pub tutorial_min: u32,
    #[serde(rename = "SELF_STUDY_MIN")]
    pub self_study_min: u32,
    #[serde(rename = "MORNING_BREAK_START")]
    pub morning_break_start: String,
    #[serde(rename = "MORNING_BREAK_END")]
    pub morning_break_end: String,
    #[serde(rename = "LUNCH_BREAK_START")]
    pub lunch_break_start: String,
    #[serde(rename = "LUNCH_BREAK_END")]
    pub lunch_break_end: String,
    #[serde(rename = "LECTURE_TUTORIAL_BREAK_START")]
    pub lecture_tutorial_break_start: String,
    #[serde(rename = "LECTURE_TUTORIAL_BREAK_END")]
    pub lecture_tutorial_break_end: String,
    #[serde(rename = "TIME_SLOTS")]
    pub time_slots: Vec<(String, String)>,
    #[serde(rename = "USE_CUSTOM_SLOTS")]
    pub use_custom_slots: bool,
    /// department -> semesters that are taught as sections A and B
    #[serde(rename = "SPLIT_SECTIONS")]
    pub split_sections: BTreeMap<String, Vec<u32>>,
    #[serde(rename = "BASKET_DEPARTMENTS")]
    pub basket_departments: Vec<String>,
    #[serde(rename = "BASKET_LECTURES")]
    pub basket_lectures: u32,
    #[serde(rename = "BASKET_TUTORIALS")]
    pub basket_tutorials: u32,
    #[serde(rename = "SEED", skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

const DEFAULT_SLOTS: [(&str, &str); 24] = [
    ("07:30", "09:00"),
    ("09:00", "09:30"),
    ("09:30", "10:00"),
    ("10:00", "10:30"),
    ("10:30", "10:45"),
    ("10:45", "11:00"),
    ("11:00", "11:30"),
    ("11:30", "12:00"),
    ("12:00", "12:15"),
    ("12:15", "12:30"),
    ("12:30", "13:00"),
    ("13:00", "13:30"),
    ("13:30", "14:00"),
    ("14:00", "14:30"),
    ("14:30", "15:00"),
    ("15:00", "15:30"),
    ("15:30", "15:40"),
    ("15:40", "16:00"),
    ("16:00", "16:30"),
    ("16:30", "17:00"),
    ("17:00", "17:30"),
    ("17:30", "18:00"),
    ("18:00", "18:30"),
    ("18:30", "23:59"),
];

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            days: ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday"]
                .iter()
                .map(|d| d.to_string())
                .collect(),
            lecture_min: 90,
            lab_min: 120,
            tutorial_min: 60,
            self_study_min: 60,
            morning_break_start: "10:30".to_string(),
            morning_break_end: "10:45".to_string(),
            lunch_break_start: "13:00".to_string(),
            lunch_break_end: "13:45".to_string(),
            lecture_tutorial_break_start: "15:30".to_string(),
            lecture_tutorial_break_end: "15:40".to_string(),
            time_slots: DEFAULT_SLOTS
                .iter()
                .map(|(s, e)| (s.to_string(), e.to_string()))
                .collect(),
            use_custom_slots: false,
            split_sections: BTreeMap::from([("CSE".to_string(), vec![1, 3, 5])]),
            basket_departments: vec!["CSE".to_string(), "DSAI".to_string(), "ECE".to_string()],
            basket_lectures: 2,
            basket_tutorials: 1,
            seed: None,
        }
    }
}

/// Break windows resolved to clock times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakWindows {
    pub morning: (NaiveTime, NaiveTime),
    pub lunch: (NaiveTime, NaiveTime),
    pub lecture_tutorial: (NaiveTime, NaiveTime),
}

impl ScheduleConfig {
    /// Missing file means defaults.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            tracing::info!("Using default schedule configuration ({} not found)", path.display());
            return Ok(Self::default());
        }
        let content = tokio::fs::read_to_string(path).await?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        tracing::info!("✓ Loaded schedule configuration from {}", path.display());
        Ok(config)
    }

    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(path, serde_json::to_string_pretty(self)?).await?;
        Ok(())
    }

    /// Overlays the keys present in `patch`; everything else keeps its value.
    pub fn merged(&self, patch: &serde_json::Value) -> Result<Self> {
        let patch = patch.as_object().ok_or_else(|| TimetableError::ValidationError {
            message: "configuration update must be a JSON object".to_string(),
        })?;

        let mut current = serde_json::to_value(self)?;
        if let Some(obj) = current.as_object_mut() {
            for (key, value) in patch {
                obj.insert(key.clone(), value.clone());
            }
        }

        let merged: Self = serde_json::from_value(current).map_err(|e| {
            TimetableError::ValidationError {
                message: format!("invalid configuration: {}", e),
            }
        })?;
        merged.validate()?;
        Ok(merged)
    }

    /// Parsed `TIME_SLOTS`; unparsable pairs are skipped and an empty result
    /// falls back to four 90-minute slots.
    pub fn time_slots(&self) -> Vec<TimeSlot> {
        let parse = |s: &str| NaiveTime::parse_from_str(s.trim(), "%H:%M").ok();
        let slots: Vec<TimeSlot> = self
            .time_slots
            .iter()
            .filter_map(|(s, e)| Some(TimeSlot::new(parse(s)?, parse(e)?)))
            .collect();

        if !slots.is_empty() {
            return slots;
        }

        tracing::warn!("⚠️ No usable TIME_SLOTS, falling back to four 90-minute slots");
        [(9, 0, 10, 30), (11, 0, 12, 30), (14, 0, 15, 30), (16, 0, 17, 30)]
            .iter()
            .filter_map(|&(sh, sm, eh, em)| {
                Some(TimeSlot::new(
                    NaiveTime::from_hms_opt(sh, sm, 0)?,
                    NaiveTime::from_hms_opt(eh, em, 0)?,
                ))
            })
            .collect()
    }

    pub fn breaks(&self) -> Result<BreakWindows> {
        let window = |field: &str, start: &str, end: &str| -> Result<(NaiveTime, NaiveTime)> {
            Ok((
                validation::parse_clock(&format!("{}_START", field), start)?,
                validation::parse_clock(&format!("{}_END", field), end)?,
            ))
        };
        Ok(BreakWindows {
            morning: window("MORNING_BREAK", &self.morning_break_start, &self.morning_break_end)?,
            lunch: window("LUNCH_BREAK", &self.lunch_break_start, &self.lunch_break_end)?,
            lecture_tutorial: window(
                "LECTURE_TUTORIAL_BREAK",
                &self.lecture_tutorial_break_start,
                &self.lecture_tutorial_break_end,
            )?,
        })
    }

    pub fn is_split(&self, department: &str, semester: u32) -> bool {
        self.split_sections
            .iter()
            .any(|(dept, sems)| dept.eq_ignore_ascii_case(department.trim()) && sems.contains(&semester))
    }

    pub fn is_basket_department(&self, department: &str) -> bool {
        self.basket_departments
            .iter()
            .any(|d| d.eq_ignore_ascii_case(department.trim()))
    }
}

impl Validate for ScheduleConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_positive_number("days", self.days.len(), 1)?;
        for day in &self.days {
            validation::validate_non_empty_string("days", day)?;
        }
        validation::validate_range("LECTURE_MIN", self.lecture_min, 1, 600)?;
        validation::validate_range("LAB_MIN", self.lab_min, 1, 600)?;
        validation::validate_range("TUTORIAL_MIN", self.tutorial_min, 1, 600)?;
        validation::validate_range("SELF_STUDY_MIN", self.self_study_min, 1, 600)?;
        self.breaks()?;
        for (start, end) in &self.time_slots {
            validation::parse_clock("TIME_SLOTS", start)?;
            validation::parse_clock("TIME_SLOTS", end)?;
        }
        Ok(())
    }
}
