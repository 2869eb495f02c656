use super::run_blocking;
use crate::core::exam_calendar::{self, CalendarParams, ExamCalendar};
use crate::core::{Pipeline, Storage};
use crate::domain::model::Workbook;
use crate::ingest::calendar_inputs::{self, CalendarInputs, CALENDAR_FILES};
use crate::utils::error::Result;
use crate::utils::export::sheet_to_csv;
use async_trait::async_trait;
use std::collections::HashMap;

pub const OUTPUT_DIR: &str = "output";
pub const WORKBOOK_FILE: &str = "output/exam_schedule.json";

/// Generates the exam calendar from the eight uploaded CSVs in one working
/// directory and writes the sheets under `output/`.
pub struct ExamCalendarPipeline<S: Storage> {
    storage: S,
    params: CalendarParams,
}

impl<S: Storage> ExamCalendarPipeline<S> {
    pub fn new(storage: S, params: CalendarParams) -> Self {
        Self { storage, params }
    }
}

/// Reads the last persisted calendar workbook, if any.
pub async fn load_workbook<S: Storage>(storage: &S) -> Result<Option<Workbook>> {
    if !storage.exists(WORKBOOK_FILE).await {
        return Ok(None);
    }
    let data = storage.read_file(WORKBOOK_FILE).await?;
    Ok(Some(serde_json::from_slice(&data)?))
}

/// Persists the workbook JSON and one CSV per sheet.
pub async fn save_workbook<S: Storage>(storage: &S, workbook: &Workbook) -> Result<()> {
    for stale in storage.list_files(OUTPUT_DIR).await? {
        if stale.ends_with(".csv") {
            storage.remove_file(&format!("{}/{}", OUTPUT_DIR, stale)).await?;
        }
    }
    for sheet in &workbook.sheets {
        let path = format!("{}/{}", OUTPUT_DIR, sheet.file_name());
        storage.write_file(&path, &sheet_to_csv(sheet)?).await?;
    }
    storage
        .write_file(WORKBOOK_FILE, &serde_json::to_vec_pretty(workbook)?)
        .await
}

#[async_trait]
impl<S: Storage> Pipeline for ExamCalendarPipeline<S> {
    type Input = CalendarInputs;
    type Output = ExamCalendar;

    fn name(&self) -> &'static str {
        "exam calendar"
    }

    async fn extract(&self) -> Result<CalendarInputs> {
        let mut files = HashMap::new();
        for (_, file) in CALENDAR_FILES {
            // 缺少的檔案交給 parse_all 回報
            if self.storage.exists(file).await {
                files.insert(file.to_string(), self.storage.read_file(file).await?);
            }
        }
        calendar_inputs::parse_all(&files)
    }

    async fn transform(&self, input: CalendarInputs) -> Result<ExamCalendar> {
        let params = self.params.clone();
        run_blocking(self.name(), move || exam_calendar::generate(&input, &params)).await
    }

    async fn load(&self, output: &ExamCalendar) -> Result<String> {
        save_workbook(&self.storage, &output.workbook).await?;
        tracing::info!("📁 Saved {} calendar sheets", output.workbook.sheets.len());
        Ok(self.storage.location(OUTPUT_DIR))
    }
}
