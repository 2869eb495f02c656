use super::run_blocking;
use crate::core::exam_seating::{
    self, SeatingParams, SeatingPlan, CONFIG_FILE, SCHEDULE_FILE, UNSCHEDULED_FILE,
};
use crate::core::{Pipeline, Storage};
use crate::ingest::seating_inputs::{self, ExamRoom, RosterCourse};
use crate::ingest::CsvTable;
use crate::utils::error::{Result, TimetableError};
use crate::utils::export::sheet_to_csv;
use async_trait::async_trait;

/// Stored names of the uploaded seating files. Roster order decides the year.
#[derive(Debug, Clone, Default)]
pub struct SeatingFiles {
    pub courses: Vec<String>,
    pub rooms: String,
    pub faculty: String,
}

#[derive(Debug, Clone)]
pub struct SeatingInputs {
    pub courses: Vec<RosterCourse>,
    pub rooms: Vec<ExamRoom>,
    pub faculty: Vec<String>,
}

pub struct SeatingPipeline<S: Storage> {
    storage: S,
    files: SeatingFiles,
    params: SeatingParams,
}

impl<S: Storage> SeatingPipeline<S> {
    pub fn new(storage: S, files: SeatingFiles, params: SeatingParams) -> Self {
        Self {
            storage,
            files,
            params,
        }
    }

    async fn read_table(&self, file: &str) -> Result<CsvTable> {
        if !self.storage.exists(file).await {
            return Err(TimetableError::MissingInputError {
                file: file.to_string(),
            });
        }
        CsvTable::parse(file, &self.storage.read_file(file).await?)
    }
}

#[async_trait]
impl<S: Storage> Pipeline for SeatingPipeline<S> {
    type Input = SeatingInputs;
    type Output = SeatingPlan;

    fn name(&self) -> &'static str {
        "exam seating"
    }

    async fn extract(&self) -> Result<SeatingInputs> {
        if self.files.courses.is_empty() {
            return Err(TimetableError::MissingInputError {
                file: "courses_file".to_string(),
            });
        }

        let mut courses = Vec::new();
        for (index, file) in self.files.courses.iter().enumerate() {
            let roster = seating_inputs::parse_roster(&self.read_table(file).await?, index as u32 + 1);
            tracing::info!("📚 {}: {} courses", file, roster.len());
            courses.extend(roster);
        }

        let rooms = seating_inputs::parse_exam_rooms(&self.read_table(&self.files.rooms).await?)?;
        let faculty = seating_inputs::parse_faculty_column(&self.read_table(&self.files.faculty).await?);

        Ok(SeatingInputs {
            courses,
            rooms,
            faculty,
        })
    }

    async fn transform(&self, input: SeatingInputs) -> Result<SeatingPlan> {
        let params = self.params.clone();
        let plan = run_blocking(self.name(), move || {
            exam_seating::generate(&input.courses, &input.rooms, &input.faculty, &params)
        })
        .await?;

        for violation in &plan.violations {
            tracing::warn!("⚠️ {}", violation);
        }
        Ok(plan)
    }

    async fn load(&self, output: &SeatingPlan) -> Result<String> {
        self.storage
            .write_file(SCHEDULE_FILE, &sheet_to_csv(&output.schedule_sheet())?)
            .await?;
        self.storage
            .write_file(CONFIG_FILE, &serde_json::to_vec_pretty(&output.config)?)
            .await?;

        if output.unscheduled.is_empty() {
            self.storage.remove_file(UNSCHEDULED_FILE).await?;
        } else {
            self.storage
                .write_file(UNSCHEDULED_FILE, &sheet_to_csv(&output.unscheduled_sheet())?)
                .await?;
        }

        tracing::info!(
            "📁 Seated {} courses, {} unscheduled",
            output.scheduled_courses(),
            output.unscheduled.len()
        );
        Ok(self.storage.location(SCHEDULE_FILE))
    }
}
