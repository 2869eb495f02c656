use super::run_blocking;
use crate::config::schedule_config::ScheduleConfig;
use crate::core::class_reports::teacher_file_name;
use crate::core::class_scheduler::{self, ClassTimetable};
use crate::core::{Pipeline, Storage};
use crate::ingest::class_inputs::{self, ClassInputs, COURSES_FILE, ELECTIVES_FILE, ROOMS_FILE};
use crate::ingest::CsvTable;
use crate::utils::error::{Result, TimetableError};
use crate::utils::export::{sheet_to_csv, zip_entries};
use async_trait::async_trait;

pub const SNAPSHOT_FILE: &str = "timetable_all_departments.json";
pub const TEACHER_ZIP: &str = "teacher_timetables.zip";

/// Reads the class inputs from one storage and writes every report into
/// another.
pub struct ClassPipeline<S: Storage> {
    inputs: S,
    outputs: S,
    config: ScheduleConfig,
}

impl<S: Storage> ClassPipeline<S> {
    pub fn new(inputs: S, outputs: S, config: ScheduleConfig) -> Self {
        Self {
            inputs,
            outputs,
            config,
        }
    }

    async fn read_table(&self, file: &str) -> Result<CsvTable> {
        if !self.inputs.exists(file).await {
            return Err(TimetableError::MissingInputError {
                file: file.to_string(),
            });
        }
        let data = self.inputs.read_file(file).await?;
        CsvTable::parse(file, &data)
    }
}

#[async_trait]
impl<S: Storage> Pipeline for ClassPipeline<S> {
    type Input = ClassInputs;
    type Output = ClassTimetable;

    fn name(&self) -> &'static str {
        "class timetable"
    }

    async fn extract(&self) -> Result<ClassInputs> {
        let courses = class_inputs::parse_courses(&self.read_table(COURSES_FILE).await?)?;
        let rooms = class_inputs::parse_rooms(&self.read_table(ROOMS_FILE).await?)?;

        // 選修課檔案可省略
        let baskets = if self.inputs.exists(ELECTIVES_FILE).await {
            class_inputs::parse_electives(&self.read_table(ELECTIVES_FILE).await?)
        } else {
            tracing::info!("No {} uploaded, skipping elective baskets", ELECTIVES_FILE);
            Vec::new()
        };

        Ok(ClassInputs {
            courses,
            rooms,
            baskets,
        })
    }

    async fn transform(&self, input: ClassInputs) -> Result<ClassTimetable> {
        let config = self.config.clone();
        run_blocking(self.name(), move || class_scheduler::generate(&input, &config)).await
    }

    async fn load(&self, output: &ClassTimetable) -> Result<String> {
        // Section names change between runs; drop the previous sheets first.
        for stale in self.outputs.list_files("").await? {
            if stale.ends_with(".csv") {
                self.outputs.remove_file(&stale).await?;
            }
        }

        let workbook = output.workbook();
        for sheet in &workbook.sheets {
            self.outputs
                .write_file(&sheet.file_name(), &sheet_to_csv(sheet)?)
                .await?;
        }
        tracing::info!("📁 Wrote {} timetable sheets", workbook.sheets.len());

        let mut teacher_files = Vec::new();
        for sheet in output.faculty_sheets() {
            teacher_files.push((teacher_file_name(&sheet.name), sheet_to_csv(&sheet)?));
        }
        let bundle = zip_entries(teacher_files.iter().map(|(n, d)| (n.as_str(), d.as_slice())))?;
        self.outputs.write_file(TEACHER_ZIP, &bundle).await?;
        tracing::info!("👩‍🏫 Bundled {} faculty timetables", teacher_files.len());

        self.outputs
            .write_file(SNAPSHOT_FILE, &serde_json::to_vec_pretty(output)?)
            .await?;

        Ok(self.outputs.location(""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pipelines::mock::MockStorage;
    use crate::core::GenerationEngine;
    use std::io::Read;

    const COMBINED: &str = "Department,Semester,Course Code,Course Name,L,T,P,S,Faculty\n\
        DSAI,3,CS301,Data Structures,3,1,2,0,Dr. A\n\
        DSAI,3,CS302,Operating Systems,3,0,0,0,Dr. B\n";
    const ROOMS: &str = "roomNumber,type,capacity\nC101,LECTURE_ROOM,70\nC102,LECTURE_ROOM,70\nL1,COMPUTER_LAB,40\n";

    fn seeded() -> ScheduleConfig {
        ScheduleConfig {
            seed: Some(11),
            ..ScheduleConfig::default()
        }
    }

    #[tokio::test]
    async fn test_extract_without_elective_file() {
        let inputs = MockStorage::with_files(&[(COURSES_FILE, COMBINED), (ROOMS_FILE, ROOMS)]);
        let pipeline = ClassPipeline::new(inputs, MockStorage::default(), seeded());

        let parsed = pipeline.extract().await.unwrap();
        assert_eq!(parsed.courses.len(), 2);
        assert_eq!(parsed.rooms.len(), 3);
        assert!(parsed.baskets.is_empty());
    }

    #[tokio::test]
    async fn test_missing_rooms_file_is_reported() {
        let inputs = MockStorage::with_files(&[(COURSES_FILE, COMBINED)]);
        let pipeline = ClassPipeline::new(inputs, MockStorage::default(), seeded());

        let err = pipeline.extract().await.unwrap_err();
        assert!(matches!(err, TimetableError::MissingInputError { ref file } if file == ROOMS_FILE));
    }

    #[tokio::test]
    async fn test_run_writes_sheets_snapshot_and_teacher_zip() {
        let inputs = MockStorage::with_files(&[(COURSES_FILE, COMBINED), (ROOMS_FILE, ROOMS)]);
        let outputs = MockStorage::with_files(&[("Old_Section.csv", "stale")]);
        let engine = GenerationEngine::new(ClassPipeline::new(inputs, outputs.clone(), seeded()));

        let report = engine.run().await.unwrap();
        assert_eq!(report.location, "memory://");
        assert_eq!(report.output.section_titles(), vec!["DSAI_3".to_string()]);

        let files = outputs.list_files("").await.unwrap();
        assert!(!files.contains(&"Old_Section.csv".to_string()));
        assert!(files.contains(&"Overview.csv".to_string()));
        assert!(files.contains(&"DSAI_3.csv".to_string()));
        assert!(files.contains(&SNAPSHOT_FILE.to_string()));

        let snapshot: ClassTimetable =
            serde_json::from_slice(&outputs.get_file(SNAPSHOT_FILE).await.unwrap()).unwrap();
        assert_eq!(snapshot, report.output);

        let zip = outputs.get_file(TEACHER_ZIP).await.unwrap();
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(zip)).unwrap();
        let mut names: Vec<String> = archive.file_names().map(|s| s.to_string()).collect();
        names.sort();
        assert_eq!(names, vec!["Dr._A_timetable.csv", "Dr._B_timetable.csv"]);

        let mut text = String::new();
        archive
            .by_name("Dr._B_timetable.csv")
            .unwrap()
            .read_to_string(&mut text)
            .unwrap();
        assert!(text.contains("CS302 LEC"));
    }
}
