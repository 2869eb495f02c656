use crate::adapters::LocalStorage;
use crate::app::pipelines::class_pipeline::SNAPSHOT_FILE;
use crate::app::pipelines::exam_calendar_pipeline;
use crate::config::schedule_config::ScheduleConfig;
use crate::config::server_config::ServerConfig;
use crate::core::class_scheduler::ClassTimetable;
use crate::core::Storage;
use crate::domain::model::Workbook;
use crate::utils::error::Result;
use crate::web::auth::{Credentials, SessionStore};
use crate::web::pages::Pages;
use chrono::NaiveDate;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Shared state of the class timetable server.
pub struct ClassState {
    pub inputs: LocalStorage,
    pub outputs: LocalStorage,
    pub config_path: PathBuf,
    pub schedule: RwLock<ScheduleConfig>,
    pub timetable: RwLock<Option<ClassTimetable>>,
    /// Held for the whole of a generation run.
    pub generation: Mutex<()>,
    pub pages: Pages,
    pub monitor: bool,
}

impl ClassState {
    pub async fn new(config: &ServerConfig, monitor: bool) -> Result<Arc<Self>> {
        let paths = &config.paths;
        let outputs = LocalStorage::new(&paths.class_outputs);

        let timetable = if outputs.exists(SNAPSHOT_FILE).await {
            match serde_json::from_slice(&outputs.read_file(SNAPSHOT_FILE).await?) {
                Ok(snapshot) => Some(snapshot),
                Err(e) => {
                    tracing::warn!("⚠️ Ignoring unreadable {}: {}", SNAPSHOT_FILE, e);
                    None
                }
            }
        } else {
            None
        };

        Ok(Arc::new(Self {
            inputs: LocalStorage::new(&paths.class_inputs),
            outputs,
            config_path: paths.schedule_config.clone(),
            schedule: RwLock::new(ScheduleConfig::load(&paths.schedule_config).await?),
            timetable: RwLock::new(timetable),
            generation: Mutex::new(()),
            pages: Pages::new()?,
            monitor,
        }))
    }
}

/// Shared state of the exam timetable server.
pub struct ExamState {
    pub calendar: LocalStorage,
    pub seating: LocalStorage,
    pub credentials: Credentials,
    pub sessions: SessionStore,
    pub workbook: RwLock<Option<Workbook>>,
    pub generation: Mutex<()>,
    pub holidays: Vec<NaiveDate>,
    pub seats_per_room: u32,
    pub pages: Pages,
    pub monitor: bool,
}

impl ExamState {
    pub async fn new(config: &ServerConfig, monitor: bool) -> Result<Arc<Self>> {
        let calendar = LocalStorage::new(&config.paths.exam_workdir);
        let workbook = exam_calendar_pipeline::load_workbook(&calendar)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("⚠️ Ignoring saved exam calendar: {}", e);
                None
            });

        Ok(Arc::new(Self {
            calendar,
            seating: LocalStorage::new(&config.paths.seating_workdir),
            credentials: Credentials::from_config(&config.auth),
            sessions: SessionStore::default(),
            workbook: RwLock::new(workbook),
            generation: Mutex::new(()),
            holidays: config.calendar.holidays.clone(),
            seats_per_room: config.calendar.seats_per_room,
            pages: Pages::new()?,
            monitor,
        }))
    }
}
