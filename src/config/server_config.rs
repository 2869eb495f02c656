use crate::utils::error::{Result, TimetableError};
use crate::utils::validation::{self, Validate};
use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub server: ServerSection,
    pub paths: PathsSection,
    pub auth: AuthSection,
    pub calendar: CalendarSection,
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub host: String,
    pub class_port: u16,
    pub exam_port: u16,
    pub class_max_upload_mb: usize,
    pub exam_max_upload_mb: usize,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            class_port: 5000,
            exam_port: 5001,
            class_max_upload_mb: 50,
            exam_max_upload_mb: 16,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsSection {
    pub class_inputs: PathBuf,
    pub class_outputs: PathBuf,
    pub schedule_config: PathBuf,
    pub exam_workdir: PathBuf,
    pub seating_workdir: PathBuf,
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            class_inputs: PathBuf::from("inputs"),
            class_outputs: PathBuf::from("outputs"),
            schedule_config: PathBuf::from("config.json"),
            exam_workdir: PathBuf::from("uploads"),
            seating_workdir: PathBuf::from("uploadsExam"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSection {
    pub admin_username: String,
    pub admin_password: String,
    pub viewer_username: String,
    pub viewer_password: String,
}

const DEFAULT_ADMIN_PASSWORD: &str = "admin123";
const DEFAULT_VIEWER_PASSWORD: &str = "view123";

impl Default for AuthSection {
    fn default() -> Self {
        Self {
            admin_username: "admin".to_string(),
            admin_password: DEFAULT_ADMIN_PASSWORD.to_string(),
            viewer_username: "view".to_string(),
            viewer_password: DEFAULT_VIEWER_PASSWORD.to_string(),
        }
    }
}

impl AuthSection {
    pub fn uses_default_passwords(&self) -> bool {
        self.admin_password == DEFAULT_ADMIN_PASSWORD || self.viewer_password == DEFAULT_VIEWER_PASSWORD
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarSection {
    pub holidays: Vec<NaiveDate>,
    pub seats_per_room: u32,
}

impl Default for CalendarSection {
    fn default() -> Self {
        Self {
            holidays: Vec::new(),
            seats_per_room: 48,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    pub json: bool,
}

impl ServerConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content)?;
        let config: Self = toml::from_str(&processed)?;
        Ok(config)
    }

    /// 替換環境變數 (例如 ${ADMIN_PASSWORD})
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| TimetableError::ConfigError {
            message: format!("env substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn class_body_limit(&self) -> usize {
        self.server.class_max_upload_mb * 1024 * 1024
    }

    pub fn exam_body_limit(&self) -> usize {
        self.server.exam_max_upload_mb * 1024 * 1024
    }

    pub fn warn_on_default_credentials(&self) {
        if self.auth.uses_default_passwords() {
            tracing::warn!("⚠️ Default exam server passwords are in use; set [auth] in the server config");
        }
    }
}

impl Validate for ServerConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("server.host", &self.server.host)?;
        validation::validate_positive_number("server.class_port", self.server.class_port as usize, 1)?;
        validation::validate_positive_number("server.exam_port", self.server.exam_port as usize, 1)?;
        if self.server.class_port == self.server.exam_port {
            return Err(TimetableError::InvalidConfigValueError {
                field: "server.exam_port".to_string(),
                value: self.server.exam_port.to_string(),
                reason: "class and exam servers need different ports".to_string(),
            });
        }
        validation::validate_range("server.class_max_upload_mb", self.server.class_max_upload_mb, 1, 1024)?;
        validation::validate_range("server.exam_max_upload_mb", self.server.exam_max_upload_mb, 1, 1024)?;

        for (field, path) in [
            ("paths.class_inputs", &self.paths.class_inputs),
            ("paths.class_outputs", &self.paths.class_outputs),
            ("paths.schedule_config", &self.paths.schedule_config),
            ("paths.exam_workdir", &self.paths.exam_workdir),
            ("paths.seating_workdir", &self.paths.seating_workdir),
        ] {
            validation::validate_path(field, &path.to_string_lossy())?;
        }

        validation::validate_non_empty_string("auth.admin_username", &self.auth.admin_username)?;
        validation::validate_non_empty_string("auth.viewer_username", &self.auth.viewer_username)?;
        validation::validate_non_empty_string("auth.admin_password", &self.auth.admin_password)?;
        validation::validate_non_empty_string("auth.viewer_password", &self.auth.viewer_password)?;
        validation::validate_positive_number(
            "calendar.seats_per_room",
            self.calendar.seats_per_room as usize,
            1,
        )?;
        Ok(())
    }
}
