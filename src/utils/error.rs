use thiserror::Error;

#[derive(Error, Debug)]
pub enum TimetableError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Template error: {0}")]
    TemplateError(#[from] handlebars::TemplateError),

    #[error("Render error: {0}")]
    RenderError(#[from] handlebars::RenderError),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required setting: {field}")]
    MissingConfigError { field: String },

    #[error("Missing input file: {file}")]
    MissingInputError { file: String },

    #[error("Invalid input in {file} (row {row}): {message}")]
    InvalidInputError {
        file: String,
        row: usize,
        message: String,
    },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Processing,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl TimetableError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. }
            | Self::TomlError(_) => ErrorCategory::Configuration,
            Self::MissingInputError { .. }
            | Self::InvalidInputError { .. }
            | Self::CsvError(_)
            | Self::ValidationError { .. } => ErrorCategory::Input,
            Self::ProcessingError { .. }
            | Self::SerializationError(_)
            | Self::TemplateError(_)
            | Self::RenderError(_) => ErrorCategory::Processing,
            Self::IoError(_) | Self::ZipError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Processing => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            Self::MissingInputError { file } => {
                format!("Upload '{}' before generating", file)
            }
            Self::InvalidInputError { file, row, .. } => {
                format!("Fix row {} of '{}' and upload it again", row, file)
            }
            Self::CsvError(_) => "Check that the upload is a comma-separated file with a header row".to_string(),
            Self::InvalidConfigValueError { field, .. } | Self::MissingConfigError { field } => {
                format!("Review the '{}' setting", field)
            }
            Self::ConfigError { .. } | Self::TomlError(_) => {
                "Check the configuration file syntax".to_string()
            }
            Self::ValidationError { .. } => "Correct the submitted values and retry".to_string(),
            Self::IoError(_) | Self::ZipError(_) => {
                "Check that the input and output directories exist and are writable".to_string()
            }
            Self::ProcessingError { .. }
            | Self::SerializationError(_)
            | Self::TemplateError(_)
            | Self::RenderError(_) => "Retry the generation; if it persists, inspect the logs".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Input => format!("Input problem: {}", self),
            ErrorCategory::Processing => format!("Timetable generation failed: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }

    pub fn processing(message: impl Into<String>) -> Self {
        Self::ProcessingError {
            message: message.into(),
        }
    }

    pub fn invalid_input(file: &str, row: usize, message: impl Into<String>) -> Self {
        Self::InvalidInputError {
            file: file.to_string(),
            row,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TimetableError>;
