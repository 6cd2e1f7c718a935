use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("{tool} cannot be found")]
    ToolNotFound { tool: String, hint: String },

    #[error("{context}: `{command}` exited with {status}")]
    CommandFailed {
        context: String,
        command: String,
        status: String,
    },

    #[error("Failed to spawn `{command}`: {source}")]
    SpawnError {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unexpected generated output in {}: {message}", file.display())]
    FormatDrift { file: PathBuf, message: String },

    #[error("No symbol manifest for {}: {message}", module.display())]
    ManifestMissing { module: PathBuf, message: String },
}

/// 錯誤分類，對應建置流程的三種失敗來源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    ExternalProcess,
    PostProcessing,
}

impl BuildError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            BuildError::ToolNotFound { .. }
            | BuildError::ConfigError { .. }
            | BuildError::InvalidConfigValueError { .. }
            | BuildError::TomlError(_) => ErrorCategory::Configuration,
            BuildError::CommandFailed { .. } | BuildError::SpawnError { .. } => {
                ErrorCategory::ExternalProcess
            }
            BuildError::IoError(_)
            | BuildError::SerializationError(_)
            | BuildError::FormatDrift { .. }
            | BuildError::ManifestMissing { .. } => ErrorCategory::PostProcessing,
        }
    }

    /// 所有錯誤皆為致命錯誤，沒有部分成功的結束狀態
    pub fn exit_code(&self) -> i32 {
        1
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            BuildError::ToolNotFound { tool, .. } => {
                format!("{} cannot be found. Please make sure that it is installed.", tool)
            }
            BuildError::CommandFailed { context, status, .. } => {
                format!("{} ({})", context, status)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            BuildError::ToolNotFound { hint, .. } => hint.clone(),
            BuildError::CommandFailed { .. } => {
                "Check the compiler output above; fix the schema and re-run the build".to_string()
            }
            BuildError::SpawnError { .. } => {
                "Verify the tool path is executable by the current user".to_string()
            }
            BuildError::FormatDrift { .. } | BuildError::ManifestMissing { .. } => {
                "The code generator output format changed; check the installed protoc and plugin versions"
                    .to_string()
            }
            BuildError::TomlError(_) | BuildError::ConfigError { .. } => {
                "Check the configuration file syntax".to_string()
            }
            BuildError::InvalidConfigValueError { field, .. } => {
                format!("Correct the value of `{}`", field)
            }
            BuildError::IoError(_) | BuildError::SerializationError(_) => {
                "Check file permissions in the output directory".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, BuildError>;
