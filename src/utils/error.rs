use thiserror::Error;

#[derive(Error, Debug)]
pub enum NavError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("API returned status {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Unknown {kind} id {id}")]
    UnknownEntity { kind: &'static str, id: u64 },

    #[error("Unknown price field: {name}")]
    UnknownField { name: String },

    #[error("Invalid price value '{value}': {reason}")]
    InvalidPriceValue { value: String, reason: String },
}

/// 錯誤分類，對應導航引擎的錯誤處理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Configuration,
    Data,
    Input,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl NavError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            NavError::ApiError(_) | NavError::HttpStatus { .. } => ErrorCategory::Network,
            NavError::ConfigError { .. }
            | NavError::ConfigValidationError { .. }
            | NavError::InvalidConfigValueError { .. }
            | NavError::MissingConfigError { .. } => ErrorCategory::Configuration,
            NavError::IoError(_) | NavError::SerializationError(_) => ErrorCategory::Data,
            NavError::UnknownEntity { .. }
            | NavError::UnknownField { .. }
            | NavError::InvalidPriceValue { .. } => ErrorCategory::Input,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input => ErrorSeverity::Low,
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::Critical,
        }
    }

    pub fn is_network_failure(&self) -> bool {
        self.category() == ErrorCategory::Network
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            NavError::ApiError(e) if e.is_timeout() => {
                "The server did not answer in time".to_string()
            }
            NavError::ApiError(_) => "Network error while talking to the server".to_string(),
            NavError::HttpStatus { status, .. } => {
                format!("The server rejected the request (HTTP {})", status)
            }
            NavError::SerializationError(_) => "The server sent data in an unexpected format".to_string(),
            NavError::IoError(e) => format!("File error: {}", e),
            NavError::UnknownEntity { kind, id } => format!("No {} with id {} is loaded", kind, id),
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => "Check the backend URL and connectivity, then select the area again to retry",
            ErrorCategory::Configuration => "Fix the configuration file or command line options",
            ErrorCategory::Data => "Verify the backend response format",
            ErrorCategory::Input => "Pick an entity from the currently loaded level",
        }
    }
}

pub type Result<T> = std::result::Result<T, NavError>;
