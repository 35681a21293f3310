use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error("Invalid {kind} value {value}: {reason}")]
    InvalidPeriod {
        kind: String,
        value: u32,
        reason: String,
    },

    #[error("Service '{service}' has no source repository mapping")]
    UnmappedService { service: String },

    #[error("Could not fetch release log from {host}: {message}")]
    RemoteFetch { host: String, message: String },

    #[error("{service} responded with status {status}: {message}")]
    ExternalService {
        service: String,
        status: u16,
        message: String,
    },

    #[error("{operation} timed out after {seconds}s")]
    Timeout { operation: String, seconds: u64 },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

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

    #[error("Missing required configuration '{field}'")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Configuration,
    Remote,
    External,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ReleaseError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ReleaseError::InvalidPeriod { .. } | ReleaseError::UnmappedService { .. } => {
                ErrorCategory::Input
            }
            ReleaseError::ConfigError { .. }
            | ReleaseError::ConfigValidationError { .. }
            | ReleaseError::InvalidConfigValueError { .. }
            | ReleaseError::MissingConfigError { .. } => ErrorCategory::Configuration,
            ReleaseError::RemoteFetch { .. } => ErrorCategory::Remote,
            ReleaseError::ExternalService { .. }
            | ReleaseError::Timeout { .. }
            | ReleaseError::Http(_) => ErrorCategory::External,
            ReleaseError::Io(_) | ReleaseError::Serialization(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input | ErrorCategory::Configuration => ErrorSeverity::High,
            // 遠端服務錯誤通常可以重跑
            ErrorCategory::Remote | ErrorCategory::External => ErrorSeverity::Medium,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// 對應嚴重程度的結束代碼，錯誤永遠不會回傳 0
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low | ErrorSeverity::High => 1,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::Critical => 3,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            ReleaseError::InvalidPeriod { kind, .. } => match kind.as_str() {
                "year" => "Use one of the years listed in [labels].allowed_years".to_string(),
                "month" => "Months must be between 1 and 12".to_string(),
                _ => "Weeks must be between 1 and 52".to_string(),
            },
            ReleaseError::UnmappedService { service } => format!(
                "Add '{}' to the [services] table of the configuration file",
                service
            ),
            ReleaseError::RemoteFetch { .. } => {
                "Check the username, the private key path and that the build host is reachable"
                    .to_string()
            }
            ReleaseError::ExternalService { status, .. } if *status == 401 || *status == 403 => {
                "Check the API credentials exported for the configuration file".to_string()
            }
            ReleaseError::ExternalService { .. } | ReleaseError::Http(_) => {
                "Check the service URL and retry; re-running is safe".to_string()
            }
            ReleaseError::Timeout { .. } => {
                "Increase [http].timeout_seconds or retry later".to_string()
            }
            ReleaseError::Io(_) => "Check that the file exists and is readable".to_string(),
            ReleaseError::Serialization(_) => {
                "Check that the manifest is valid JSON with a 'deployment' list".to_string()
            }
            ReleaseError::ConfigError { .. }
            | ReleaseError::ConfigValidationError { .. }
            | ReleaseError::InvalidConfigValueError { .. }
            | ReleaseError::MissingConfigError { .. } => {
                "Fix the configuration file and run again".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ReleaseError::InvalidPeriod { kind, .. } => match kind.as_str() {
                "year" => "This is not a valid year".to_string(),
                "month" => "This is not a valid month".to_string(),
                _ => "This is not a valid work week".to_string(),
            },
            ReleaseError::ExternalService {
                service, status, ..
            } => format!("[ERROR] {} response code: {}", service, status),
            other => format!("[ERROR] {}", other),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReleaseError>;
