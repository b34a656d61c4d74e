use thiserror::Error;

#[derive(Error, Debug)]
pub enum SweepError {
    #[error("Unsupported resource type: {resource_type}")]
    UnsupportedResourceType { resource_type: String },

    #[error("Scanner already registered: {name}")]
    DuplicateScanner { name: String },

    #[error("Unknown scanner: {name}")]
    UnknownScanner { name: String },

    #[error("Invalid hours running: {hours}")]
    InvalidHoursRunning { hours: f64 },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Provider API error: {message}")]
    ProviderError { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Provider,
    Storage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl SweepError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SweepError::UnsupportedResourceType { .. }
            | SweepError::DuplicateScanner { .. }
            | SweepError::UnknownScanner { .. }
            | SweepError::InvalidHoursRunning { .. }
            | SweepError::ConfigError { .. }
            | SweepError::ConfigValidationError { .. }
            | SweepError::InvalidConfigValueError { .. }
            | SweepError::MissingConfigError { .. } => ErrorCategory::Configuration,
            SweepError::ProviderError { .. } => ErrorCategory::Provider,
            SweepError::IoError(_) | SweepError::SerializationError(_) | SweepError::CsvError(_) => {
                ErrorCategory::Storage
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Provider => ErrorSeverity::Medium,
            ErrorCategory::Storage => ErrorSeverity::Critical,
        }
    }

    /// 設定錯誤必須立即回報，不可重試或快取
    pub fn is_configuration(&self) -> bool {
        self.category() == ErrorCategory::Configuration
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            SweepError::UnsupportedResourceType { resource_type } => {
                format!("Resource type '{}' cannot be priced", resource_type)
            }
            SweepError::DuplicateScanner { name } => {
                format!("Two scanners share the name '{}'", name)
            }
            SweepError::UnknownScanner { name } => format!("No scanner named '{}'", name),
            SweepError::ProviderError { .. } => {
                "The cloud provider API could not be reached".to_string()
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            SweepError::UnsupportedResourceType { .. } => {
                "Use one of: EBS-Volumes, EC2, EBS-Snapshots, RDS, DynamoDB, EIP, LoadBalancer"
            }
            SweepError::UnknownScanner { .. } => "Run with --list-scanners to see available names",
            SweepError::DuplicateScanner { .. } => "Give every scanner a distinct argument name",
            SweepError::InvalidHoursRunning { .. } => "Hours running must be a non-negative number",
            SweepError::ConfigError { .. }
            | SweepError::ConfigValidationError { .. }
            | SweepError::InvalidConfigValueError { .. }
            | SweepError::MissingConfigError { .. } => "Check the configuration file and CLI flags",
            SweepError::ProviderError { .. } => "Check credentials and network access, then retry",
            SweepError::IoError(_) => "Check file permissions and available disk space",
            SweepError::SerializationError(_) | SweepError::CsvError(_) => {
                "The data could not be encoded; report this as a bug"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, SweepError>;
