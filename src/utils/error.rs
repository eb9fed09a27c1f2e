use thiserror::Error;

#[derive(Error, Debug)]
pub enum SelectionError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid configuration value for '{field}': '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid selection procedure key provided: {key}")]
    UnknownProcedure { key: String },

    #[error("Invalid division '{division}' for procedure '{procedure}'")]
    UnknownDivision { procedure: String, division: String },

    #[error("Invalid apparatus provided: {value}")]
    UnknownApparatus { value: String },

    #[error("Misconfigured procedure '{procedure}': {message}")]
    MisconfiguredProcedure { procedure: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Configuration,
    Request,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl SelectionError {
    pub fn misconfigured(procedure: &str, message: impl Into<String>) -> Self {
        Self::MisconfiguredProcedure {
            procedure: procedure.to_string(),
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::IoError(_) | Self::CsvError(_) | Self::SerializationError(_) => {
                ErrorCategory::Input
            }
            Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. }
            | Self::MisconfiguredProcedure { .. } => ErrorCategory::Configuration,
            Self::UnknownProcedure { .. }
            | Self::UnknownDivision { .. }
            | Self::UnknownApparatus { .. } => ErrorCategory::Request,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Request => ErrorSeverity::Medium,
            ErrorCategory::Input => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::Critical,
        }
    }

    /// True for errors raised before any calculator runs because the caller asked for
    /// something that does not exist.
    pub fn is_invalid_request(&self) -> bool {
        self.category() == ErrorCategory::Request
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::IoError(e) => format!("Could not read or write a file: {}", e),
            Self::CsvError(e) => format!("The results file is not valid CSV: {}", e),
            Self::SerializationError(e) => format!("Could not serialize the rankings: {}", e),
            Self::UnknownProcedure { key } => format!("No selection procedure named '{}'", key),
            Self::UnknownDivision {
                procedure,
                division,
            } => format!("Procedure '{}' has no division '{}'", procedure, division),
            Self::UnknownApparatus { value } => format!(
                "'{}' is not an apparatus (expected trampoline, tumbling or double-mini)",
                value
            ),
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::IoError(_) => "Check that the file path exists and is readable",
            Self::CsvError(_) => "Check the CSV header row and that every score is numeric",
            Self::SerializationError(_) => "Try another output format",
            Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => "Fix the procedures file and run again",
            Self::MisconfiguredProcedure { .. } => {
                "Check the procedure's rules.calculator value and its rule parameters"
            }
            Self::UnknownProcedure { .. } => "Run with --list to see the configured procedures",
            Self::UnknownDivision { .. } => "Use one of the divisions listed for the procedure",
            Self::UnknownApparatus { .. } => "Use trampoline, tumbling or double-mini",
        }
    }
}

pub type Result<T> = std::result::Result<T, SelectionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_errors_are_classified_as_invalid_requests() {
        let err = SelectionError::UnknownApparatus {
            value: "rings".to_string(),
        };
        assert!(err.is_invalid_request());
        assert_eq!(err.severity(), ErrorSeverity::Medium);
        assert!(err.user_friendly_message().contains("rings"));
    }

    #[test]
    fn test_misconfiguration_is_critical() {
        let err = SelectionError::misconfigured("2025_edp", "no calculator registered");
        assert!(!err.is_invalid_request());
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert_eq!(
            err.to_string(),
            "Misconfigured procedure '2025_edp': no calculator registered"
        );
    }
}
