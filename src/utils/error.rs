use thiserror::Error;

#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("Retrieval failure: {message}")]
    RetrievalError { message: String },

    #[error("Profile picture upload failed: {message}")]
    PictureUploadError { message: String },

    #[error("Notification failed: {message}")]
    NotificationError { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Validation error on {field}: {message}")]
    ValidationError { field: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Retrieval,
    PictureUpload,
    Notification,
    Configuration,
    Validation,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ErrorCategory {
    pub fn severity(self) -> ErrorSeverity {
        match self {
            ErrorCategory::Validation => ErrorSeverity::Low,
            ErrorCategory::Retrieval
            | ErrorCategory::PictureUpload
            | ErrorCategory::Notification => ErrorSeverity::Medium,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Internal => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(self) -> &'static str {
        match self {
            ErrorCategory::Retrieval | ErrorCategory::PictureUpload => {
                "Check network connectivity and credentials, then try again"
            }
            ErrorCategory::Notification => "Verify the mail endpoint and API key",
            ErrorCategory::Configuration => "Fix the configuration file and run again",
            ErrorCategory::Validation => "Correct the highlighted field and resubmit",
            ErrorCategory::Internal => "Re-run with --verbose and inspect the logs",
        }
    }
}

impl DirectoryError {
    pub fn retrieval(message: impl std::fmt::Display) -> Self {
        Self::RetrievalError {
            message: message.to_string(),
        }
    }

    pub fn picture_upload(message: impl std::fmt::Display) -> Self {
        Self::PictureUploadError {
            message: message.to_string(),
        }
    }

    pub fn notification(message: impl std::fmt::Display) -> Self {
        Self::NotificationError {
            message: message.to_string(),
        }
    }

    pub fn validation(field: &str, message: impl std::fmt::Display) -> Self {
        Self::ValidationError {
            field: field.to_string(),
            message: message.to_string(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::RetrievalError { .. } => ErrorCategory::Retrieval,
            Self::PictureUploadError { .. } => ErrorCategory::PictureUpload,
            Self::NotificationError { .. } => ErrorCategory::Notification,
            Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorCategory::Configuration,
            Self::ValidationError { .. } => ErrorCategory::Validation,
            Self::IoError(_) | Self::SerializationError(_) => ErrorCategory::Internal,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        self.category().severity()
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::RetrievalError { .. } => {
                "Could not reach the donor directory. Check your internet connection.".to_string()
            }
            Self::PictureUploadError { .. } => {
                "The profile picture could not be uploaded. Your profile was not changed."
                    .to_string()
            }
            Self::NotificationError { .. } => "The donor could not be contacted.".to_string(),
            Self::ValidationError { field, message } => format!("Invalid {}: {}", field, message),
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        self.category().recovery_suggestion()
    }
}

pub type Result<T> = std::result::Result<T, DirectoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_error_categories() {
        assert_eq!(
            DirectoryError::retrieval("offline").category(),
            ErrorCategory::Retrieval
        );
        assert_eq!(
            DirectoryError::picture_upload("quota").category(),
            ErrorCategory::PictureUpload
        );
        assert_eq!(
            DirectoryError::MissingConfigError {
                field: "firestore".to_string()
            }
            .severity(),
            ErrorSeverity::High
        );
    }

    #[test]
    fn test_messages_are_human_readable() {
        let err = DirectoryError::retrieval("connection refused");
        assert_eq!(err.to_string(), "Retrieval failure: connection refused");
        assert!(err.user_friendly_message().contains("internet connection"));

        let err = DirectoryError::validation("email", "missing '@'");
        assert_eq!(err.user_friendly_message(), "Invalid email: missing '@'");
    }
}
