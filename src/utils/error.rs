use thiserror::Error;

#[derive(Error, Debug)]
pub enum PrimerError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Thread pool error: {0}")]
    ThreadPoolError(#[from] rayon::ThreadPoolBuildError),

    #[error("Task join error: {0}")]
    JoinError(#[from] tokio::task::JoinError),

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Sequential and parallel results differ at index {index} ({sequential} vs {parallel})")]
    ResultMismatch {
        index: usize,
        sequential: f64,
        parallel: f64,
    },

    #[error("Invalid task {task}: {reason}")]
    InvalidTask { task: String, reason: String },

    #[error("Arithmetic error in {operation}: {message}")]
    ArithmeticError { operation: String, message: String },

    #[error("Worker pool error: {message}")]
    WorkerPoolError { message: String },

    #[error("Rank {rank} is out of range for a world of size {size}")]
    InvalidRank { rank: usize, size: usize },

    #[error("Broadcast root {root} did not supply a value")]
    MissingBroadcastValue { root: usize },

    #[error("Rank {rank} is no longer reachable")]
    Disconnected { rank: usize },
}

pub type Result<T> = std::result::Result<T, PrimerError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Computation,
    Concurrency,
    Communication,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl PrimerError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            PrimerError::ConfigValidationError { .. }
            | PrimerError::InvalidConfigValueError { .. }
            | PrimerError::MissingConfigError { .. } => ErrorCategory::Configuration,
            PrimerError::ResultMismatch { .. }
            | PrimerError::InvalidTask { .. }
            | PrimerError::ArithmeticError { .. } => ErrorCategory::Computation,
            PrimerError::ThreadPoolError(_)
            | PrimerError::JoinError(_)
            | PrimerError::WorkerPoolError { .. } => ErrorCategory::Concurrency,
            PrimerError::InvalidRank { .. }
            | PrimerError::MissingBroadcastValue { .. }
            | PrimerError::Disconnected { .. }
            | PrimerError::SerializationError(_) => ErrorCategory::Communication,
            PrimerError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Computation => match self {
                PrimerError::ResultMismatch { .. } => ErrorSeverity::Critical,
                _ => ErrorSeverity::High,
            },
            ErrorCategory::Concurrency => ErrorSeverity::Medium,
            ErrorCategory::Communication => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            PrimerError::IoError(e) => format!("Could not read or write a file: {}", e),
            PrimerError::ConfigValidationError { field, message } => {
                format!("The configuration is not valid ({}): {}", field, message)
            }
            PrimerError::InvalidConfigValueError { field, reason, .. } => {
                format!("Setting '{}' is not valid: {}", field, reason)
            }
            PrimerError::MissingConfigError { field } => {
                format!("Setting '{}' is required", field)
            }
            PrimerError::ResultMismatch { .. } => {
                "The parallel result does not match the sequential baseline".to_string()
            }
            PrimerError::InvalidTask { task, reason } => {
                format!("Task '{}' could not run: {}", task, reason)
            }
            PrimerError::ArithmeticError { operation, .. } => {
                format!("The {} computation overflowed", operation)
            }
            PrimerError::WorkerPoolError { message } => {
                format!("The worker pool stopped early: {}", message)
            }
            PrimerError::InvalidRank { rank, size } => {
                format!("Rank {} does not exist in a world of {} ranks", rank, size)
            }
            PrimerError::MissingBroadcastValue { root } => {
                format!("Rank {} must provide the value to broadcast", root)
            }
            PrimerError::Disconnected { rank } => {
                format!("Rank {} exited before the exchange completed", rank)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => {
                "Check the TOML file and command-line flags against the documented defaults"
            }
            ErrorCategory::Computation => match self {
                PrimerError::ArithmeticError { .. } => "Use a smaller task input",
                _ => "Re-run with --verbose to see which step produced the bad value",
            },
            ErrorCategory::Concurrency => "Try again with fewer workers",
            ErrorCategory::Communication => {
                "Make sure every rank takes part in each collective and ranks are below the world size"
            }
            ErrorCategory::System => "Check file permissions and available disk space",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories_and_severity() {
        let err = PrimerError::InvalidRank { rank: 5, size: 4 };
        assert_eq!(err.category(), ErrorCategory::Communication);
        assert_eq!(err.severity(), ErrorSeverity::High);

        let err = PrimerError::ResultMismatch {
            index: 3,
            sequential: 1.0,
            parallel: 2.0,
        };
        assert_eq!(err.category(), ErrorCategory::Computation);
        assert_eq!(err.severity(), ErrorSeverity::Critical);

        let err = PrimerError::WorkerPoolError {
            message: "closed".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Medium);
    }

    #[test]
    fn test_user_friendly_message() {
        let err = PrimerError::InvalidConfigValueError {
            field: "data.workers".to_string(),
            value: "0".to_string(),
            reason: "Value must be at least 1".to_string(),
        };
        assert_eq!(
            err.user_friendly_message(),
            "Setting 'data.workers' is not valid: Value must be at least 1"
        );
        assert!(!err.recovery_suggestion().is_empty());
    }
}
