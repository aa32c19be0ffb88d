use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(String),

    /// Required columns are missing or hold values of the wrong type
    #[error("Schema error: {0}")]
    Schema(String),

    /// Timestamps are not strictly increasing
    #[error("Ordering violation at row {index}: open_time {open_time} after {previous}")]
    OrderingViolation {
        index: usize,
        previous: i64,
        open_time: i64,
    },

    /// A sentinel value survived interpolation in the interior of a series
    #[error("Integrity error: {0}")]
    Integrity(String),

    #[error("{0}")]
    Other(String),
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        match err.kind() {
            csv::ErrorKind::Deserialize { .. } | csv::ErrorKind::UnequalLengths { .. } => {
                AppError::Schema(format!("CSV error: {}", err))
            }
            _ => AppError::Io(format!("CSV error: {}", err)),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

// Alias for convenience
pub type Error = AppError;
