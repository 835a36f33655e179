use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Error: {0}")]
    Anyhow(#[from] anyhow::Error),

    #[error("Calendar error: {0}")]
    Calendar(String),

    #[error("Notification error: {0}")]
    Notification(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl AppError {
    pub fn calendar<S: Into<String>>(msg: S) -> Self {
        Self::Calendar(msg.into())
    }

    pub fn notification<S: Into<String>>(msg: S) -> Self {
        Self::Notification(msg.into())
    }

    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    /// Upstream and storage errors may echo URLs, credentials or row data.
    pub fn is_pii_safe(&self) -> bool {
        match self {
            Self::Database(_)
            | Self::Network(_)
            | Self::Io(_)
            | Self::Serialization(_)
            | Self::Anyhow(_) => false,
            Self::Calendar(_)
            | Self::Notification(_)
            | Self::InvalidInput(_)
            | Self::Config(_)
            | Self::NotFound(_) => true,
        }
    }

    pub fn to_safe_string(&self) -> String {
        if self.is_pii_safe() {
            self.to_string()
        } else {
            match self {
                Self::Database(_) => "Database operation failed".to_string(),
                Self::Network(_) => "Network request failed".to_string(),
                Self::Io(_) => "IO operation failed".to_string(),
                Self::Serialization(_) => "Malformed data".to_string(),
                Self::Anyhow(_) => "Operation failed".to_string(),
                _ => self.to_string(),
            }
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_string_hides_io_details() {
        let err = AppError::from(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "/home/user/secret/calendar.db",
        ));
        assert!(!err.is_pii_safe());
        assert_eq!(err.to_safe_string(), "IO operation failed");
    }

    #[test]
    fn test_safe_string_keeps_domain_messages() {
        let err = AppError::calendar("Calendar 7 does not exist");
        assert!(err.is_pii_safe());
        assert_eq!(err.to_safe_string(), "Calendar error: Calendar 7 does not exist");
    }
}
