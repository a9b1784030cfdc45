//! Error types and handling for the `CareFinder` application

use thiserror::Error;

/// Main error type for the `CareFinder` application
#[derive(Error, Debug)]
pub enum CareFinderError {
    /// Input validation errors (malformed birthday, non-positive radius,
    /// out-of-range coordinates)
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// The daycare catalog failed to load or holds no records
    #[error("Daycare data unavailable: {message}")]
    DataUnavailable { message: String },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// External API communication errors (geocoding, travel times, open data)
    #[error("API error: {message}")]
    Api { message: String },

    /// Cache operation errors
    #[error("Cache error: {message}")]
    Cache { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl CareFinderError {
    /// Create a new input validation error
    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a new data availability error
    pub fn data_unavailable<S: Into<String>>(message: S) -> Self {
        Self::DataUnavailable {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Create a new cache error
    pub fn cache<S: Into<String>>(message: S) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            CareFinderError::InvalidInput { message } => {
                format!("Invalid input: {message}")
            }
            CareFinderError::DataUnavailable { .. } => {
                "Daycare data is currently unavailable. Please try again later.".to_string()
            }
            CareFinderError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            CareFinderError::Api { .. } => {
                "Unable to reach external services. Please check your internet connection."
                    .to_string()
            }
            CareFinderError::Cache { .. } => {
                "Cache operation failed. You may need to clear your cache.".to_string()
            }
            CareFinderError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}
