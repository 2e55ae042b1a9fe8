//! Error types for bup

use thiserror::Error;

/// Toast text for transport failures.
pub const NETWORK_ERROR_MESSAGE: &str = "Network error. Please check your connection and try again.";

#[derive(Error, Debug)]
pub enum Error {
    #[error("Please log in to continue")]
    NotLoggedIn,

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Invalid verification code: {0}")]
    InvalidOtp(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Server returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("Invalid priority: {0}")]
    InvalidPriority(String),

    #[error("Invalid theme preference: {0}")]
    InvalidTheme(String),

    #[error("Invalid section: {0}")]
    InvalidSection(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Text shown to the user when an operation fails.
    ///
    /// Server messages pass through untouched; transport failures collapse
    /// into one generic message.
    pub fn user_message(&self) -> String {
        match self {
            Error::Network(_) => NETWORK_ERROR_MESSAGE.to_string(),
            Error::Api { message, .. } => message.clone(),
            Error::NotLoggedIn => "Please log in to submit an issue".to_string(),
            other => other.to_string(),
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, Error::Network(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_message_passes_through() {
        let err = Error::Api {
            status: 400,
            message: "Room is required".into(),
        };
        assert_eq!(err.user_message(), "Room is required");
    }

    #[test]
    fn test_validation_message() {
        let err = Error::InvalidOtp("12ab".into());
        assert_eq!(err.user_message(), "Invalid verification code: 12ab");
    }
}
