use supscout_api::ApiError;
use thiserror::Error;

/// All the ways things can go wrong in SupScout
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("{0}")]
    NotFound(String),

    #[error("Stored data under {key} is unreadable: {reason}")]
    MalformedPersistedData { key: String, reason: String },

    #[error("Storage operation failed: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Message shown to the user for a failed fetch
    ///
    /// HTTP-layer failures get `context` in front so the user knows which
    /// operation broke; domain errors already read well on their own.
    pub fn user_message(&self, context: &str) -> String {
        match self {
            Error::Api(err) => format!("{}: {}", context, err),
            other => other.to_string(),
        }
    }
}

impl From<supscout_cache::rusqlite::Error> for Error {
    fn from(err: supscout_cache::rusqlite::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_errors_are_prefixed() {
        let err = Error::from(ApiError::Http {
            status: 404,
            status_text: "Not Found".to_string(),
        });
        assert_eq!(
            err.user_message("Failed to search supplements"),
            "Failed to search supplements: HTTP error! 404: Not Found"
        );
    }

    #[test]
    fn test_domain_errors_are_verbatim() {
        let err = Error::NotFound("Supplement not found".to_string());
        assert_eq!(
            err.user_message("Failed to load supplement details"),
            "Supplement not found"
        );
    }
}
