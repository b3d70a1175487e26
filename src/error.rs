//! Error types for Mushaf

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MushafError {
    /// Non-2xx response from an upstream API
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Transport failure or undecodable response body
    #[error("Network error: {0}")]
    Network(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid locator: {0}")]
    InvalidLocator(String),

    /// Bundled dataset could not be read or parsed
    #[error("Dataset error: {0}")]
    Dataset(String),

    #[error("{0}")]
    Other(String),
}

impl MushafError {
    /// True for failures of a remote request, whatever their cause.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(self, MushafError::Fetch(_) | MushafError::Network(_))
    }
}

impl From<reqwest::Error> for MushafError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => MushafError::Fetch(format!("HTTP {}", status)),
            None => MushafError::Network(e.to_string()),
        }
    }
}

impl serde::Serialize for MushafError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MushafError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_failure_grouping() {
        assert!(MushafError::Fetch("HTTP 404".into()).is_fetch_failure());
        assert!(MushafError::Network("reset".into()).is_fetch_failure());
        assert!(!MushafError::NotFound("x".into()).is_fetch_failure());
    }

    #[test]
    fn test_serializes_as_message() {
        let json = serde_json::to_string(&MushafError::NotFound("Translation not found".into())).unwrap();
        assert_eq!(json, "\"Not found: Translation not found\"");
    }
}
