use thiserror::Error;

// Failures of a single user action against the hosted endpoint
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    #[error("{0}")]
    Network(String),

    #[error("{0}")]
    Application(String),

    #[error("Malformed response: {0}")]
    Parse(String),

    #[error("{0}")]
    Validation(String),

    #[error("Session storage error: {0}")]
    Session(String),
}

impl ClientError {
    pub fn is_network(&self) -> bool {
        matches!(self, ClientError::Network(_) | ClientError::Parse(_))
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Parse(err.to_string())
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Parse(err.to_string())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::Session(err.to_string())
    }
}

/// Geolocation never fails a clock submission; these only feed logging.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeoError {
    #[error("geolocation is not available on this device")]
    Unavailable,

    #[error("geolocation permission denied")]
    Denied,

    #[error("geolocation timed out")]
    Timeout,
}
