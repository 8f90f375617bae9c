use thiserror::Error;

/// Error type shared by every stage of the telemetry pipeline.
///
/// Payloads are owned strings so one fetch outcome can be handed to every
/// caller waiting on the same cache key.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("store connection error: {0}")]
    StoreConnection(String),

    #[error("store query error: {0}")]
    StoreQuery(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("data consistency error: {0}")]
    Consistency(String),

    #[error("data format error: {0}")]
    Format(String),

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("no data: {0}")]
    EmptyData(String),

    #[error("insufficient data: {0}")]
    InsufficientData(String),
}

impl Error {
    /// True for failures that must end the run immediately.
    pub fn is_store_failure(&self) -> bool {
        matches!(self, Error::StoreConnection(_) | Error::StoreQuery(_))
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::Csv(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::Config(format!("invalid store URL: {}", err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Format(err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() || err.is_request() {
            Error::StoreConnection(err.to_string())
        } else {
            Error::StoreQuery(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_failures_are_terminal() {
        assert!(Error::StoreConnection("down".into()).is_store_failure());
        assert!(Error::StoreQuery("bad flux".into()).is_store_failure());
        assert!(!Error::Config("x".into()).is_store_failure());
    }

    #[test]
    fn test_io_conversion_keeps_message() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing file");
        let err: Error = io.into();
        assert_eq!(err, Error::Io("missing file".to_string()));
        assert_eq!(err.to_string(), "I/O error: missing file");
    }
}
