//! Error types for the VAVI assistant

use thiserror::Error;

/// Result type alias for VAVI operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the assistant
///
/// Collaborator failures travel as values up to the presentation boundary,
/// where [`crate::dispatch::Response`] renders them as user-facing text.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Application launch failure (missing binary, permission denied)
    #[error("{0}")]
    Launch(String),

    /// Video search backend failure
    #[error("{0}")]
    Search(String),

    /// Text generation backend failure
    #[error("{0}")]
    Generation(String),

    /// Browser navigation failure
    #[error("failed to open browser: {0}")]
    Browser(String),

    /// Audio device error
    #[error("audio error: {0}")]
    Audio(String),

    /// Speech-to-text error
    #[error("STT error: {0}")]
    Stt(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Coarse classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Launch,
    Search,
    Generation,
    Browser,
    Audio,
    Stt,
    Tts,
    Io,
    Http,
    Serialization,
}

impl Error {
    /// Classify this error
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) | Self::Toml(_) => ErrorKind::Config,
            Self::Launch(_) => ErrorKind::Launch,
            Self::Search(_) => ErrorKind::Search,
            Self::Generation(_) => ErrorKind::Generation,
            Self::Browser(_) => ErrorKind::Browser,
            Self::Audio(_) => ErrorKind::Audio,
            Self::Stt(_) => ErrorKind::Stt,
            Self::Tts(_) => ErrorKind::Tts,
            Self::Io(_) => ErrorKind::Io,
            Self::Http(_) => ErrorKind::Http,
            Self::Serialization(_) => ErrorKind::Serialization,
        }
    }

    /// Whether the failure came from the network rather than the service itself
    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Http(e) if e.is_connect() || e.is_timeout() || e.is_request())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collaborator_errors_display_detail_only() {
        let err = Error::Launch("No such file or directory".to_string());
        assert_eq!(err.to_string(), "No such file or directory");
        assert_eq!(err.kind(), ErrorKind::Launch);
    }

    #[test]
    fn test_io_error_kind() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(!err.is_network());
    }
}
