use thiserror::Error;

/// Errors that can occur while following a watched file
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur when delivering a log entry to the webhook
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Failed to serialize payload: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DispatchError {
    /// Whether the peer refused the HTTP/2 stream, the one failure worth a second attempt
    pub fn is_refused_stream(&self) -> bool {
        matches!(self, DispatchError::Transport(msg) if msg.contains(REFUSED_STREAM))
    }
}

/// Signature of a stream-level refusal in transport error text
pub const REFUSED_STREAM: &str = "REFUSED_STREAM";

/// Errors that can occur during configuration loading
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Invalid configuration value: {0}")]
    ValidationError(String),

    #[error("Invalid {kind} pattern '{pattern}': {source}")]
    InvalidPattern {
        kind: &'static str,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refused_stream_detection() {
        let err = DispatchError::Transport(
            "http2 error: stream error received: refused stream before processing any application logic (REFUSED_STREAM)"
                .to_string(),
        );
        assert!(err.is_refused_stream());

        let err = DispatchError::Transport("connection refused".to_string());
        assert!(!err.is_refused_stream());
    }

    #[test]
    fn test_serialization_error_is_not_retryable() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = DispatchError::from(json_err);
        assert!(!err.is_refused_stream());
        assert!(err.to_string().starts_with("Failed to serialize payload"));
    }

    #[test]
    fn test_toml_error_converts_into_config_error() {
        let toml_err = toml::from_str::<toml::Value>("files = [").unwrap_err();
        let err = ConfigError::from(toml_err);
        assert!(err.to_string().starts_with("TOML parse error"));
    }
}
