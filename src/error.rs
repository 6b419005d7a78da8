//! Error types shared by both command-line tools.
//!
//! Library code returns these typed errors; the binaries wrap them in
//! `anyhow` with context before reporting.

use thiserror::Error;

/// Failure of a single remote API call.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with a non-success status code.
    #[error("API returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    /// The request did not complete within the configured timeout.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// Connection, DNS or TLS failure.
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// The body was not the JSON shape we expected.
    #[error("malformed response body: {0}")]
    Decode(String),
}

impl ApiError {
    /// Map a reqwest error onto the matching variant.
    pub fn from_reqwest(err: reqwest::Error, timeout_seconds: u64) -> Self {
        if err.is_timeout() {
            ApiError::Timeout(timeout_seconds)
        } else if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Transport(err)
        }
    }
}

/// Problems with process configuration, detected before any network call.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Please set the {0} environment variable.")]
    MissingEnv(&'static str),

    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// A search record that matches none of the known profile shapes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("record is not a JSON object")]
    NotAnObject,

    #[error("record has no url")]
    MissingUrl,

    #[error("record for {url} has no title, name or first_name/last_name")]
    MissingLabel { url: String },
}

/// Cache file I/O failures.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cache encoding for {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_env_message_names_variable() {
        let err = ConfigError::MissingEnv("API_KEY");
        assert_eq!(err.to_string(), "Please set the API_KEY environment variable.");
    }

    #[test]
    fn test_decode_error_mentions_url() {
        let err = DecodeError::MissingLabel {
            url: "https://example.com/u/1".to_string(),
        };
        assert!(err.to_string().contains("https://example.com/u/1"));
    }

    #[test]
    fn test_timeout_display() {
        assert_eq!(ApiError::Timeout(300).to_string(), "request timed out after 300s");
    }
}
