//! Error types for paperlens.

use std::time::Duration;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error("Comparison error: {0}")]
    Compare(#[from] CompareError),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Media processing errors.
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("Unsupported media type: {filename}")]
    UnsupportedType { filename: String },

    #[error("Error extracting PDF text: {reason}")]
    ExtractionFailed { reason: String },

    #[error("Media file too large: {size} bytes exceeds {max} byte limit")]
    TooLarge { size: usize, max: usize },
}

/// Failures of a single call to the text-generation endpoint.
///
/// Every variant displays with an `Error querying model:` prefix so a failure
/// rendered into a page can never pass for model output.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InferenceError {
    #[error("Error querying model: endpoint returned HTTP {status}")]
    HttpStatus { status: u16 },

    #[error("Error querying model: request timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("Error querying model: invalid response format ({reason})")]
    MalformedResponse { reason: String },

    #[error("Error querying model: no response generated")]
    EmptyResponse,

    #[error("Error querying model: request failed: {reason}")]
    RequestFailed { reason: String },
}

/// Comparison selection errors. Raised before any inference call is made.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompareError {
    #[error("Select at least {min} papers to compare ({selected} selected)")]
    TooFewPapers { selected: usize, min: usize },

    #[error("Select at most {max} papers to compare ({selected} selected)")]
    TooManyPapers { selected: usize, max: usize },

    #[error("Paper \"{title}\" was selected more than once")]
    DuplicateTitle { title: String },

    #[error("No paper with id {id} in this session")]
    UnknownPaper { id: u64 },
}

/// Web gateway errors.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Gateway failed to start: {reason}")]
    StartupFailed { reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inference_errors_are_marked_as_errors() {
        let errors = [
            InferenceError::HttpStatus { status: 503 },
            InferenceError::Timeout {
                timeout: Duration::from_secs(30),
            },
            InferenceError::MalformedResponse {
                reason: "expected array".to_string(),
            },
            InferenceError::EmptyResponse,
            InferenceError::RequestFailed {
                reason: "connection refused".to_string(),
            },
        ];
        for err in errors {
            assert!(err.to_string().starts_with("Error querying model:"));
        }
    }

    #[test]
    fn http_status_embeds_code() {
        let err = InferenceError::HttpStatus { status: 429 };
        assert!(err.to_string().contains("429"));
    }

    #[test]
    fn top_level_wraps_compare_error() {
        let err: Error = CompareError::TooFewPapers {
            selected: 1,
            min: 2,
        }
        .into();
        assert!(err.to_string().contains("at least 2"));
    }
}
