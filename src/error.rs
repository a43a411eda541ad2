//! Error types for churn inference.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by artifact loading, encoding and inference.
///
/// None of these are retried. A failed submission renders the message and
/// the caller moves on to the next one.
#[derive(Error, Debug)]
pub enum ChurnError {
    /// An artifact file is missing, unreadable or structurally invalid.
    #[error("failed to load artifact {}: {reason}", path.display())]
    ArtifactLoad {
        /// Path of the offending artifact.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// A categorical value was not seen when the encoder was fit.
    #[error("unseen {feature} value '{value}' (known: {known})")]
    Encoding {
        /// Name of the categorical feature.
        feature: String,
        /// The rejected value.
        value: String,
        /// Comma-separated list of values the encoder knows.
        known: String,
    },

    /// The classifier rejected the feature vector or produced garbage.
    #[error("inference failed: {0}")]
    Inference(String),

    /// A customer field is outside its accepted range.
    #[error("invalid {field}: {reason}")]
    Validation {
        /// Name of the field.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

impl ChurnError {
    pub(crate) fn artifact(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        ChurnError::ArtifactLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        ChurnError::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// Short machine-friendly name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ChurnError::ArtifactLoad { .. } => "artifact_load",
            ChurnError::Encoding { .. } => "encoding",
            ChurnError::Inference(_) => "inference",
            ChurnError::Validation { .. } => "validation",
        }
    }
}

/// A specialized Result type for churn inference.
pub type Result<T> = std::result::Result<T, ChurnError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ChurnError::Encoding {
            feature: "country".to_string(),
            value: "Italy".to_string(),
            known: "France, Germany, Spain".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "unseen country value 'Italy' (known: France, Germany, Spain)"
        );
        assert_eq!(err.kind(), "encoding");

        let err = ChurnError::artifact("artifacts/ohe.json", "file not found");
        assert_eq!(
            err.to_string(),
            "failed to load artifact artifacts/ohe.json: file not found"
        );

        let err = ChurnError::validation("age", "must be between 18 and 100, got 17");
        assert_eq!(err.to_string(), "invalid age: must be between 18 and 100, got 17");
        assert_eq!(err.kind(), "validation");
    }
}
