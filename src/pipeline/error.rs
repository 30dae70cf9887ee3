//! Failure taxonomy of the generation pipeline.
//!
//! Every component error is mapped to one [`GenerationError`] at the
//! orchestrator, so callers see a single, stable set of failure kinds.

use crate::compose::CompositionError;
use crate::credits::CreditError;
use crate::store::StorageError;
use crate::translate::{CacheError, TranslationError};
use crate::tts::SynthesisError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("background track missing: {}", path.display())]
    MissingAsset { path: PathBuf },

    #[error("insufficient credit: {0}")]
    InsufficientCredit(String),

    #[error("translation failed: {0}")]
    TranslationFailed(String),

    #[error("speech synthesis unauthorized: {0}")]
    SynthesisUnauthorized(String),

    #[error("speech synthesis rate limited: {0}")]
    SynthesisRateLimited(String),

    #[error("speech synthesis failed: {0}")]
    SynthesisFailed(String),

    #[error("audio composition failed: {diagnostic}")]
    CompositionFailed { diagnostic: String },

    #[error("storage failed: {0}")]
    StorageFailed(String),
}

/// Stable, data-free discriminant of a [`GenerationError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidRequest,
    MissingAsset,
    InsufficientCredit,
    TranslationFailed,
    SynthesisUnauthorized,
    SynthesisRateLimited,
    SynthesisFailed,
    CompositionFailed,
    StorageFailed,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidRequest => "invalid_request",
            ErrorKind::MissingAsset => "missing_asset",
            ErrorKind::InsufficientCredit => "insufficient_credit",
            ErrorKind::TranslationFailed => "translation_failed",
            ErrorKind::SynthesisUnauthorized => "synthesis_unauthorized",
            ErrorKind::SynthesisRateLimited => "synthesis_rate_limited",
            ErrorKind::SynthesisFailed => "synthesis_failed",
            ErrorKind::CompositionFailed => "composition_failed",
            ErrorKind::StorageFailed => "storage_failed",
        }
    }
}

impl GenerationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GenerationError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            GenerationError::MissingAsset { .. } => ErrorKind::MissingAsset,
            GenerationError::InsufficientCredit(_) => ErrorKind::InsufficientCredit,
            GenerationError::TranslationFailed(_) => ErrorKind::TranslationFailed,
            GenerationError::SynthesisUnauthorized(_) => ErrorKind::SynthesisUnauthorized,
            GenerationError::SynthesisRateLimited(_) => ErrorKind::SynthesisRateLimited,
            GenerationError::SynthesisFailed(_) => ErrorKind::SynthesisFailed,
            GenerationError::CompositionFailed { .. } => ErrorKind::CompositionFailed,
            GenerationError::StorageFailed(_) => ErrorKind::StorageFailed,
        }
    }

    /// Whether the same request may succeed if the caller tries again later.
    ///
    /// Nothing is retried inside the pipeline.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GenerationError::SynthesisRateLimited(_))
    }
}

impl From<TranslationError> for GenerationError {
    fn from(e: TranslationError) -> Self {
        GenerationError::TranslationFailed(e.to_string())
    }
}

impl From<CacheError> for GenerationError {
    fn from(e: CacheError) -> Self {
        match e {
            CacheError::Translation(e) => e.into(),
            CacheError::Storage(e) => e.into(),
        }
    }
}

impl From<SynthesisError> for GenerationError {
    fn from(e: SynthesisError) -> Self {
        match e {
            SynthesisError::Unauthorized(msg) => GenerationError::SynthesisUnauthorized(msg),
            SynthesisError::RateLimited(msg) => GenerationError::SynthesisRateLimited(msg),
            other => GenerationError::SynthesisFailed(other.to_string()),
        }
    }
}

impl From<CompositionError> for GenerationError {
    fn from(e: CompositionError) -> Self {
        GenerationError::CompositionFailed {
            diagnostic: e.diagnostic(),
        }
    }
}

impl From<StorageError> for GenerationError {
    fn from(e: StorageError) -> Self {
        GenerationError::StorageFailed(e.to_string())
    }
}

impl From<CreditError> for GenerationError {
    fn from(e: CreditError) -> Self {
        match e {
            CreditError::Unavailable(msg) => GenerationError::StorageFailed(msg),
            other => GenerationError::InsufficientCredit(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn synthesis_errors_keep_their_kind() {
        let e: GenerationError = SynthesisError::Unauthorized("bad key".to_string()).into();
        assert_eq!(e.kind(), ErrorKind::SynthesisUnauthorized);

        let e: GenerationError = SynthesisError::RateLimited("busy".to_string()).into();
        assert_eq!(e.kind(), ErrorKind::SynthesisRateLimited);
        assert!(e.is_retryable());

        let e: GenerationError = SynthesisError::Timeout(Duration::from_secs(120)).into();
        assert_eq!(e.kind(), ErrorKind::SynthesisFailed);
        assert!(!e.is_retryable());

        let e: GenerationError = SynthesisError::Network("reset".to_string()).into();
        assert_eq!(e.kind(), ErrorKind::SynthesisFailed);
    }

    #[test]
    fn translation_timeout_is_translation_failure() {
        let e: GenerationError = CacheError::Translation(TranslationError::Timeout(
            Duration::from_secs(30),
        ))
        .into();
        assert_eq!(e.kind(), ErrorKind::TranslationFailed);
        assert_eq!(
            e.to_string(),
            "translation failed: translation timed out after 30s"
        );
    }

    #[test]
    fn cache_storage_error_is_storage_failure() {
        let e: GenerationError = CacheError::Storage(StorageError::Unavailable(
            "disk full".to_string(),
        ))
        .into();
        assert_eq!(e.kind(), ErrorKind::StorageFailed);
    }

    #[test]
    fn composition_carries_diagnostic() {
        let e: GenerationError = CompositionError::Exited {
            code: Some(1),
            stderr: "Invalid data found\n".to_string(),
        }
        .into();
        match e {
            GenerationError::CompositionFailed { diagnostic } => {
                assert_eq!(diagnostic, "Invalid data found");
            }
            other => panic!("Expected CompositionFailed, got {:?}", other),
        }
    }

    #[test]
    fn kind_labels_are_snake_case() {
        assert_eq!(ErrorKind::MissingAsset.as_str(), "missing_asset");
        assert_eq!(ErrorKind::CompositionFailed.as_str(), "composition_failed");
    }
}
