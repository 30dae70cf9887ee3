//! Error types for stillpoint.
//!
//! `StillpointError` covers configuration and local I/O. Each pipeline
//! component defines its own error at its seam; the orchestrator maps those
//! into [`crate::pipeline::GenerationError`].

use crate::pipeline::GenerationError;
use crate::store::StorageError;
use crate::translate::TranslationError;
use crate::tts::SynthesisError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StillpointError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Component errors surfaced by the application layer
    #[error("Generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("Record storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Translation provider setup failed: {0}")]
    Translation(#[from] TranslationError),

    #[error("Speech provider setup failed: {0}")]
    Synthesis(#[from] SynthesisError),

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, StillpointError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_config_file_not_found_display() {
        let error = StillpointError::ConfigFileNotFound {
            path: "/path/to/config.toml".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Configuration file not found at /path/to/config.toml"
        );
    }

    #[test]
    fn test_config_invalid_value_display() {
        let error = StillpointError::ConfigInvalidValue {
            key: "synthesis.timeout_secs".to_string(),
            message: "must be greater than zero".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid configuration value for synthesis.timeout_secs: must be greater than zero"
        );
    }

    #[test]
    fn test_from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let error: StillpointError = io_error.into();
        assert!(error.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_toml_error() {
        let toml_error = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let error: StillpointError = toml_error.into();
        assert!(error.to_string().contains("Configuration error"));

        let error_trait: &dyn std::error::Error = &error;
        assert!(error_trait.source().is_some());
    }

    #[test]
    fn test_from_generation_error_keeps_kind() {
        let error: StillpointError = GenerationError::MissingAsset {
            path: "/bg/rain.mp3".into(),
        }
        .into();
        assert_eq!(
            error.to_string(),
            "Generation failed: background track missing: /bg/rain.mp3"
        );
        assert!(matches!(
            error,
            StillpointError::Generation(GenerationError::MissingAsset { .. })
        ));
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<StillpointError>();
        assert_sync::<StillpointError>();
    }
}
