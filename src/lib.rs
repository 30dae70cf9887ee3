//! stillpoint - text to meditation audio
//!
//! Translates text when needed, narrates it with a speech provider, and mixes
//! the narration over a looping background track with ffmpeg.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod backfill;
pub mod compose;
pub mod config;
pub mod credits;
pub mod defaults;
#[cfg(feature = "cli")]
pub mod diagnostics;
pub mod error;
pub mod files;
pub mod logging;
pub mod pauses;
pub mod pipeline;
pub mod record;
pub mod store;
pub mod translate;
pub mod tts;

#[cfg(feature = "cli")]
pub mod cli;

// Composition root - needs everything
#[cfg(feature = "cli")]
pub mod app;

// Core traits (collaborator seams)
pub use compose::{CommandExecutor, SystemCommandExecutor};
pub use credits::CreditLedger;
pub use store::RecordStore;
pub use translate::Translator;
pub use tts::SpeechSynthesizer;

// Pipeline
pub use pipeline::{Collaborators, GenerationError, MeditationAudio, MeditationPipeline};
pub use record::{AudioArtifact, GenerationRequest, MeditationRecord};

// Error handling
pub use error::{Result, StillpointError};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
