//! Meditation generation pipeline.
//!
//! [`MeditationPipeline::generate`] sequences translation, pause
//! normalization, synthesis and composition, and maps every component
//! failure onto [`GenerationError`].

pub mod error;
pub mod orchestrator;
pub mod stream;

pub use error::{ErrorKind, GenerationError};
pub use orchestrator::{Collaborators, MeditationPipeline, validate};
pub use stream::MeditationAudio;
