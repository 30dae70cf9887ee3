//! Speech synthesis: provider trait and implementations.

pub mod elevenlabs;

pub use elevenlabs::ElevenLabsSynthesizer;

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("speech provider rejected credentials: {0}")]
    Unauthorized(String),

    #[error("speech provider is rate limiting: {0}")]
    RateLimited(String),

    #[error("speech provider returned {status}: {message}")]
    Provider { status: u16, message: String },

    #[error("speech request failed: {0}")]
    Network(String),

    #[error("speech synthesis timed out after {0:?}")]
    Timeout(Duration),
}

/// Trait for text-to-speech providers.
#[async_trait::async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` with `voice_id`, returning encoded audio bytes (MP3).
    async fn synthesize(
        &self,
        text: &str,
        voice_id: &str,
        target_language: &str,
    ) -> Result<Vec<u8>, SynthesisError>;

    fn name(&self) -> &str;
}

/// What a [`MockSynthesizer`] should do when called.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MockBehavior {
    #[default]
    Succeed,
    Unauthorized,
    RateLimited,
    ServerError,
    Hang,
}

/// Mock synthesizer for testing
///
/// Returns a fixed byte payload and records the text it was given.
#[derive(Debug, Default)]
pub struct MockSynthesizer {
    audio: Vec<u8>,
    behavior: MockBehavior,
    calls: AtomicUsize,
    texts: Mutex<Vec<String>>,
}

impl MockSynthesizer {
    pub fn new() -> Self {
        Self {
            audio: b"ID3mock-narration".to_vec(),
            ..Self::default()
        }
    }

    pub fn with_audio(mut self, audio: &[u8]) -> Self {
        self.audio = audio.to_vec();
        self
    }

    pub fn with_behavior(mut self, behavior: MockBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every text passed to `synthesize`, in order.
    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().map(|t| t.clone()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl SpeechSynthesizer for MockSynthesizer {
    async fn synthesize(
        &self,
        text: &str,
        _voice_id: &str,
        _target_language: &str,
    ) -> Result<Vec<u8>, SynthesisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut texts) = self.texts.lock() {
            texts.push(text.to_string());
        }

        match self.behavior {
            MockBehavior::Succeed => Ok(self.audio.clone()),
            MockBehavior::Unauthorized => {
                Err(SynthesisError::Unauthorized("invalid api key".to_string()))
            }
            MockBehavior::RateLimited => Err(SynthesisError::RateLimited(
                "too many concurrent requests".to_string(),
            )),
            MockBehavior::ServerError => Err(SynthesisError::Provider {
                status: 500,
                message: "mock provider failure".to_string(),
            }),
            MockBehavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(self.audio.clone())
            }
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_records_text_and_returns_audio() {
        let synth = MockSynthesizer::new().with_audio(b"abc");
        let audio = synth.synthesize("hello", "V1", "en").await.unwrap();
        assert_eq!(audio, b"abc");
        assert_eq!(synth.calls(), 1);
        assert_eq!(synth.texts(), vec!["hello".to_string()]);
    }

    #[tokio::test]
    async fn mock_behaviors_map_to_errors() {
        let unauthorized = MockSynthesizer::new().with_behavior(MockBehavior::Unauthorized);
        assert!(matches!(
            unauthorized.synthesize("x", "V1", "en").await,
            Err(SynthesisError::Unauthorized(_))
        ));

        let limited = MockSynthesizer::new().with_behavior(MockBehavior::RateLimited);
        assert!(matches!(
            limited.synthesize("x", "V1", "en").await,
            Err(SynthesisError::RateLimited(_))
        ));
    }
}
