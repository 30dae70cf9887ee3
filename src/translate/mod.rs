//! Text translation: provider trait, providers, and the per-record cache.

pub mod cache;
pub mod google;

pub use cache::{CacheError, TranslationCache};
pub use google::GoogleTranslator;

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("translation provider rejected credentials: {0}")]
    Unauthorized(String),

    #[error("translation quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("translation provider returned {status}: {message}")]
    Provider { status: u16, message: String },

    #[error("translation response malformed: {0}")]
    Malformed(String),

    #[error("translation request failed: {0}")]
    Network(String),

    #[error("translation timed out after {0:?}")]
    Timeout(Duration),
}

/// Trait for text translation providers.
///
/// Allows swapping the real HTTP provider for a mock.
#[async_trait::async_trait]
pub trait Translator: Send + Sync {
    async fn translate(
        &self,
        text: &str,
        target_language: &str,
        source_language: &str,
    ) -> Result<String, TranslationError>;

    fn name(&self) -> &str;
}

/// Mock translator for testing
///
/// Counts calls and remembers what it was asked to translate.
#[derive(Debug, Default)]
pub struct MockTranslator {
    response: Option<String>,
    should_fail: bool,
    delay: Option<Duration>,
    calls: AtomicUsize,
    requests: Mutex<Vec<(String, String, String)>>,
}

impl MockTranslator {
    /// Responds with `"[<target>] <text>"`.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, response: &str) -> Self {
        self.response = Some(response.to_string());
        self
    }

    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// Sleep before answering, to widen race windows in tests.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// `(text, target, source)` for every call, in order.
    pub fn requests(&self) -> Vec<(String, String, String)> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl Translator for MockTranslator {
    async fn translate(
        &self,
        text: &str,
        target_language: &str,
        source_language: &str,
    ) -> Result<String, TranslationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push((
                text.to_string(),
                target_language.to_string(),
                source_language.to_string(),
            ));
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.should_fail {
            return Err(TranslationError::QuotaExceeded(
                "mock translation failure".to_string(),
            ));
        }

        Ok(self
            .response
            .clone()
            .unwrap_or_else(|| format!("[{target_language}] {text}")))
    }

    fn name(&self) -> &str {
        "mock"
    }
}
