//! Translation cache keyed by (content fingerprint, target language).
//!
//! Cache population is serialized per key: concurrent requests for the same
//! text and language make at most one provider call between them. Unrelated
//! keys never wait on each other.

use super::{TranslationError, Translator};
use crate::record::MeditationRecord;
use crate::store::{RecordStore, StorageError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error(transparent)]
    Translation(#[from] TranslationError),

    #[error("failed to persist translation: {0}")]
    Storage(#[from] StorageError),
}

type Key = (String, String);

/// Table of async mutexes, one per live key.
///
/// Entries are weak so finished keys don't accumulate.
#[derive(Debug, Default)]
pub struct KeyedLocks {
    inner: Mutex<HashMap<Key, Weak<tokio::sync::Mutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The lock for `key`, shared with every other holder of the same key.
    pub fn lock_for(&self, fingerprint: &str, language: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut table = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        table.retain(|_, lock| lock.strong_count() > 0);

        let key = (fingerprint.to_string(), language.to_string());
        if let Some(lock) = table.get(&key).and_then(Weak::upgrade) {
            return lock;
        }

        let lock = Arc::new(tokio::sync::Mutex::new(()));
        table.insert(key, Arc::downgrade(&lock));
        lock
    }

    /// Number of keys currently held by someone.
    pub fn active(&self) -> usize {
        let table = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        table.values().filter(|l| l.strong_count() > 0).count()
    }
}

pub struct TranslationCache {
    translator: Arc<dyn Translator>,
    store: Arc<dyn RecordStore>,
    locks: KeyedLocks,
    timeout: Duration,
}

impl TranslationCache {
    pub fn new(
        translator: Arc<dyn Translator>,
        store: Arc<dyn RecordStore>,
        timeout: Duration,
    ) -> Self {
        Self {
            translator,
            store,
            locks: KeyedLocks::new(),
            timeout,
        }
    }

    /// Text to synthesize for `record` in `target_language`.
    ///
    /// Language codes compare case-insensitively and translations are keyed by
    /// the lowercase code. Same language returns `source_text` untouched. A
    /// cached translation is returned without a provider call. On a miss the
    /// provider result is persisted on the record before it is returned; a
    /// failed or timed-out call caches nothing.
    pub async fn resolve(
        &self,
        record: &mut MeditationRecord,
        target_language: &str,
        source_language: &str,
        source_text: &str,
    ) -> Result<String, CacheError> {
        if target_language.eq_ignore_ascii_case(source_language) {
            return Ok(source_text.to_string());
        }
        let target_language = target_language.to_ascii_lowercase();
        let target_language = target_language.as_str();

        if let Some(cached) = record.translation(target_language) {
            tracing::debug!(
                fingerprint = %record.fingerprint,
                language = target_language,
                "translation cache hit"
            );
            return Ok(cached.to_string());
        }

        let lock = self.locks.lock_for(&record.fingerprint, target_language);
        let _guard = lock.lock().await;

        // Someone holding the lock before us may have filled it in.
        if let Some(fresh) = self.store.find_by_fingerprint(&record.fingerprint).await?
            && let Some(cached) = fresh.translation(target_language)
        {
            tracing::debug!(
                fingerprint = %record.fingerprint,
                language = target_language,
                "translation filled by concurrent request"
            );
            let cached = cached.to_string();
            record
                .translations
                .insert(target_language.to_string(), cached.clone());
            return Ok(cached);
        }

        let started = Instant::now();
        let translated = tokio::time::timeout(
            self.timeout,
            self.translator
                .translate(source_text, target_language, source_language),
        )
        .await
        .map_err(|_| TranslationError::Timeout(self.timeout))??;

        tracing::info!(
            fingerprint = %record.fingerprint,
            language = target_language,
            provider = self.translator.name(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "translated meditation text"
        );

        let stored = self
            .store
            .insert_translation_if_absent(&record.fingerprint, target_language, &translated)
            .await?;
        record
            .translations
            .insert(target_language.to_string(), stored.clone());
        Ok(stored)
    }
}
