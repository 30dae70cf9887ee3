//! Domain types: generation requests, meditation records, audio artifacts.

use crate::defaults;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Deterministic content fingerprint of the original text (hex SHA-256).
///
/// This is the dedup key for [`MeditationRecord`]s.
pub fn fingerprint(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// One request to turn text into a meditation track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub text: String,
    pub source_language: String,
    pub target_language: String,
    pub voice_id: String,
    pub background: String,
    pub user_id: Option<String>,
}

impl GenerationRequest {
    pub fn new(
        text: impl Into<String>,
        voice_id: impl Into<String>,
        background: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            source_language: defaults::ENGLISH_LANGUAGE.to_string(),
            target_language: defaults::ENGLISH_LANGUAGE.to_string(),
            voice_id: voice_id.into(),
            background: background.into(),
            user_id: None,
        }
    }

    pub fn with_languages(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.source_language = source.into();
        self.target_language = target.into();
        self
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Fingerprint of the original (untranslated) text.
    pub fn fingerprint(&self) -> String {
        fingerprint(&self.text)
    }
}

/// A produced track, stored under the durable assets directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioArtifact {
    pub language: String,
    pub background: String,
    pub voice: String,
    pub filename: String,
    /// Filled in later by the duration backfill job.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
}

/// Everything produced from one original text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeditationRecord {
    pub fingerprint: String,
    pub text: String,
    /// language code → translated text; entries are only ever added
    #[serde(default)]
    pub translations: BTreeMap<String, String>,
    #[serde(default)]
    pub artifacts: Vec<AudioArtifact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

impl MeditationRecord {
    pub fn new(text: impl Into<String>, owner: Option<String>) -> Self {
        let text = text.into();
        Self {
            fingerprint: fingerprint(&text),
            text,
            translations: BTreeMap::new(),
            artifacts: Vec::new(),
            owner,
        }
    }

    pub fn translation(&self, language: &str) -> Option<&str> {
        self.translations.get(language).map(String::as_str)
    }
}
