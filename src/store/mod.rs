//! Persistence of meditation records.
//!
//! The pipeline talks to storage only through [`RecordStore`]. Two adapters
//! ship with the crate: [`MemoryStore`] and the file-backed [`JsonFileStore`].

pub mod json;
pub mod memory;

pub use json::JsonFileStore;
pub use memory::MemoryStore;

use crate::record::{AudioArtifact, MeditationRecord};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("record not found: {fingerprint}")]
    NotFound { fingerprint: String },

    #[error("artifact {filename} not found on record {fingerprint}")]
    ArtifactNotFound {
        fingerprint: String,
        filename: String,
    },

    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("catalog is corrupt: {0}")]
    Corrupt(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Persistence collaborator for [`MeditationRecord`]s, keyed by fingerprint.
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    async fn find_by_fingerprint(
        &self,
        fingerprint: &str,
    ) -> Result<Option<MeditationRecord>, StorageError>;

    /// Insert `record` unless one with the same fingerprint exists.
    ///
    /// Returns whichever record is stored afterwards.
    async fn create(&self, record: MeditationRecord) -> Result<MeditationRecord, StorageError>;

    /// Store a translation unless the language already has one.
    ///
    /// Returns the stored text, which is the existing value when another
    /// writer got there first.
    async fn insert_translation_if_absent(
        &self,
        fingerprint: &str,
        language: &str,
        text: &str,
    ) -> Result<String, StorageError>;

    async fn append_audio_artifact(
        &self,
        fingerprint: &str,
        artifact: AudioArtifact,
    ) -> Result<(), StorageError>;

    async fn set_artifact_duration(
        &self,
        fingerprint: &str,
        filename: &str,
        duration_secs: f64,
    ) -> Result<(), StorageError>;

    async fn list(&self) -> Result<Vec<MeditationRecord>, StorageError>;
}

/// In-memory catalog shared by the store adapters.
#[derive(Debug, Default, Clone)]
pub(crate) struct Catalog {
    records: BTreeMap<String, MeditationRecord>,
}

impl Catalog {
    pub(crate) fn from_records(records: Vec<MeditationRecord>) -> Self {
        Self {
            records: records
                .into_iter()
                .map(|r| (r.fingerprint.clone(), r))
                .collect(),
        }
    }

    pub(crate) fn records(&self) -> Vec<MeditationRecord> {
        self.records.values().cloned().collect()
    }

    pub(crate) fn get(&self, fingerprint: &str) -> Option<MeditationRecord> {
        self.records.get(fingerprint).cloned()
    }

    /// Returns the stored record and whether it was newly inserted.
    pub(crate) fn create(&mut self, record: MeditationRecord) -> (MeditationRecord, bool) {
        if let Some(existing) = self.records.get(&record.fingerprint) {
            return (existing.clone(), false);
        }
        self.records
            .insert(record.fingerprint.clone(), record.clone());
        (record, true)
    }

    /// Returns the stored text and whether it was newly inserted.
    pub(crate) fn insert_translation(
        &mut self,
        fingerprint: &str,
        language: &str,
        text: &str,
    ) -> Result<(String, bool), StorageError> {
        let record = self.get_mut(fingerprint)?;
        if let Some(existing) = record.translations.get(language) {
            return Ok((existing.clone(), false));
        }
        record
            .translations
            .insert(language.to_string(), text.to_string());
        Ok((text.to_string(), true))
    }

    pub(crate) fn append_artifact(
        &mut self,
        fingerprint: &str,
        artifact: AudioArtifact,
    ) -> Result<(), StorageError> {
        self.get_mut(fingerprint)?.artifacts.push(artifact);
        Ok(())
    }

    pub(crate) fn set_duration(
        &mut self,
        fingerprint: &str,
        filename: &str,
        duration_secs: f64,
    ) -> Result<(), StorageError> {
        let artifact = self
            .get_mut(fingerprint)?
            .artifacts
            .iter_mut()
            .find(|a| a.filename == filename)
            .ok_or_else(|| StorageError::ArtifactNotFound {
                fingerprint: fingerprint.to_string(),
                filename: filename.to_string(),
            })?;
        artifact.duration_secs = Some(duration_secs);
        Ok(())
    }

    fn get_mut(&mut self, fingerprint: &str) -> Result<&mut MeditationRecord, StorageError> {
        self.records
            .get_mut(fingerprint)
            .ok_or_else(|| StorageError::NotFound {
                fingerprint: fingerprint.to_string(),
            })
    }
}
