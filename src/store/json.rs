//! Record store backed by a single JSON file.
//!
//! Every mutation takes an exclusive lock on a sibling `.lock` file, re-reads
//! the catalog from disk, applies the change and writes it to a temp file
//! that is renamed into place. Several handles, in one process or many, can
//! share a catalog without losing each other's writes, and readers never see
//! a half-written file.

use super::{Catalog, RecordStore, StorageError};
use crate::record::{AudioArtifact, MeditationRecord};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

pub struct JsonFileStore {
    path: PathBuf,
    writer: Mutex<()>,
}

impl JsonFileStore {
    /// Open the catalog at `path`, starting empty if the file doesn't exist.
    ///
    /// A corrupt catalog is reported here rather than on first use.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let store = Self {
            path: path.into(),
            writer: Mutex::new(()),
        };
        let catalog = store.load().await?;
        tracing::debug!(
            path = %store.path.display(),
            records = catalog.records().len(),
            "opened record catalog"
        );
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("json.lock")
    }

    async fn load(&self) -> Result<Catalog, StorageError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => {
                let records: Vec<MeditationRecord> = serde_json::from_slice(&bytes)
                    .map_err(|e| StorageError::Corrupt(format!("{}: {e}", self.path.display())))?;
                Ok(Catalog::from_records(records))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Catalog::default()),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    async fn ensure_parent(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Block until this process holds the catalog's file lock.
    ///
    /// The lock is released when the returned file is dropped.
    async fn acquire_file_lock(&self) -> Result<File, StorageError> {
        let lock_path = self.lock_path();
        tokio::task::spawn_blocking(move || {
            let file = OpenOptions::new()
                .create(true)
                .truncate(false)
                .write(true)
                .open(&lock_path)?;
            file.lock()?;
            Ok::<_, std::io::Error>(file)
        })
        .await
        .map_err(|e| StorageError::Unavailable(format!("catalog lock task failed: {e}")))?
        .map_err(StorageError::Io)
    }

    async fn persist(&self, catalog: &Catalog) -> Result<(), StorageError> {
        let json = serde_json::to_vec_pretty(&catalog.records())
            .map_err(|e| StorageError::Unavailable(format!("failed to encode catalog: {e}")))?;

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Apply `change` to the catalog currently on disk and persist the result.
    ///
    /// Runs under the file lock, so `change` always sees every write that
    /// completed before it. A failed change or write leaves the file untouched.
    async fn mutate<T>(
        &self,
        change: impl FnOnce(&mut Catalog) -> Result<(T, bool), StorageError>,
    ) -> Result<T, StorageError> {
        let _writer = self.writer.lock().await;
        self.ensure_parent().await?;
        let _file_lock = self.acquire_file_lock().await?;

        let mut catalog = self.load().await?;
        let (value, changed) = change(&mut catalog)?;
        if changed {
            self.persist(&catalog).await?;
        }
        Ok(value)
    }
}

#[async_trait::async_trait]
impl RecordStore for JsonFileStore {
    async fn find_by_fingerprint(
        &self,
        fingerprint: &str,
    ) -> Result<Option<MeditationRecord>, StorageError> {
        Ok(self.load().await?.get(fingerprint))
    }

    async fn create(&self, record: MeditationRecord) -> Result<MeditationRecord, StorageError> {
        self.mutate(|catalog| Ok(catalog.create(record))).await
    }

    async fn insert_translation_if_absent(
        &self,
        fingerprint: &str,
        language: &str,
        text: &str,
    ) -> Result<String, StorageError> {
        self.mutate(|catalog| catalog.insert_translation(fingerprint, language, text))
            .await
    }

    async fn append_audio_artifact(
        &self,
        fingerprint: &str,
        artifact: AudioArtifact,
    ) -> Result<(), StorageError> {
        self.mutate(|catalog| {
            catalog.append_artifact(fingerprint, artifact)?;
            Ok(((), true))
        })
        .await
    }

    async fn set_artifact_duration(
        &self,
        fingerprint: &str,
        filename: &str,
        duration_secs: f64,
    ) -> Result<(), StorageError> {
        self.mutate(|catalog| {
            catalog.set_duration(fingerprint, filename, duration_secs)?;
            Ok(((), true))
        })
        .await
    }

    async fn list(&self) -> Result<Vec<MeditationRecord>, StorageError> {
        Ok(self.load().await?.records())
    }
}
