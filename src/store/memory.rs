use super::{Catalog, RecordStore, StorageError};
use crate::record::{AudioArtifact, MeditationRecord};
use tokio::sync::Mutex;

/// Record store that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    catalog: Mutex<Catalog>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<MeditationRecord>) -> Self {
        Self {
            catalog: Mutex::new(Catalog::from_records(records)),
        }
    }
}

#[async_trait::async_trait]
impl RecordStore for MemoryStore {
    async fn find_by_fingerprint(
        &self,
        fingerprint: &str,
    ) -> Result<Option<MeditationRecord>, StorageError> {
        Ok(self.catalog.lock().await.get(fingerprint))
    }

    async fn create(&self, record: MeditationRecord) -> Result<MeditationRecord, StorageError> {
        Ok(self.catalog.lock().await.create(record).0)
    }

    async fn insert_translation_if_absent(
        &self,
        fingerprint: &str,
        language: &str,
        text: &str,
    ) -> Result<String, StorageError> {
        let mut catalog = self.catalog.lock().await;
        Ok(catalog.insert_translation(fingerprint, language, text)?.0)
    }

    async fn append_audio_artifact(
        &self,
        fingerprint: &str,
        artifact: AudioArtifact,
    ) -> Result<(), StorageError> {
        self.catalog
            .lock()
            .await
            .append_artifact(fingerprint, artifact)
    }

    async fn set_artifact_duration(
        &self,
        fingerprint: &str,
        filename: &str,
        duration_secs: f64,
    ) -> Result<(), StorageError> {
        self.catalog
            .lock()
            .await
            .set_duration(fingerprint, filename, duration_secs)
    }

    async fn list(&self) -> Result<Vec<MeditationRecord>, StorageError> {
        Ok(self.catalog.lock().await.records())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_then_find() {
        let store = MemoryStore::new();
        let record = store
            .create(MeditationRecord::new("breathe", None))
            .await
            .unwrap();

        let found = store
            .find_by_fingerprint(&record.fingerprint)
            .await
            .unwrap();
        assert_eq!(found, Some(record));
        assert_eq!(store.find_by_fingerprint("nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn translation_insert_is_compare_and_swap() {
        let store = MemoryStore::new();
        let record = store
            .create(MeditationRecord::new("breathe", None))
            .await
            .unwrap();

        let first = store
            .insert_translation_if_absent(&record.fingerprint, "de", "atme")
            .await
            .unwrap();
        let second = store
            .insert_translation_if_absent(&record.fingerprint, "de", "atmen")
            .await
            .unwrap();

        assert_eq!(first, "atme");
        assert_eq!(second, "atme");
    }
}
