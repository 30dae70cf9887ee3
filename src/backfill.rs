//! Fill in missing artifact durations by probing the durable outputs.

use crate::compose::{CommandExecutor, probe_duration};
use crate::store::{RecordStore, StorageError};
use std::path::Path;

/// Outcome of one backfill run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackfillReport {
    /// Artifacts that now have a duration.
    pub updated: usize,
    /// Artifacts that already had one.
    pub skipped: usize,
    /// Artifacts whose file could not be probed; `(fingerprint, filename)`.
    pub failed: Vec<(String, String)>,
}

impl BackfillReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Probe every artifact without a duration and store the result.
///
/// A file that fails to probe is reported and left without a duration; the
/// run continues. Storage errors abort the run.
pub async fn backfill_durations(
    store: &dyn RecordStore,
    executor: &dyn CommandExecutor,
    probe_binary: &str,
    assets_dir: &Path,
) -> Result<BackfillReport, StorageError> {
    let mut report = BackfillReport::default();

    for record in store.list().await? {
        for artifact in &record.artifacts {
            if artifact.duration_secs.is_some() {
                report.skipped += 1;
                continue;
            }

            let path = assets_dir.join(&artifact.filename);
            match probe_duration(executor, probe_binary, &path).await {
                Ok(secs) => {
                    store
                        .set_artifact_duration(&record.fingerprint, &artifact.filename, secs)
                        .await?;
                    tracing::debug!(filename = %artifact.filename, duration_secs = secs, "duration recorded");
                    report.updated += 1;
                }
                Err(e) => {
                    tracing::warn!(filename = %artifact.filename, error = %e, "could not probe duration");
                    report
                        .failed
                        .push((record.fingerprint.clone(), artifact.filename.clone()));
                }
            }
        }
    }

    tracing::info!(
        updated = report.updated,
        skipped = report.skipped,
        failed = report.failed.len(),
        "duration backfill finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::ScriptedExecutor;
    use crate::record::{AudioArtifact, MeditationRecord};
    use crate::store::MemoryStore;
    use tempfile::TempDir;

    fn artifact(filename: &str, duration_secs: Option<f64>) -> AudioArtifact {
        AudioArtifact {
            language: "en".to_string(),
            background: "ocean".to_string(),
            voice: "V1".to_string(),
            filename: filename.to_string(),
            duration_secs,
        }
    }

    #[tokio::test]
    async fn fills_missing_durations_and_reports_failures() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("en_1_aaaaaaaa.mp3"), b"ID3").unwrap();

        let mut record = MeditationRecord::new("Let go.", None);
        record.artifacts = vec![
            artifact("en_1_aaaaaaaa.mp3", None),
            artifact("en_2_aaaaaaaa.mp3", None),
            artifact("en_3_aaaaaaaa.mp3", Some(60.0)),
        ];
        let fingerprint = record.fingerprint.clone();
        let store = MemoryStore::with_records(vec![record]);
        let executor = ScriptedExecutor::new().without_output().with_stdout("123.4\n");

        let report = backfill_durations(&store, &executor, "ffprobe", dir.path())
            .await
            .unwrap();

        assert_eq!(report.updated, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(
            report.failed,
            vec![(fingerprint.clone(), "en_2_aaaaaaaa.mp3".to_string())]
        );
        assert!(!report.is_clean());

        let stored = store.find_by_fingerprint(&fingerprint).await.unwrap().unwrap();
        assert_eq!(stored.artifacts[0].duration_secs, Some(123.4));
        assert_eq!(stored.artifacts[1].duration_secs, None);
        assert_eq!(stored.artifacts[2].duration_secs, Some(60.0));
    }

    #[tokio::test]
    async fn empty_catalog_is_clean() {
        let dir = TempDir::new().unwrap();
        let report = backfill_durations(
            &MemoryStore::new(),
            &ScriptedExecutor::new(),
            "ffprobe",
            dir.path(),
        )
        .await
        .unwrap();
        assert_eq!(report, BackfillReport::default());
        assert!(report.is_clean());
    }
}
