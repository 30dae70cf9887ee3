//! File lifecycle: directory layout, durable naming, per-request cleanup.
//!
//! Every request owns three paths: a temporary narration file, the durable
//! output in the assets directory, and a public copy handed out as the
//! response stream. [`RequestFiles`] removes whatever it still owns when
//! dropped.

pub mod clock;
pub mod guard;

pub use clock::{Clock, FixedClock, SystemClock};
pub use guard::RequestFiles;

use crate::config::StorageConfig;
use crate::defaults;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Attempts at finding a free durable name before giving up.
const MAX_NAME_ATTEMPTS: u64 = 1000;

/// `{language}_{timestamp}_{fingerprint-prefix}.mp3`
pub fn durable_filename(language: &str, timestamp: u64, fingerprint: &str) -> String {
    let prefix: String = fingerprint
        .chars()
        .take(defaults::FINGERPRINT_PREFIX_LEN)
        .collect();
    format!(
        "{language}_{timestamp}_{prefix}.{}",
        defaults::AUDIO_EXTENSION
    )
}

/// Parse a durable filename back into `(language, timestamp, prefix)`.
pub fn parse_durable_filename(filename: &str) -> Option<(&str, u64, &str)> {
    let stem = filename.strip_suffix(&format!(".{}", defaults::AUDIO_EXTENSION))?;
    let mut parts = stem.rsplitn(3, '_');
    let prefix = parts.next()?;
    let timestamp = parts.next()?.parse().ok()?;
    let language = parts.next()?;
    if language.is_empty()
        || prefix.len() != defaults::FINGERPRINT_PREFIX_LEN
        || !prefix.chars().all(|c| c.is_ascii_hexdigit())
    {
        return None;
    }
    Some((language, timestamp, prefix))
}

/// The directories one pipeline works in.
#[derive(Clone)]
pub struct Workspace {
    assets_dir: PathBuf,
    temp_dir: PathBuf,
    public_dir: PathBuf,
    backgrounds_dir: PathBuf,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("assets_dir", &self.assets_dir)
            .field("temp_dir", &self.temp_dir)
            .field("public_dir", &self.public_dir)
            .field("backgrounds_dir", &self.backgrounds_dir)
            .finish_non_exhaustive()
    }
}

impl Workspace {
    pub fn new(storage: &StorageConfig) -> Self {
        Self {
            assets_dir: storage.assets_dir.clone(),
            temp_dir: storage.temp_dir.clone(),
            public_dir: storage.public_dir.clone(),
            backgrounds_dir: storage.backgrounds_dir.clone(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn assets_dir(&self) -> &Path {
        &self.assets_dir
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    pub fn public_dir(&self) -> &Path {
        &self.public_dir
    }

    /// Path of the background track called `name`.
    pub fn background_path(&self, name: &str) -> PathBuf {
        self.backgrounds_dir
            .join(format!("{name}.{}", defaults::AUDIO_EXTENSION))
    }

    pub fn durable_path(&self, filename: &str) -> PathBuf {
        self.assets_dir.join(filename)
    }

    /// Create the assets, temp and public directories if missing.
    pub async fn ensure_dirs(&self) -> io::Result<()> {
        for dir in [&self.assets_dir, &self.temp_dir, &self.public_dir] {
            tokio::fs::create_dir_all(dir).await?;
        }
        Ok(())
    }

    /// Reserve the files for one request.
    ///
    /// The durable name is claimed by creating an empty file, so concurrent
    /// requests never share an output path.
    pub async fn begin(&self, language: &str, fingerprint: &str) -> io::Result<RequestFiles> {
        self.ensure_dirs().await?;

        let start = self.clock.unix_millis();
        for offset in 0..MAX_NAME_ATTEMPTS {
            let filename = durable_filename(language, start + offset, fingerprint);
            let durable = self.durable_path(&filename);

            match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&durable)
                .await
            {
                Ok(_) => {
                    let stem = filename
                        .strip_suffix(&format!(".{}", defaults::AUDIO_EXTENSION))
                        .unwrap_or(&filename);
                    let narration = self
                        .temp_dir
                        .join(format!("narration_{stem}.{}", defaults::AUDIO_EXTENSION));
                    let public = self.public_dir.join(&filename);
                    return Ok(RequestFiles::new(narration, durable, public));
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e),
            }
        }

        Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("no free output name in {}", self.assets_dir.display()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const FP: &str = "3f2a9c01d4e5b6a7c8d9e0f1a2b3c4d5e6f708192a3b4c5d6e7f8091a2b3c4d5";

    fn workspace(dir: &TempDir, millis: u64) -> Workspace {
        let storage = StorageConfig {
            assets_dir: dir.path().join("assets"),
            temp_dir: dir.path().join("tmp"),
            public_dir: dir.path().join("public"),
            records_path: dir.path().join("records.json"),
            backgrounds_dir: dir.path().join("backgrounds"),
        };
        Workspace::new(&storage).with_clock(Arc::new(FixedClock(millis)))
    }

    #[test]
    fn durable_filename_uses_prefix() {
        assert_eq!(
            durable_filename("nl", 1_700_000_000_123, FP),
            "nl_1700000000123_3f2a9c01.mp3"
        );
    }

    #[test]
    fn parse_round_trips_language_with_underscore() {
        let name = durable_filename("pt_BR", 17, FP);
        assert_eq!(parse_durable_filename(&name), Some(("pt_BR", 17, "3f2a9c01")));
        assert_eq!(parse_durable_filename("ocean.mp3"), None);
        assert_eq!(parse_durable_filename("en_12_zzzzzzzz.mp3"), None);
    }

    #[test]
    fn background_path_appends_extension() {
        let dir = TempDir::new().unwrap();
        let ws = workspace(&dir, 1);
        assert_eq!(
            ws.background_path("ocean"),
            dir.path().join("backgrounds").join("ocean.mp3")
        );
    }

    #[tokio::test]
    async fn begin_creates_directories_and_claims_name() {
        let dir = TempDir::new().unwrap();
        let ws = workspace(&dir, 1_700_000_000_000);

        let files = ws.begin("en", FP).await.unwrap();

        assert!(ws.assets_dir().is_dir());
        assert!(ws.temp_dir().is_dir());
        assert!(ws.public_dir().is_dir());
        assert_eq!(files.durable_filename(), "en_1700000000000_3f2a9c01.mp3");
        assert!(files.durable().exists());
        assert_eq!(files.public().file_name(), files.durable().file_name());
    }

    #[tokio::test]
    async fn same_instant_requests_get_distinct_names() {
        let dir = TempDir::new().unwrap();
        let ws = workspace(&dir, 500);

        let first = ws.begin("en", FP).await.unwrap();
        let second = ws.begin("en", FP).await.unwrap();

        assert_eq!(first.durable_filename(), "en_500_3f2a9c01.mp3");
        assert_eq!(second.durable_filename(), "en_501_3f2a9c01.mp3");
        assert_ne!(first.narration(), second.narration());
    }
}
