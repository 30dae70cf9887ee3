use std::io;
use std::path::{Path, PathBuf};

/// Files owned by one generation request.
///
/// Dropping the guard removes the narration and public copy. The durable
/// output is removed too unless [`commit_durable`](Self::commit_durable) was
/// called; after that it is never touched again.
#[derive(Debug)]
pub struct RequestFiles {
    narration: PathBuf,
    durable: PathBuf,
    public: PathBuf,
    committed: bool,
}

impl RequestFiles {
    pub(crate) fn new(narration: PathBuf, durable: PathBuf, public: PathBuf) -> Self {
        Self {
            narration,
            durable,
            public,
            committed: false,
        }
    }

    pub fn narration(&self) -> &Path {
        &self.narration
    }

    pub fn durable(&self) -> &Path {
        &self.durable
    }

    pub fn public(&self) -> &Path {
        &self.public
    }

    pub fn durable_filename(&self) -> &str {
        self.durable
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }

    pub fn is_committed(&self) -> bool {
        self.committed
    }

    /// Write synthesized narration to the temporary file.
    pub async fn stage_narration(&self, audio: &[u8]) -> io::Result<()> {
        tokio::fs::write(&self.narration, audio).await
    }

    /// Hand the durable output over to the catalog; cleanup keeps it.
    pub fn commit_durable(&mut self) {
        self.committed = true;
    }

    /// Copy the durable output to the public path for streaming.
    pub async fn publish(&self) -> io::Result<&Path> {
        tokio::fs::copy(&self.durable, &self.public).await?;
        Ok(&self.public)
    }

    /// Remove the temporary narration now, ahead of drop.
    pub fn discard_narration(&self) {
        remove_quietly(&self.narration);
    }

    /// Remove every file this request still owns. Safe to call repeatedly.
    pub fn cleanup(&mut self) {
        remove_quietly(&self.narration);
        remove_quietly(&self.public);
        if !self.committed {
            remove_quietly(&self.durable);
        }
    }
}

impl Drop for RequestFiles {
    fn drop(&mut self) {
        self.cleanup();
    }
}

fn remove_quietly(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::debug!(path = %path.display(), "removed request file"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to remove request file"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn files(dir: &TempDir) -> RequestFiles {
        let files = RequestFiles::new(
            dir.path().join("narration.mp3"),
            dir.path().join("en_1_abcdef12.mp3"),
            dir.path().join("public.mp3"),
        );
        std::fs::write(files.durable(), b"").unwrap();
        files
    }

    #[tokio::test]
    async fn drop_before_commit_removes_everything() {
        let dir = TempDir::new().unwrap();
        let guard = files(&dir);
        guard.stage_narration(b"speech").await.unwrap();
        let paths = [
            guard.narration().to_path_buf(),
            guard.durable().to_path_buf(),
        ];

        drop(guard);

        for path in paths {
            assert!(!path.exists(), "{} should be gone", path.display());
        }
    }

    #[tokio::test]
    async fn drop_after_commit_keeps_durable_only() {
        let dir = TempDir::new().unwrap();
        let mut guard = files(&dir);
        guard.stage_narration(b"speech").await.unwrap();
        std::fs::write(guard.durable(), b"mixed").unwrap();
        guard.commit_durable();
        let public = guard.publish().await.unwrap().to_path_buf();
        assert_eq!(std::fs::read(&public).unwrap(), b"mixed");

        let durable = guard.durable().to_path_buf();
        let narration = guard.narration().to_path_buf();
        drop(guard);

        assert!(durable.exists());
        assert!(!public.exists());
        assert!(!narration.exists());
    }

    #[test]
    fn cleanup_is_repeatable() {
        let dir = TempDir::new().unwrap();
        let mut guard = files(&dir);
        guard.cleanup();
        guard.cleanup();
        assert!(!guard.durable().exists());
    }

    #[test]
    fn filename_is_durable_basename() {
        let dir = TempDir::new().unwrap();
        let guard = files(&dir);
        assert_eq!(guard.durable_filename(), "en_1_abcdef12.mp3");
    }
}
