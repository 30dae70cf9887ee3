//! The response stream handed back by a successful generation.

use crate::files::RequestFiles;
use crate::record::AudioArtifact;
use std::io;
use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, ReadBuf};

/// Readable meditation track.
///
/// Reads come from the public copy. Dropping the stream, whether fully read
/// or abandoned, deletes that copy and the staged narration; the durable
/// output stays.
#[derive(Debug)]
pub struct MeditationAudio {
    // Field order matters: the file handle closes before the guard deletes it.
    file: tokio::fs::File,
    fingerprint: String,
    artifact: AudioArtifact,
    files: RequestFiles,
}

impl MeditationAudio {
    pub(crate) async fn open(
        files: RequestFiles,
        fingerprint: String,
        artifact: AudioArtifact,
    ) -> io::Result<Self> {
        let file = tokio::fs::File::open(files.public()).await?;
        Ok(Self {
            file,
            fingerprint,
            artifact,
            files,
        })
    }

    /// Metadata appended to the meditation record.
    pub fn artifact(&self) -> &AudioArtifact {
        &self.artifact
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn durable_path(&self) -> &Path {
        self.files.durable()
    }

    /// Keep the durable output once this stream is dropped.
    pub(crate) fn commit_durable(&mut self) {
        self.files.commit_durable();
    }

    /// Stream the whole track into `writer`, returning bytes copied.
    pub async fn copy_to<W>(mut self, writer: &mut W) -> io::Result<u64>
    where
        W: tokio::io::AsyncWrite + Unpin,
    {
        tokio::io::copy(&mut self, writer).await
    }
}

impl AsyncRead for MeditationAudio {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().file).poll_read(cx, buf)
    }
}
