//! Audio duration probing through ffprobe.

use super::executor::{CommandExecutor, ExecError};
use crate::defaults;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("{} does not exist", path.display())]
    Missing { path: PathBuf },

    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error("probe rejected {}: {message}", path.display())]
    Unreadable { path: PathBuf, message: String },

    #[error("probe reported no usable duration for {}: {output:?}", path.display())]
    NoDuration { path: PathBuf, output: String },
}

/// Arguments asking ffprobe for the container duration only.
fn probe_args(path: &Path) -> Vec<String> {
    [
        "-v",
        "error",
        "-show_entries",
        "format=duration",
        "-of",
        "csv=p=0",
    ]
    .iter()
    .map(|s| s.to_string())
    .chain(std::iter::once(path.display().to_string()))
    .collect()
}

fn parse_duration(path: &Path, stdout: &str) -> Result<f64, ProbeError> {
    let value = stdout.trim();
    match value.parse::<f64>() {
        Ok(secs) if secs.is_finite() && secs > 0.0 => Ok(secs),
        _ => Err(ProbeError::NoDuration {
            path: path.to_path_buf(),
            output: value.to_string(),
        }),
    }
}

/// Duration of the audio file at `path`, in seconds.
///
/// Fails when the file is missing, unreadable, or has no positive duration.
pub async fn probe_duration(
    executor: &dyn CommandExecutor,
    probe_binary: &str,
    path: &Path,
) -> Result<f64, ProbeError> {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        return Err(ProbeError::Missing {
            path: path.to_path_buf(),
        });
    }

    let output = executor
        .execute(
            probe_binary,
            &probe_args(path),
            Duration::from_secs(defaults::PROBE_TIMEOUT_SECS),
        )
        .await?;

    if !output.success {
        return Err(ProbeError::Unreadable {
            path: path.to_path_buf(),
            message: output.stderr.trim().to_string(),
        });
    }

    parse_duration(path, &output.stdout)
}
