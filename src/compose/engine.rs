//! Drives the external audio tool to mix narration with a background bed.

use super::executor::{CommandExecutor, ExecError};
use super::graph::{self, FilterGraph};
use crate::config::CompositionConfig;
use crate::defaults;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Maximum stderr kept in a diagnostic; ffmpeg puts the cause at the end.
const DIAGNOSTIC_TAIL_CHARS: usize = 2000;

#[derive(Debug, Error)]
pub enum CompositionError {
    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error("audio tool exited with {}: {stderr}", exit_label(.code))]
    Exited { code: Option<i32>, stderr: String },

    #[error("audio tool succeeded but produced no output at {}", path.display())]
    MissingOutput { path: PathBuf },

    #[error("composition job already {0}")]
    AlreadyRun(&'static str),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "a signal".to_string(),
    }
}

impl CompositionError {
    /// Text suitable for surfacing to the caller.
    pub fn diagnostic(&self) -> String {
        match self {
            CompositionError::Exited { stderr, .. } if !stderr.trim().is_empty() => {
                stderr.trim().to_string()
            }
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum JobState {
    Pending,
    Running,
    Succeeded { output: PathBuf },
    Failed { diagnostic: String },
}

impl JobState {
    fn label(&self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Running => "running",
            JobState::Succeeded { .. } => "succeeded",
            JobState::Failed { .. } => "failed",
        }
    }
}

/// One invocation of the audio tool. Runs at most once.
#[derive(Debug, Clone)]
pub struct CompositionJob {
    narration: PathBuf,
    background: PathBuf,
    output: PathBuf,
    state: JobState,
}

impl CompositionJob {
    pub fn new(narration: &Path, background: &Path, output: &Path) -> Self {
        Self {
            narration: narration.to_path_buf(),
            background: background.to_path_buf(),
            output: output.to_path_buf(),
            state: JobState::Pending,
        }
    }

    pub fn state(&self) -> &JobState {
        &self.state
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Command-line arguments for the audio tool.
    pub fn args(&self, graph: &FilterGraph) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-i".to_string(),
            self.narration.display().to_string(),
            "-i".to_string(),
            self.background.display().to_string(),
            "-filter_complex".to_string(),
            graph.render(),
            "-map".to_string(),
            format!("[{}]", graph::MIX_LABEL),
            "-c:a".to_string(),
            "libmp3lame".to_string(),
            "-q:a".to_string(),
            defaults::MP3_QUALITY.to_string(),
            self.output.display().to_string(),
        ]
    }

    fn finish(&mut self, result: &Result<PathBuf, CompositionError>) {
        self.state = match result {
            Ok(output) => JobState::Succeeded {
                output: output.clone(),
            },
            Err(e) => JobState::Failed {
                diagnostic: e.diagnostic(),
            },
        };
    }
}

pub struct CompositionEngine {
    executor: Arc<dyn CommandExecutor>,
    binary: String,
    timeout: Duration,
    graph: FilterGraph,
}

impl CompositionEngine {
    pub fn new(executor: Arc<dyn CommandExecutor>, config: &CompositionConfig) -> Self {
        Self {
            executor,
            binary: config.binary.clone(),
            timeout: config.timeout(),
            graph: graph::meditation_graph(),
        }
    }

    pub fn graph(&self) -> &FilterGraph {
        &self.graph
    }

    /// Mix `narration` over `background` into `output`.
    pub async fn compose(
        &self,
        narration: &Path,
        background: &Path,
        output: &Path,
    ) -> Result<PathBuf, CompositionError> {
        let mut job = CompositionJob::new(narration, background, output);
        self.run(&mut job).await
    }

    /// Run a pending job. Exit status is the only success signal.
    pub async fn run(&self, job: &mut CompositionJob) -> Result<PathBuf, CompositionError> {
        if job.state != JobState::Pending {
            return Err(CompositionError::AlreadyRun(job.state.label()));
        }
        job.state = JobState::Running;

        let args = job.args(&self.graph);
        tracing::debug!(binary = %self.binary, output = %job.output.display(), "starting composition");
        let started = Instant::now();

        let result = self.invoke(&args, &job.output).await;
        job.finish(&result);

        match &result {
            Ok(output) => tracing::info!(
                output = %output.display(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "composition finished"
            ),
            Err(e) => tracing::warn!(
                error = %e,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "composition failed"
            ),
        }
        result
    }

    async fn invoke(&self, args: &[String], output: &Path) -> Result<PathBuf, CompositionError> {
        let out = self.executor.execute(&self.binary, args, self.timeout).await?;

        if !out.success {
            return Err(CompositionError::Exited {
                code: out.status_code,
                stderr: tail(&out.stderr, DIAGNOSTIC_TAIL_CHARS),
            });
        }

        if !tokio::fs::try_exists(output).await.unwrap_or(false) {
            return Err(CompositionError::MissingOutput {
                path: output.to_path_buf(),
            });
        }

        Ok(output.to_path_buf())
    }
}

fn tail(text: &str, max_chars: usize) -> String {
    let count = text.chars().count();
    if count <= max_chars {
        return text.to_string();
    }
    text.chars().skip(count - max_chars).collect()
}
