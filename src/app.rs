//! Application entry points.
//!
//! Composition root: builds the real providers, store and executor from
//! [`Config`] and runs one CLI command against them.

use crate::backfill::{BackfillReport, backfill_durations};
use crate::compose::SystemCommandExecutor;
use crate::config::{Config, CreditsConfig};
use crate::credits::MemoryCredits;
use crate::diagnostics;
use crate::error::{Result, StillpointError};
use crate::files::Workspace;
use crate::pipeline::{Collaborators, MeditationPipeline};
use crate::record::GenerationRequest;
use crate::store::{JsonFileStore, RecordStore};
use crate::translate::GoogleTranslator;
use crate::tts::ElevenLabsSynthesizer;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Where the text of a generation comes from.
#[derive(Debug, Clone)]
pub enum TextSource {
    Inline(String),
    File(PathBuf),
}

impl TextSource {
    async fn read(&self) -> Result<String> {
        match self {
            TextSource::Inline(text) => Ok(text.clone()),
            TextSource::File(path) => tokio::fs::read_to_string(path).await.map_err(|e| {
                StillpointError::Other(format!("Failed to read {}: {e}", path.display()))
            }),
        }
    }
}

/// Options of the `generate` command.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub text: TextSource,
    pub voice: String,
    pub background: String,
    pub source_language: String,
    pub language: String,
    pub user: Option<String>,
    pub output: PathBuf,
    /// Overrides `synthesis.timeout_secs`.
    pub synthesis_timeout: Option<Duration>,
}

/// Build the production pipeline for `config`.
pub fn build_pipeline(config: &Config, store: Arc<dyn RecordStore>) -> Result<MeditationPipeline> {
    config.validate()?;

    let collaborators = Collaborators {
        store,
        translator: Arc::new(GoogleTranslator::new(&config.translation)?),
        synthesizer: Arc::new(ElevenLabsSynthesizer::new(&config.synthesis)?),
        executor: Arc::new(SystemCommandExecutor::new()),
    };
    let pipeline = MeditationPipeline::new(collaborators, Workspace::new(&config.storage), config);

    if config.credits.enabled {
        let ledger = seeded_ledger(&config.credits);
        Ok(pipeline.with_credit_gate(Arc::new(ledger), config.credits.cost_per_generation))
    } else {
        Ok(pipeline)
    }
}

/// Ledger holding the configured starting balances.
///
/// Balances live in memory only: debits apply within one process and every
/// CLI invocation starts again from `[credits.balances]`. A persistent ledger
/// plugs in through [`MeditationPipeline::with_credit_gate`].
fn seeded_ledger(credits: &CreditsConfig) -> MemoryCredits {
    credits
        .balances
        .iter()
        .fold(MemoryCredits::new(), |ledger, (user, balance)| {
            ledger.with_balance(user, *balance)
        })
}

async fn open_store(config: &Config) -> Result<Arc<JsonFileStore>> {
    Ok(Arc::new(
        JsonFileStore::open(config.storage.records_path.clone()).await?,
    ))
}

fn spinner(quiet: bool, message: &str) -> Option<ProgressBar> {
    if quiet {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        // SAFETY: hardcoded template string, always valid
        #[allow(clippy::expect_used)]
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} ({elapsed})")
            .expect("hardcoded spinner template"),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    Some(pb)
}

/// Run the generate command: text → meditation track at `options.output`.
pub async fn run_generate(mut config: Config, options: GenerateOptions, quiet: bool) -> Result<()> {
    if let Some(timeout) = options.synthesis_timeout {
        config.synthesis.timeout_secs = timeout.as_secs().max(1);
    }

    let text = options.text.read().await?;
    let store = open_store(&config).await?;
    let pipeline = build_pipeline(&config, store)?;

    let mut request = GenerationRequest::new(text, options.voice, options.background)
        .with_languages(options.source_language, options.language);
    if let Some(user) = options.user {
        request = request.with_user(user);
    }

    let pb = spinner(quiet, "Generating meditation");
    let result = pipeline.generate(request).await;
    if let Some(pb) = &pb {
        pb.finish_and_clear();
    }
    let audio = result?;

    let durable = audio.durable_path().to_path_buf();
    let filename = audio.artifact().filename.clone();

    if let Some(parent) = options.output.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut file = tokio::fs::File::create(&options.output).await?;
    let bytes = audio.copy_to(&mut file).await?;

    if !quiet {
        println!("{} {}", "Saved".green(), options.output.display());
        eprintln!("  catalogued as {filename} ({bytes} bytes)");
        eprintln!("  durable copy: {}", durable.display());
    }
    Ok(())
}

/// Run the backfill-durations command.
pub async fn run_backfill(config: &Config, quiet: bool) -> Result<BackfillReport> {
    let store = open_store(config).await?;
    let executor = SystemCommandExecutor::new();

    let pb = spinner(quiet, "Probing durations");
    let report = backfill_durations(
        &*store,
        &executor,
        &config.composition.probe_binary,
        &config.storage.assets_dir,
    )
    .await;
    if let Some(pb) = &pb {
        pb.finish_and_clear();
    }
    let report = report?;

    if !quiet {
        println!(
            "Updated {}, skipped {}, failed {}",
            report.updated,
            report.skipped,
            report.failed.len()
        );
        for (fingerprint, filename) in &report.failed {
            eprintln!("  {} {filename} (record {})", "✗".red(), short(fingerprint));
        }
    }
    Ok(report)
}

/// Run the records command: list the catalog.
pub async fn run_records(config: &Config) -> Result<()> {
    let store = open_store(config).await?;
    let records = store.list().await?;

    if records.is_empty() {
        println!("No meditations in {}", store.path().display());
        return Ok(());
    }

    for record in records {
        let languages: Vec<&str> = record.translations.keys().map(String::as_str).collect();
        let preview: String = record.text.chars().take(48).collect();
        println!(
            "{}  {:<48}  translations: [{}]  artifacts: {}",
            short(&record.fingerprint).green(),
            preview.replace('\n', " "),
            languages.join(", "),
            record.artifacts.len()
        );
        for artifact in &record.artifacts {
            let duration = artifact
                .duration_secs
                .map(|s| humantime::format_duration(Duration::from_secs(s.round() as u64)).to_string())
                .unwrap_or_else(|| "?".to_string());
            println!(
                "    {} [{} / {} / {}] {}",
                artifact.filename, artifact.language, artifact.voice, artifact.background, duration
            );
        }
    }
    Ok(())
}

/// Run the check command. Returns whether everything passed.
pub async fn run_check(config: &Config) -> bool {
    let executor = SystemCommandExecutor::new();
    let checks = diagnostics::run_checks(config, &executor).await;
    diagnostics::print_report(&checks)
}

fn short(fingerprint: &str) -> &str {
    fingerprint
        .get(..crate::defaults::FINGERPRINT_PREFIX_LEN)
        .unwrap_or(fingerprint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credits::CreditLedger;
    use crate::store::MemoryStore;
    use tempfile::TempDir;

    #[tokio::test]
    async fn text_source_reads_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("script.txt");
        std::fs::write(&path, "Breathe in...").unwrap();

        let text = TextSource::File(path).read().await.unwrap();
        assert_eq!(text, "Breathe in...");

        let missing = TextSource::File(dir.path().join("nope.txt")).read().await;
        assert!(matches!(missing, Err(StillpointError::Other(_))));
    }

    #[test]
    fn build_pipeline_rejects_invalid_config() {
        let mut config = Config::default();
        config.synthesis.timeout_secs = 0;
        let result = build_pipeline(&config, Arc::new(MemoryStore::new()));
        assert!(matches!(
            result,
            Err(StillpointError::ConfigInvalidValue { .. })
        ));
    }

    #[test]
    fn build_pipeline_with_defaults() {
        let result = build_pipeline(&Config::default(), Arc::new(MemoryStore::new()));
        assert!(result.is_ok());
    }

    #[test]
    fn short_fingerprint() {
        assert_eq!(short("3f2a9c01d4e5"), "3f2a9c01");
        assert_eq!(short("abc"), "abc");
    }

    #[tokio::test]
    async fn ledger_starts_from_configured_balances_every_time() {
        let mut credits = CreditsConfig::default();
        credits.balances.insert("alice".to_string(), 2);

        let first = seeded_ledger(&credits);
        first.debit("alice", 2).await.unwrap();
        assert_eq!(first.balance("alice").await, Some(0));

        let second = seeded_ledger(&credits);
        assert_eq!(second.balance("alice").await, Some(2));
        assert_eq!(second.balance("bob").await, None);
    }
}
