//! Meditation generation: text in, mixed track out.
//!
//! Stages run strictly in order within a request:
//! validate → asset check → credit gate → record → translation → pauses →
//! synthesis → stage narration → composition → public copy → catalog →
//! debit.

use super::error::GenerationError;
use super::stream::MeditationAudio;
use crate::compose::{CommandExecutor, CompositionEngine};
use crate::config::Config;
use crate::credits::CreditLedger;
use crate::files::Workspace;
use crate::pauses::normalize_pauses;
use crate::record::{AudioArtifact, GenerationRequest, MeditationRecord};
use crate::store::RecordStore;
use crate::translate::{TranslationCache, Translator};
use crate::tts::{SpeechSynthesizer, SynthesisError};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// External collaborators the pipeline drives.
pub struct Collaborators {
    pub store: Arc<dyn RecordStore>,
    pub translator: Arc<dyn Translator>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub executor: Arc<dyn CommandExecutor>,
}

struct CreditGate {
    ledger: Arc<dyn CreditLedger>,
    cost: u64,
}

pub struct MeditationPipeline {
    store: Arc<dyn RecordStore>,
    cache: TranslationCache,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    synthesis_timeout: Duration,
    engine: CompositionEngine,
    workspace: Workspace,
    credits: Option<CreditGate>,
}

impl MeditationPipeline {
    pub fn new(collaborators: Collaborators, workspace: Workspace, config: &Config) -> Self {
        let Collaborators {
            store,
            translator,
            synthesizer,
            executor,
        } = collaborators;

        Self {
            cache: TranslationCache::new(translator, store.clone(), config.translation.timeout()),
            store,
            synthesizer,
            synthesis_timeout: config.synthesis.timeout(),
            engine: CompositionEngine::new(executor, &config.composition),
            workspace,
            credits: None,
        }
    }

    /// Require and debit `cost` credits per successful generation.
    pub fn with_credit_gate(mut self, ledger: Arc<dyn CreditLedger>, cost: u64) -> Self {
        self.credits = Some(CreditGate { ledger, cost });
        self
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Turn `request` into a readable meditation track.
    ///
    /// On failure every partial file for the request is gone and the record
    /// gained no artifact. The one exception is the catalog write itself
    /// failing, the last fallible step: the durable output is kept and logged
    /// as an orphan.
    pub async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<MeditationAudio, GenerationError> {
        let started = Instant::now();
        validate(&request)?;

        let fingerprint = request.fingerprint();
        let background = self.workspace.background_path(&request.background);
        if !tokio::fs::try_exists(&background).await.unwrap_or(false) {
            return Err(GenerationError::MissingAsset { path: background });
        }

        self.check_credit(&request).await?;

        let mut record = match self.store.find_by_fingerprint(&fingerprint).await? {
            Some(record) => record,
            None => {
                self.store
                    .create(MeditationRecord::new(
                        request.text.clone(),
                        request.user_id.clone(),
                    ))
                    .await?
            }
        };

        let resolved = self
            .cache
            .resolve(
                &mut record,
                &request.target_language,
                &request.source_language,
                &request.text,
            )
            .await?;

        let narration_text = normalize_pauses(&resolved);
        let narration = self.synthesize(&narration_text, &request).await?;

        let files = self
            .workspace
            .begin(&request.target_language, &fingerprint)
            .await
            .map_err(|e| GenerationError::StorageFailed(format!("failed to reserve output: {e}")))?;
        files.stage_narration(&narration).await.map_err(|e| {
            GenerationError::StorageFailed(format!("failed to stage narration: {e}"))
        })?;

        self.engine
            .compose(files.narration(), &background, files.durable())
            .await?;
        files.discard_narration();

        let artifact = AudioArtifact {
            language: request.target_language.clone(),
            background: request.background.clone(),
            voice: request.voice_id.clone(),
            filename: files.durable_filename().to_string(),
            duration_secs: None,
        };

        files.publish().await.map_err(|e| {
            GenerationError::StorageFailed(format!("failed to publish output: {e}"))
        })?;
        let mut audio = MeditationAudio::open(files, fingerprint.clone(), artifact.clone())
            .await
            .map_err(|e| GenerationError::StorageFailed(format!("failed to open output: {e}")))?;

        // Kept from here on: either catalogued or logged as an orphan below.
        audio.commit_durable();
        if let Err(e) = self
            .store
            .append_audio_artifact(&fingerprint, artifact.clone())
            .await
        {
            tracing::error!(
                fingerprint = %fingerprint,
                path = %audio.durable_path().display(),
                error = %e,
                "durable output orphaned: catalog write failed"
            );
            return Err(e.into());
        }

        self.debit(&request).await;

        tracing::info!(
            fingerprint = %fingerprint,
            language = %request.target_language,
            voice = %request.voice_id,
            background = %request.background,
            filename = %artifact.filename,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "meditation generated"
        );

        Ok(audio)
    }

    async fn synthesize(
        &self,
        text: &str,
        request: &GenerationRequest,
    ) -> Result<Vec<u8>, GenerationError> {
        let started = Instant::now();
        let audio = tokio::time::timeout(
            self.synthesis_timeout,
            self.synthesizer
                .synthesize(text, &request.voice_id, &request.target_language),
        )
        .await
        .map_err(|_| SynthesisError::Timeout(self.synthesis_timeout))??;

        tracing::debug!(
            provider = self.synthesizer.name(),
            bytes = audio.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "narration synthesized"
        );
        Ok(audio)
    }

    async fn check_credit(&self, request: &GenerationRequest) -> Result<(), GenerationError> {
        let Some(gate) = &self.credits else {
            return Ok(());
        };
        let Some(user) = &request.user_id else {
            return Err(GenerationError::InvalidRequest(
                "a user is required when credits are enabled".to_string(),
            ));
        };

        if gate.ledger.has_sufficient_credit(user, gate.cost).await? {
            Ok(())
        } else {
            Err(GenerationError::InsufficientCredit(format!(
                "{user} needs {} credit(s)",
                gate.cost
            )))
        }
    }

    async fn debit(&self, request: &GenerationRequest) {
        if let (Some(gate), Some(user)) = (&self.credits, &request.user_id)
            && let Err(e) = gate.ledger.debit(user, gate.cost).await
        {
            tracing::warn!(user = %user, error = %e, "debit after successful generation failed");
        }
    }
}

/// Reject requests that cannot possibly succeed, before any work is done.
pub fn validate(request: &GenerationRequest) -> Result<(), GenerationError> {
    let required = [
        ("text", &request.text),
        ("voice", &request.voice_id),
        ("background", &request.background),
        ("source language", &request.source_language),
        ("target language", &request.target_language),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(GenerationError::InvalidRequest(format!(
                "{field} must not be empty"
            )));
        }
    }

    let background = &request.background;
    if background.contains(['/', '\\']) || background.starts_with('.') {
        return Err(GenerationError::InvalidRequest(format!(
            "background {background:?} is not a plain track name"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::error::ErrorKind;

    #[test]
    fn validate_accepts_plain_request() {
        let request = GenerationRequest::new("Let go.", "V1", "ocean");
        assert!(validate(&request).is_ok());
    }

    #[test]
    fn validate_rejects_empty_fields() {
        let cases = [
            GenerationRequest::new("   ", "V1", "ocean"),
            GenerationRequest::new("text", "", "ocean"),
            GenerationRequest::new("text", "V1", ""),
            GenerationRequest::new("text", "V1", "ocean").with_languages("en", ""),
        ];
        for request in cases {
            let err = validate(&request).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidRequest, "{request:?}");
        }
    }

    #[test]
    fn validate_rejects_path_like_backgrounds() {
        for name in ["../secrets", "a/b", "a\\b", ".hidden"] {
            let request = GenerationRequest::new("text", "V1", name);
            assert!(
                matches!(validate(&request), Err(GenerationError::InvalidRequest(_))),
                "{name} should be rejected"
            );
        }
    }
}
