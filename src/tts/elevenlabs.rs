//! ElevenLabs text-to-speech provider.

use super::{SpeechSynthesizer, SynthesisError};
use crate::config::SynthesisConfig;
use crate::defaults;
use futures_util::StreamExt;
use reqwest::StatusCode;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Serialize, PartialEq)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
    style: f32,
    use_speaker_boost: bool,
}

impl VoiceSettings {
    fn meditative() -> Self {
        Self {
            stability: defaults::VOICE_STABILITY,
            similarity_boost: defaults::VOICE_SIMILARITY_BOOST,
            style: defaults::VOICE_STYLE,
            use_speaker_boost: defaults::VOICE_SPEAKER_BOOST,
        }
    }
}

#[derive(Debug, Serialize)]
struct SpeechBody<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

pub struct ElevenLabsSynthesizer {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    primary_language: String,
    primary_model: String,
    multilingual_model: String,
    timeout: Duration,
}

impl ElevenLabsSynthesizer {
    pub fn new(config: &SynthesisConfig) -> Result<Self, SynthesisError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| SynthesisError::Network(format!("failed to build client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            primary_language: config.primary_language.clone(),
            primary_model: config.primary_model.clone(),
            multilingual_model: config.multilingual_model.clone(),
            timeout: config.timeout(),
        })
    }

    /// Primary-language text goes to the primary model, everything else to
    /// the multilingual one.
    pub fn select_model(&self, target_language: &str) -> &str {
        if target_language.eq_ignore_ascii_case(&self.primary_language) {
            &self.primary_model
        } else {
            &self.multilingual_model
        }
    }

    fn voice_url(&self, voice_id: &str) -> String {
        format!("{}/{}", self.endpoint, voice_id)
    }

    fn network_error(&self, e: reqwest::Error) -> SynthesisError {
        if e.is_timeout() {
            SynthesisError::Timeout(self.timeout)
        } else {
            SynthesisError::Network(e.to_string())
        }
    }
}

/// Map a non-success status to the failure kind callers act on.
fn classify_status(status: StatusCode, body: &str) -> SynthesisError {
    let message = body.trim().chars().take(300).collect::<String>();
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SynthesisError::Unauthorized(message),
        StatusCode::TOO_MANY_REQUESTS => SynthesisError::RateLimited(message),
        other => SynthesisError::Provider {
            status: other.as_u16(),
            message,
        },
    }
}

#[async_trait::async_trait]
impl SpeechSynthesizer for ElevenLabsSynthesizer {
    async fn synthesize(
        &self,
        text: &str,
        voice_id: &str,
        target_language: &str,
    ) -> Result<Vec<u8>, SynthesisError> {
        let model_id = self.select_model(target_language);
        let body = SpeechBody {
            text,
            model_id,
            voice_settings: VoiceSettings::meditative(),
        };

        tracing::debug!(
            voice = voice_id,
            model = model_id,
            chars = text.chars().count(),
            "requesting speech synthesis"
        );

        let response = self
            .client
            .post(self.voice_url(voice_id))
            .header("xi-api-key", &self.api_key)
            .header("accept", "audio/mpeg")
            .json(&body)
            .send()
            .await
            .map_err(|e| self.network_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &text));
        }

        let mut audio = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| self.network_error(e))?;
            if audio.len() + chunk.len() > defaults::MAX_SYNTHESIS_BYTES {
                return Err(SynthesisError::Provider {
                    status: status.as_u16(),
                    message: format!(
                        "audio exceeds {} bytes",
                        defaults::MAX_SYNTHESIS_BYTES
                    ),
                });
            }
            audio.extend_from_slice(&chunk);
        }

        if audio.is_empty() {
            return Err(SynthesisError::Provider {
                status: status.as_u16(),
                message: "empty audio body".to_string(),
            });
        }

        Ok(audio)
    }

    fn name(&self) -> &str {
        "elevenlabs"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthesizer() -> ElevenLabsSynthesizer {
        ElevenLabsSynthesizer::new(&SynthesisConfig::default()).unwrap()
    }

    #[test]
    fn english_uses_primary_model() {
        let synth = synthesizer();
        assert_eq!(synth.select_model("en"), "eleven_monolingual_v1");
        assert_eq!(synth.select_model("EN"), "eleven_monolingual_v1");
    }

    #[test]
    fn other_languages_use_multilingual_model() {
        let synth = synthesizer();
        assert_eq!(synth.select_model("nl"), "eleven_multilingual_v2");
        assert_eq!(synth.select_model("ja"), "eleven_multilingual_v2");
    }

    #[test]
    fn voice_url_joins_endpoint_and_voice() {
        let mut config = SynthesisConfig::default();
        config.endpoint = "https://tts.example/v1/text-to-speech/".to_string();
        let synth = ElevenLabsSynthesizer::new(&config).unwrap();
        assert_eq!(
            synth.voice_url("V1"),
            "https://tts.example/v1/text-to-speech/V1"
        );
    }

    #[test]
    fn body_carries_fixed_voice_settings() {
        let body = SpeechBody {
            text: "rest",
            model_id: "m",
            voice_settings: VoiceSettings::meditative(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["voice_settings"]["use_speaker_boost"], true);
        assert_eq!(json["voice_settings"]["style"], 0.0);
        assert_eq!(json["model_id"], "m");
    }

    #[test]
    fn status_classification() {
        assert!(matches!(
            classify_status(StatusCode::UNAUTHORIZED, ""),
            SynthesisError::Unauthorized(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS, "slow down"),
            SynthesisError::RateLimited(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::INTERNAL_SERVER_ERROR, "oops"),
            SynthesisError::Provider { status: 500, .. }
        ));
    }
}
