//! Default constants for stillpoint.
//!
//! The composition constants define the sound of every generated track.
//! Changing them changes the output of already-catalogued meditations, so
//! they are not part of the user configuration.

/// Narration playback speed relative to the synthesized audio.
///
/// 0.85× gives the slow, meditative pace.
pub const NARRATION_TEMPO: f64 = 0.85;

/// Length of the background-only intro, in seconds.
pub const INTRO_SECS: u32 = 5;

/// Fade-in length at the start of the intro, in seconds.
pub const INTRO_FADE_SECS: u32 = 3;

/// Background volume during the intro (fraction of full volume).
pub const INTRO_VOLUME: f64 = 0.25;

/// Background volume underneath the narration (fraction of full volume).
pub const BED_VOLUME: f64 = 0.05;

/// Trailing silence appended after the narration, in seconds.
pub const OUTRO_PAD_SECS: u32 = 10;

/// How many times the background track is repeated under the narration.
///
/// Twenty loops of even a one-minute track outlast any narration the
/// speech provider will produce in a single request.
pub const BACKGROUND_LOOPS: u32 = 20;

/// Max samples `aloop` keeps in its buffer (whole track).
pub const BACKGROUND_LOOP_SIZE: u64 = 2_147_483_647;

/// Fixed VBR quality passed to the MP3 encoder (0 best, 9 worst).
pub const MP3_QUALITY: u8 = 2;

/// Extension of every produced and background audio file.
pub const AUDIO_EXTENSION: &str = "mp3";

/// Number of fingerprint hex characters embedded in output filenames.
pub const FINGERPRINT_PREFIX_LEN: usize = 8;

/// English language code (the speech provider's primary language).
pub const ENGLISH_LANGUAGE: &str = "en";

/// Fixed voice-shaping parameters sent with every synthesis request.
pub const VOICE_STABILITY: f32 = 0.75;
pub const VOICE_SIMILARITY_BOOST: f32 = 0.75;
pub const VOICE_STYLE: f32 = 0.0;
pub const VOICE_SPEAKER_BOOST: bool = true;

pub const DEFAULT_TRANSLATION_ENDPOINT: &str =
    "https://translation.googleapis.com/language/translate/v2";
pub const DEFAULT_SYNTHESIS_ENDPOINT: &str = "https://api.elevenlabs.io/v1/text-to-speech";
pub const DEFAULT_PRIMARY_MODEL: &str = "eleven_monolingual_v1";
pub const DEFAULT_MULTILINGUAL_MODEL: &str = "eleven_multilingual_v2";

pub const TRANSLATION_TIMEOUT_SECS: u64 = 30;
pub const SYNTHESIS_TIMEOUT_SECS: u64 = 120;
pub const COMPOSITION_TIMEOUT_SECS: u64 = 300;
pub const PROBE_TIMEOUT_SECS: u64 = 30;

/// Upper bound on a synthesized narration download (64 MiB).
pub const MAX_SYNTHESIS_BYTES: usize = 64 * 1024 * 1024;

/// Credits debited per successful generation when the credit gate is on.
pub const COST_PER_GENERATION: u64 = 1;
