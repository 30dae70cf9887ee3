use crate::defaults;
use crate::error::{Result, StillpointError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub translation: TranslationConfig,
    pub synthesis: SynthesisConfig,
    pub composition: CompositionConfig,
    pub credits: CreditsConfig,
}

/// Where files live.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// Durable outputs, one flat directory.
    pub assets_dir: PathBuf,
    /// Narration staging files.
    pub temp_dir: PathBuf,
    /// Transient copies handed out as response streams.
    pub public_dir: PathBuf,
    /// JSON catalog of meditation records.
    pub records_path: PathBuf,
    /// Background tracks, addressed as `<name>.mp3`.
    pub backgrounds_dir: PathBuf,
}

/// Translation provider configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TranslationConfig {
    pub endpoint: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

/// Speech synthesis provider configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SynthesisConfig {
    pub endpoint: String,
    pub api_key: String,
    /// Language the provider's primary model is tuned for.
    pub primary_language: String,
    pub primary_model: String,
    pub multilingual_model: String,
    pub timeout_secs: u64,
}

/// External audio tool configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CompositionConfig {
    pub binary: String,
    pub probe_binary: String,
    pub timeout_secs: u64,
}

/// Credit gate configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CreditsConfig {
    pub enabled: bool,
    pub cost_per_generation: u64,
    /// Starting balance per user for the in-process ledger. Debits are not
    /// written back, so each CLI run starts from these values.
    pub balances: BTreeMap<String, u64>,
}

fn data_root() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from(".local/share"))
        .join("stillpoint")
}

impl Default for StorageConfig {
    fn default() -> Self {
        let root = data_root();
        Self {
            assets_dir: root.join("assets"),
            temp_dir: std::env::temp_dir().join("stillpoint"),
            public_dir: root.join("public"),
            records_path: root.join("records.json"),
            backgrounds_dir: root.join("backgrounds"),
        }
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::DEFAULT_TRANSLATION_ENDPOINT.to_string(),
            api_key: String::new(),
            timeout_secs: defaults::TRANSLATION_TIMEOUT_SECS,
        }
    }
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::DEFAULT_SYNTHESIS_ENDPOINT.to_string(),
            api_key: String::new(),
            primary_language: defaults::ENGLISH_LANGUAGE.to_string(),
            primary_model: defaults::DEFAULT_PRIMARY_MODEL.to_string(),
            multilingual_model: defaults::DEFAULT_MULTILINGUAL_MODEL.to_string(),
            timeout_secs: defaults::SYNTHESIS_TIMEOUT_SECS,
        }
    }
}

impl Default for CompositionConfig {
    fn default() -> Self {
        Self {
            binary: "ffmpeg".to_string(),
            probe_binary: "ffprobe".to_string(),
            timeout_secs: defaults::COMPOSITION_TIMEOUT_SECS,
        }
    }
}

impl Default for CreditsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            cost_per_generation: defaults::COST_PER_GENERATION,
            balances: BTreeMap::new(),
        }
    }
}

impl TranslationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl SynthesisConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl CompositionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Missing fields use default values.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StillpointError::ConfigFileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                StillpointError::Io(e)
            }
        })?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if the file doesn't exist.
    ///
    /// Invalid TOML is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Err(StillpointError::ConfigFileNotFound { .. }) => Ok(Self::default()),
            other => other,
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - STILLPOINT_TRANSLATE_API_KEY → translation.api_key
    /// - STILLPOINT_ELEVENLABS_API_KEY → synthesis.api_key
    /// - STILLPOINT_ASSETS_DIR → storage.assets_dir
    /// - STILLPOINT_FFMPEG → composition.binary
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(key) = std::env::var("STILLPOINT_TRANSLATE_API_KEY")
            && !key.is_empty()
        {
            self.translation.api_key = key;
        }

        if let Ok(key) = std::env::var("STILLPOINT_ELEVENLABS_API_KEY")
            && !key.is_empty()
        {
            self.synthesis.api_key = key;
        }

        if let Ok(dir) = std::env::var("STILLPOINT_ASSETS_DIR")
            && !dir.is_empty()
        {
            self.storage.assets_dir = PathBuf::from(dir);
        }

        if let Ok(binary) = std::env::var("STILLPOINT_FFMPEG")
            && !binary.is_empty()
        {
            self.composition.binary = binary;
        }

        self
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        let timeouts = [
            ("translation.timeout_secs", self.translation.timeout_secs),
            ("synthesis.timeout_secs", self.synthesis.timeout_secs),
            ("composition.timeout_secs", self.composition.timeout_secs),
        ];
        for (key, value) in timeouts {
            if value == 0 {
                return Err(StillpointError::ConfigInvalidValue {
                    key: key.to_string(),
                    message: "must be greater than zero".to_string(),
                });
            }
        }

        if self.composition.binary.trim().is_empty() {
            return Err(StillpointError::ConfigInvalidValue {
                key: "composition.binary".to_string(),
                message: "must not be empty".to_string(),
            });
        }

        if self.synthesis.primary_language.trim().is_empty() {
            return Err(StillpointError::ConfigInvalidValue {
                key: "synthesis.primary_language".to_string(),
                message: "must not be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/stillpoint/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join("stillpoint")
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // Mutex to serialize tests that modify environment variables
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    // SAFETY: only used in tests with ENV_LOCK held.
    fn set_env(key: &str, value: &str) {
        unsafe { std::env::set_var(key, value) }
    }

    fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) }
    }

    fn clear_stillpoint_env() {
        remove_env("STILLPOINT_TRANSLATE_API_KEY");
        remove_env("STILLPOINT_ELEVENLABS_API_KEY");
        remove_env("STILLPOINT_ASSETS_DIR");
        remove_env("STILLPOINT_FFMPEG");
    }

    #[test]
    fn test_default_config_has_correct_values() {
        let config = Config::default();

        assert_eq!(config.synthesis.primary_language, "en");
        assert_eq!(config.synthesis.primary_model, "eleven_monolingual_v1");
        assert_eq!(config.synthesis.multilingual_model, "eleven_multilingual_v2");
        assert_eq!(config.composition.binary, "ffmpeg");
        assert_eq!(config.composition.probe_binary, "ffprobe");
        assert_eq!(config.translation.timeout_secs, 30);
        assert!(!config.credits.enabled);
        assert!(config.storage.records_path.ends_with("records.json"));
    }

    #[test]
    fn test_load_from_toml_file() {
        let toml_content = r#"
            [storage]
            assets_dir = "/srv/meditations"
            backgrounds_dir = "/srv/backgrounds"

            [synthesis]
            api_key = "secret"
            timeout_secs = 45

            [composition]
            binary = "/usr/local/bin/ffmpeg"

            [credits]
            enabled = true
            cost_per_generation = 3

            [credits.balances]
            alice = 10
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = Config::load(temp_file.path()).unwrap();

        assert_eq!(config.storage.assets_dir, PathBuf::from("/srv/meditations"));
        assert_eq!(
            config.storage.backgrounds_dir,
            PathBuf::from("/srv/backgrounds")
        );
        assert_eq!(config.synthesis.api_key, "secret");
        assert_eq!(config.synthesis.timeout(), Duration::from_secs(45));
        assert_eq!(config.composition.binary, "/usr/local/bin/ffmpeg");
        assert!(config.credits.enabled);
        assert_eq!(config.credits.cost_per_generation, 3);
        assert_eq!(config.credits.balances.get("alice"), Some(&10));

        // Untouched sections keep defaults
        assert_eq!(config.translation, TranslationConfig::default());
    }

    #[test]
    fn test_env_override_keys() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_stillpoint_env();

        set_env("STILLPOINT_ELEVENLABS_API_KEY", "xi-key");
        set_env("STILLPOINT_TRANSLATE_API_KEY", "g-key");
        let config = Config::default().with_env_overrides();

        assert_eq!(config.synthesis.api_key, "xi-key");
        assert_eq!(config.translation.api_key, "g-key");
        assert_eq!(config.composition.binary, "ffmpeg");

        clear_stillpoint_env();
    }

    #[test]
    fn test_env_override_empty_string_ignored() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_stillpoint_env();

        set_env("STILLPOINT_FFMPEG", "");
        let config = Config::default().with_env_overrides();
        assert_eq!(config.composition.binary, "ffmpeg");

        clear_stillpoint_env();
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"[storage\nassets_dir = \"broken").unwrap();

        let result = Config::load(temp_file.path());
        assert!(matches!(result, Err(StillpointError::Config(_))));
    }

    #[test]
    fn test_load_or_default_returns_default_for_missing_file() {
        let missing_path = Path::new("/tmp/nonexistent_stillpoint_config_12345.toml");
        let config = Config::load_or_default(missing_path).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.composition.timeout_secs = 0;

        match config.validate() {
            Err(StillpointError::ConfigInvalidValue { key, .. }) => {
                assert_eq!(key, "composition.timeout_secs");
            }
            other => panic!("Expected ConfigInvalidValue, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_default_path_is_xdg_compliant() {
        let path = Config::default_path();
        let path_str = path.to_string_lossy();

        assert!(path_str.contains("stillpoint"));
        assert!(path_str.ends_with("config.toml"));
    }
}
