//! TOML configuration file loading
//!
//! Supports `~/.config/companion/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::PathBuf;

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct CompanionConfigFile {
    /// Persona identifier (e.g. "june_cleaver")
    #[serde(default)]
    pub persona: Option<String>,

    /// Command catalog replacing the built-in one
    #[serde(default)]
    pub commands_path: Option<String>,

    /// Response table replacing the embedded one
    #[serde(default)]
    pub responses_path: Option<String>,

    /// Speech recognizer tuning
    #[serde(default)]
    pub recognizer: RecognizerFileConfig,

    /// Listening session configuration
    #[serde(default)]
    pub session: SessionFileConfig,

    /// Speech synthesis configuration
    #[serde(default)]
    pub synthesis: SynthesisFileConfig,
}

/// Speech recognizer configuration
#[derive(Debug, Default, Deserialize)]
pub struct RecognizerFileConfig {
    /// Language tag (e.g. "en-US")
    pub language: Option<String>,

    /// Minimum speech length before input may complete
    pub minimum_speech_ms: Option<u64>,

    /// Silence after which input is possibly complete
    pub possibly_complete_silence_ms: Option<u64>,

    /// Silence after which input is complete
    pub complete_silence_ms: Option<u64>,

    /// Hard stop for a single utterance
    pub hard_timeout_ms: Option<u64>,
}

/// Listening session configuration
#[derive(Debug, Default, Deserialize)]
pub struct SessionFileConfig {
    /// Seconds without a terminal event before listening is stopped
    pub auto_stop_secs: Option<u64>,
}

/// Speech synthesis configuration
#[derive(Debug, Default, Deserialize)]
pub struct SynthesisFileConfig {
    /// Language tag (e.g. "en-US")
    pub language: Option<String>,

    /// Speaking rate multiplier
    pub rate: Option<f64>,

    /// Pitch multiplier
    pub pitch: Option<f64>,
}

/// Load the TOML config file from the standard path
///
/// Returns `CompanionConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> CompanionConfigFile {
    let Some(path) = config_file_path() else {
        return CompanionConfigFile::default();
    };

    if !path.exists() {
        return CompanionConfigFile::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                CompanionConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            CompanionConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/companion/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("companion").join("config.toml"))
}
