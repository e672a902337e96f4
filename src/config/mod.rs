//! Configuration management for the companion

pub mod file;

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::{Error, Result};

use self::file::CompanionConfigFile;

/// Companion configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    /// Active persona id (`None` speaks neutral lines)
    pub persona: Option<String>,

    /// Speech recognizer tuning
    pub recognizer: RecognizerConfig,

    /// Listening session configuration
    pub session: SessionConfig,

    /// Speech synthesis configuration
    pub synthesis: SynthesisConfig,

    /// Command catalog file replacing the built-in catalog
    pub commands_path: Option<PathBuf>,

    /// Response table file replacing the embedded table
    pub responses_path: Option<PathBuf>,
}

/// Extended-silence recognizer settings
///
/// Tuned for slowed or paused speech; every value can be overridden.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognizerConfig {
    /// Language tag (e.g. "en-US")
    pub language: String,

    /// Minimum speech length before input may complete
    pub minimum_speech_ms: u64,

    /// Silence after which input is possibly complete
    pub possibly_complete_silence_ms: u64,

    /// Silence after which input is complete
    pub complete_silence_ms: u64,

    /// Hard stop for a single utterance
    pub hard_timeout_ms: u64,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            language: "en-US".to_string(),
            minimum_speech_ms: 3000,
            possibly_complete_silence_ms: 8000,
            complete_silence_ms: 15000,
            hard_timeout_ms: 12000,
        }
    }
}

/// Listening session settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Wall-clock window for a terminal event before listening is stopped
    pub auto_stop: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            auto_stop: Duration::from_secs(20),
        }
    }
}

/// Speech synthesis settings
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisConfig {
    /// Language tag (e.g. "en-US")
    pub language: String,

    /// Speaking rate multiplier
    pub rate: f64,

    /// Pitch multiplier
    pub pitch: f64,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            language: "en-US".to_string(),
            rate: 0.5,
            pitch: 1.0,
        }
    }
}

impl Config {
    /// Load configuration from the environment and config file
    ///
    /// A `persona_override` (e.g. from the command line) wins over both.
    ///
    /// # Errors
    ///
    /// Returns error if the resolved configuration is invalid
    pub fn load(persona_override: Option<&str>) -> Result<Self> {
        let fc = file::load_config_file();
        let mut config = Self::resolve(fc, |key| std::env::var(key).ok());

        if let Some(persona) = persona_override {
            config.persona = Some(persona.to_string()).filter(|p| !p.trim().is_empty());
        }

        config.validate()?;

        tracing::debug!(
            persona = config.persona.as_deref().unwrap_or("neutral"),
            language = %config.recognizer.language,
            auto_stop_secs = config.session.auto_stop.as_secs(),
            "configuration loaded"
        );

        Ok(config)
    }

    /// Resolve configuration with priority env > file > default
    ///
    /// Unparseable env values are ignored.
    #[must_use]
    pub fn resolve(fc: CompanionConfigFile, env: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let parsed = |key: &str| env(key).and_then(|s| parse_env::<u64>(key, &s));

        let recognizer = RecognizerConfig {
            language: env("COMPANION_LANGUAGE")
                .or(fc.recognizer.language)
                .unwrap_or(defaults.recognizer.language),
            minimum_speech_ms: parsed("COMPANION_MIN_SPEECH_MS")
                .or(fc.recognizer.minimum_speech_ms)
                .unwrap_or(defaults.recognizer.minimum_speech_ms),
            possibly_complete_silence_ms: parsed("COMPANION_POSSIBLY_COMPLETE_SILENCE_MS")
                .or(fc.recognizer.possibly_complete_silence_ms)
                .unwrap_or(defaults.recognizer.possibly_complete_silence_ms),
            complete_silence_ms: parsed("COMPANION_COMPLETE_SILENCE_MS")
                .or(fc.recognizer.complete_silence_ms)
                .unwrap_or(defaults.recognizer.complete_silence_ms),
            hard_timeout_ms: parsed("COMPANION_HARD_TIMEOUT_MS")
                .or(fc.recognizer.hard_timeout_ms)
                .unwrap_or(defaults.recognizer.hard_timeout_ms),
        };

        let session = SessionConfig {
            auto_stop: parsed("COMPANION_AUTO_STOP_SECS")
                .or(fc.session.auto_stop_secs)
                .map_or(defaults.session.auto_stop, Duration::from_secs),
        };

        let synthesis = SynthesisConfig {
            language: fc
                .synthesis
                .language
                .unwrap_or(defaults.synthesis.language),
            rate: env("COMPANION_TTS_RATE")
                .and_then(|s| parse_env::<f64>("COMPANION_TTS_RATE", &s))
                .or(fc.synthesis.rate)
                .unwrap_or(defaults.synthesis.rate),
            pitch: env("COMPANION_TTS_PITCH")
                .and_then(|s| parse_env::<f64>("COMPANION_TTS_PITCH", &s))
                .or(fc.synthesis.pitch)
                .unwrap_or(defaults.synthesis.pitch),
        };

        Self {
            persona: env("COMPANION_PERSONA")
                .or(fc.persona)
                .filter(|p| !p.trim().is_empty()),
            recognizer,
            session,
            synthesis,
            commands_path: env("COMPANION_COMMANDS_PATH")
                .or(fc.commands_path)
                .map(PathBuf::from),
            responses_path: env("COMPANION_RESPONSES_PATH")
                .or(fc.responses_path)
                .map(PathBuf::from),
        }
    }

    /// Check the resolved values
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` naming the first invalid setting
    pub fn validate(&self) -> Result<()> {
        if self.recognizer.language.trim().is_empty() {
            return Err(Error::Config("recognizer language is empty".to_string()));
        }

        let thresholds = [
            ("minimum_speech_ms", self.recognizer.minimum_speech_ms),
            (
                "possibly_complete_silence_ms",
                self.recognizer.possibly_complete_silence_ms,
            ),
            ("complete_silence_ms", self.recognizer.complete_silence_ms),
            ("hard_timeout_ms", self.recognizer.hard_timeout_ms),
        ];
        if let Some((name, _)) = thresholds.iter().find(|(_, value)| *value == 0) {
            return Err(Error::Config(format!("recognizer {name} must be positive")));
        }

        if self.session.auto_stop.is_zero() {
            return Err(Error::Config("session auto_stop_secs must be positive".to_string()));
        }

        for (name, value) in [("rate", self.synthesis.rate), ("pitch", self.synthesis.pitch)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::Config(format!(
                    "synthesis {name} must be a positive number, got {value}"
                )));
            }
        }

        Ok(())
    }
}

fn parse_env<T: FromStr>(key: &str, value: &str) -> Option<T> {
    let parsed = value.trim().parse().ok();
    if parsed.is_none() {
        tracing::warn!(key, value, "ignoring unparseable environment value");
    }
    parsed
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::config::file::{RecognizerFileConfig, SessionFileConfig};

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_are_extended_silence() {
        let config = Config::resolve(CompanionConfigFile::default(), env_from(&[]));
        assert_eq!(config, Config::default());
        assert_eq!(config.recognizer.minimum_speech_ms, 3000);
        assert_eq!(config.recognizer.possibly_complete_silence_ms, 8000);
        assert_eq!(config.recognizer.complete_silence_ms, 15000);
        assert_eq!(config.recognizer.hard_timeout_ms, 12000);
        assert_eq!(config.session.auto_stop, Duration::from_secs(20));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn env_overrides_file() {
        let fc = CompanionConfigFile {
            persona: Some("perry_mason".to_string()),
            recognizer: RecognizerFileConfig {
                complete_silence_ms: Some(18000),
                hard_timeout_ms: Some(14000),
                ..Default::default()
            },
            session: SessionFileConfig {
                auto_stop_secs: Some(30),
            },
            ..Default::default()
        };
        let env = env_from(&[
            ("COMPANION_PERSONA", "lucy_ricardo"),
            ("COMPANION_HARD_TIMEOUT_MS", "16000"),
        ]);

        let config = Config::resolve(fc, env);
        assert_eq!(config.persona.as_deref(), Some("lucy_ricardo"));
        assert_eq!(config.recognizer.complete_silence_ms, 18000);
        assert_eq!(config.recognizer.hard_timeout_ms, 16000);
        assert_eq!(config.session.auto_stop, Duration::from_secs(30));
    }

    #[test]
    fn unparseable_env_falls_through() {
        let env = env_from(&[("COMPANION_AUTO_STOP_SECS", "soon"), ("COMPANION_TTS_RATE", "x")]);
        let config = Config::resolve(CompanionConfigFile::default(), env);
        assert_eq!(config.session.auto_stop, Duration::from_secs(20));
        assert!((config.synthesis.rate - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn blank_persona_means_neutral() {
        let config = Config::resolve(
            CompanionConfigFile::default(),
            env_from(&[("COMPANION_PERSONA", "  ")]),
        );
        assert!(config.persona.is_none());
    }

    #[test]
    fn zero_threshold_rejected() {
        let mut config = Config::default();
        config.recognizer.complete_silence_ms = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn zero_auto_stop_rejected() {
        let mut config = Config::default();
        config.session.auto_stop = Duration::ZERO;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn bad_rate_rejected() {
        let mut config = Config::default();
        config.synthesis.rate = f64::NAN;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        config.synthesis.rate = 0.5;
        config.synthesis.pitch = -1.0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn empty_language_rejected() {
        let mut config = Config::default();
        config.recognizer.language = String::new();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}
