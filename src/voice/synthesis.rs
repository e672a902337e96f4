//! Speech synthesis sink

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::config::SynthesisConfig;
use crate::{Error, Result};

/// Renders text as speech
///
/// Fire-and-forget from the interpreter's side: failures are logged by the
/// caller and never reach the user-facing outcome.
#[async_trait]
pub trait SpeechSink: Send + Sync {
    /// Speak a line
    ///
    /// # Errors
    ///
    /// Returns error if the line could not be rendered
    async fn speak(&self, text: &str) -> Result<()>;
}

/// Writes spoken lines to standard output
#[derive(Debug, Clone)]
pub struct ConsoleSink {
    speaker: String,
}

impl ConsoleSink {
    /// Create a console sink labelled with the speaking persona's name
    #[must_use]
    pub fn new(config: &SynthesisConfig, speaker: impl Into<String>) -> Self {
        let speaker = speaker.into();
        tracing::debug!(
            language = %config.language,
            rate = config.rate,
            pitch = config.pitch,
            speaker = %speaker,
            "console speech sink ready"
        );
        Self { speaker }
    }
}

#[async_trait]
impl SpeechSink for ConsoleSink {
    async fn speak(&self, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Err(Error::Synthesis("cannot speak empty text".to_string()));
        }

        let line = format!("{}: {text}\n", self.speaker);
        let mut stdout = tokio::io::stdout();
        stdout.write_all(line.as_bytes()).await?;
        stdout.flush().await?;
        Ok(())
    }
}
