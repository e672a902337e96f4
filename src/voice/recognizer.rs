//! Speech-to-text provider seam
//!
//! Providers capture and transcribe out of band and report back through a
//! channel of `RecognitionEvent`s tagged with the session that produced them.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::RecognizerConfig;
use crate::{Error, Result};

/// Identifies one listening session
///
/// Issued by the interpreter on every `start_listening`; callbacks carrying
/// an older token are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionToken(pub u64);

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Terminal callback from a speech provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionEvent {
    /// Session the event belongs to
    pub session: SessionToken,

    /// What happened
    pub kind: RecognitionEventKind,
}

/// Kind of terminal recognition event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEventKind {
    /// Final transcript of the utterance
    Final(String),

    /// Provider failed mid-session (no audio, network, ...)
    Error(String),
}

impl RecognitionEvent {
    /// Final transcript event
    #[must_use]
    pub fn final_result(session: SessionToken, utterance: impl Into<String>) -> Self {
        Self {
            session,
            kind: RecognitionEventKind::Final(utterance.into()),
        }
    }

    /// Failure event
    #[must_use]
    pub fn error(session: SessionToken, message: impl Into<String>) -> Self {
        Self {
            session,
            kind: RecognitionEventKind::Error(message.into()),
        }
    }
}

/// Sender half handed to providers
pub type RecognitionSender = mpsc::UnboundedSender<RecognitionEvent>;

/// Receiver half owned by the session driver
pub type RecognitionReceiver = mpsc::UnboundedReceiver<RecognitionEvent>;

/// Create a recognition event channel
#[must_use]
pub fn recognition_channel() -> (RecognitionSender, RecognitionReceiver) {
    mpsc::unbounded_channel()
}

/// External speech-to-text provider
///
/// `start` and `stop` only issue requests; transcripts arrive later as
/// events on the provider's channel.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Begin capturing for a session
    ///
    /// # Errors
    ///
    /// Returns error if capture could not begin
    async fn start(&self, session: SessionToken, config: &RecognizerConfig) -> Result<()>;

    /// Request that capture stop
    ///
    /// A final result already in flight may still be delivered.
    ///
    /// # Errors
    ///
    /// Returns error if the provider rejected the request
    async fn stop(&self) -> Result<()>;
}

/// Treats each line of text input as one recognized utterance
///
/// Stands in for a speech provider on terminals and in tests.
pub struct LineRecognizer<R> {
    events: RecognitionSender,
    input: Arc<tokio::sync::Mutex<Lines<R>>>,
    task: Mutex<Option<JoinHandle<()>>>,
    closed: Arc<AtomicBool>,
}

impl LineRecognizer<BufReader<Stdin>> {
    /// Read utterances from standard input
    #[must_use]
    pub fn stdin(events: RecognitionSender) -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), events)
    }
}

impl<R> LineRecognizer<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    /// Read utterances from any buffered reader
    #[must_use]
    pub fn new(reader: R, events: RecognitionSender) -> Self {
        Self {
            events,
            input: Arc::new(tokio::sync::Mutex::new(reader.lines())),
            task: Mutex::new(None),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Check if the input has reached end of file
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn replace_task(&self, task: Option<JoinHandle<()>>) {
        let previous = self
            .task
            .lock()
            .ok()
            .and_then(|mut current| std::mem::replace(&mut *current, task));

        if let Some(previous) = previous {
            previous.abort();
        }
    }
}

#[async_trait]
impl<R> SpeechRecognizer for LineRecognizer<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    async fn start(&self, session: SessionToken, config: &RecognizerConfig) -> Result<()> {
        if self.is_closed() {
            return Err(Error::RecognizerStart("input closed".to_string()));
        }

        tracing::debug!(
            %session,
            language = %config.language,
            minimum_speech_ms = config.minimum_speech_ms,
            complete_silence_ms = config.complete_silence_ms,
            "line recognizer started"
        );

        let input = self.input.clone();
        let events = self.events.clone();
        let closed = self.closed.clone();

        let task = tokio::spawn(async move {
            let line = input.lock().await.next_line().await;
            let kind = match line {
                Ok(Some(text)) => RecognitionEventKind::Final(text),
                Ok(None) => {
                    closed.store(true, Ordering::SeqCst);
                    RecognitionEventKind::Error("input closed".to_string())
                }
                Err(e) => RecognitionEventKind::Error(e.to_string()),
            };

            if events.send(RecognitionEvent { session, kind }).is_err() {
                tracing::debug!(%session, "recognition receiver dropped");
            }
        });

        self.replace_task(Some(task));
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        self.replace_task(None);
        tracing::debug!("line recognizer stopped");
        Ok(())
    }
}
