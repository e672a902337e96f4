//! Listening session driver
//!
//! Feeds recognizer events into the interpreter and owns the auto-stop
//! backstop: if no terminal event arrives for the live session within the
//! configured window, listening is stopped. A recognizer that fails to
//! start is retried a bounded number of times with doubling backoff.

use std::time::Duration;

use tokio::time::Instant;

use crate::intent::IntentOutcome;
use crate::interpreter::VoiceInterpreter;
use crate::voice::RecognitionReceiver;
use crate::{Error, Result};

/// Start attempts per session before giving up
const DEFAULT_START_ATTEMPTS: u32 = 3;

/// Wait before the first start retry
const DEFAULT_START_BACKOFF: Duration = Duration::from_millis(250);

/// Runs listening sessions for one interpreter
#[derive(Debug)]
pub struct SessionDriver {
    interpreter: VoiceInterpreter,
    events: RecognitionReceiver,
    auto_stop: Duration,
    start_attempts: u32,
    start_backoff: Duration,
}

impl SessionDriver {
    /// Create a driver reading events from `events`
    #[must_use]
    pub const fn new(
        interpreter: VoiceInterpreter,
        events: RecognitionReceiver,
        auto_stop: Duration,
    ) -> Self {
        Self {
            interpreter,
            events,
            auto_stop,
            start_attempts: DEFAULT_START_ATTEMPTS,
            start_backoff: DEFAULT_START_BACKOFF,
        }
    }

    /// Override how often a failed recognizer start is retried
    ///
    /// `attempts` counts the first try; the wait doubles after each failure.
    #[must_use]
    pub fn with_start_retry(mut self, attempts: u32, backoff: Duration) -> Self {
        self.start_attempts = attempts.max(1);
        self.start_backoff = backoff;
        self
    }

    /// The driven interpreter
    #[must_use]
    pub const fn interpreter(&self) -> &VoiceInterpreter {
        &self.interpreter
    }

    /// Run one listening session to its terminal outcome
    ///
    /// Stale events from earlier sessions are skipped.
    ///
    /// # Errors
    ///
    /// Returns `Error::RecognizerStart` if listening could not begin, or
    /// `Error::Recognition` if the event channel closed mid-session (after
    /// speaking the fallback line)
    pub async fn listen_once(&mut self) -> Result<IntentOutcome> {
        let token = self.interpreter.start_listening().await?;
        let deadline = Instant::now() + self.auto_stop;

        loop {
            tokio::select! {
                event = self.events.recv() => {
                    let Some(event) = event else {
                        let error = Error::Recognition("recognition channel closed".to_string());
                        self.interpreter.on_recognition_error(token, &error).await;
                        self.interpreter.stop_listening().await;
                        return Err(error);
                    };

                    match self.interpreter.handle_event(event).await {
                        IntentOutcome::Stale => {}
                        outcome => return Ok(outcome),
                    }
                }
                () = tokio::time::sleep_until(deadline) => {
                    tracing::info!(
                        %token,
                        auto_stop_secs = self.auto_stop.as_secs(),
                        "no speech before auto-stop"
                    );
                    self.interpreter.stop_listening().await;
                    return Ok(IntentOutcome::TimedOut);
                }
            }
        }
    }

    /// Run one session, retrying a failed recognizer start
    ///
    /// # Errors
    ///
    /// Returns `Error::RecognizerStart` once every attempt has failed, or
    /// any other error from [`Self::listen_once`] straight away
    pub async fn listen_with_retry(&mut self) -> Result<IntentOutcome> {
        let mut backoff = self.start_backoff;
        let mut attempt = 1;

        loop {
            match self.listen_once().await {
                Err(Error::RecognizerStart(reason)) if attempt < self.start_attempts => {
                    tracing::warn!(attempt, %reason, ?backoff, "recognizer start failed, retrying");
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    /// Run sessions until the recognizer can no longer start or the event
    /// channel closes
    ///
    /// Each session opens with the listening prompt. Timed-out sessions are
    /// restarted. Returns the number of sessions that reached a terminal
    /// outcome.
    pub async fn run(&mut self) -> usize {
        let mut sessions = 0;

        loop {
            self.interpreter.announce_listening().await;
            match self.listen_with_retry().await {
                Ok(outcome) => {
                    sessions += 1;
                    tracing::debug!(%outcome, sessions, "session finished");
                }
                Err(e) => {
                    tracing::info!(error = %e, "listening ended");
                    return sessions;
                }
            }
        }
    }
}
