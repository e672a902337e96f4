//! Voice command interpreter
//!
//! Owns the listening state machine (`Idle` / `Listening`) and the pipeline
//! from a final transcript to a dispatched intent and a spoken line.
//!
//! ```text
//!            start_listening
//!   Idle ─────────────────────▶ Listening(token)
//!    ▲                               │
//!    └── stop | final | error ───────┘
//! ```
//!
//! Every `start_listening` issues a fresh [`SessionToken`]. Recognizer
//! callbacks carry the token of the session that produced them, and anything
//! not addressed to the live session is dropped as stale.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Local, Timelike};

use crate::commands::CommandCatalog;
use crate::config::RecognizerConfig;
use crate::dispatch::Dispatcher;
use crate::intent::IntentOutcome;
use crate::matcher::MatchResult;
use crate::responses::{ResponseCatalog, Situation, render};
use crate::voice::{
    RecognitionEvent, RecognitionEventKind, SessionToken, SpeechRecognizer, SpeechSink,
};
use crate::{Error, Result};

/// Listening state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListeningState {
    /// No session active
    Idle,
    /// Waiting on the recognizer for this session
    Listening(SessionToken),
}

/// Maps spoken input onto intents and drives the spoken response
pub struct VoiceInterpreter {
    catalog: CommandCatalog,
    recognizer: Arc<dyn SpeechRecognizer>,
    sink: Arc<dyn SpeechSink>,
    responses: Arc<dyn ResponseCatalog>,
    dispatcher: Dispatcher,
    recognizer_config: RecognizerConfig,
    persona: Option<String>,
    state: ListeningState,
    next_token: u64,
}

impl VoiceInterpreter {
    /// Create an interpreter speaking neutral lines
    #[must_use]
    pub fn new(
        catalog: CommandCatalog,
        recognizer: Arc<dyn SpeechRecognizer>,
        sink: Arc<dyn SpeechSink>,
        responses: Arc<dyn ResponseCatalog>,
        dispatcher: Dispatcher,
    ) -> Self {
        tracing::debug!(rules = catalog.len(), "voice interpreter created");

        Self {
            catalog,
            recognizer,
            sink,
            responses,
            dispatcher,
            recognizer_config: RecognizerConfig::default(),
            persona: None,
            state: ListeningState::Idle,
            next_token: 0,
        }
    }

    /// Flavor spoken lines with a persona (`None` for neutral)
    #[must_use]
    pub fn with_persona(mut self, persona: Option<String>) -> Self {
        self.persona = persona;
        self
    }

    /// Override the recognizer tuning passed on each start
    #[must_use]
    pub fn with_recognizer_config(mut self, config: RecognizerConfig) -> Self {
        self.recognizer_config = config;
        self
    }

    /// Active persona id
    #[must_use]
    pub fn persona(&self) -> Option<&str> {
        self.persona.as_deref()
    }

    /// Current listening state
    #[must_use]
    pub const fn state(&self) -> ListeningState {
        self.state
    }

    /// Check if a session is live
    #[must_use]
    pub const fn is_listening(&self) -> bool {
        matches!(self.state, ListeningState::Listening(_))
    }

    /// Token of the live session, if any
    #[must_use]
    pub const fn current_session(&self) -> Option<SessionToken> {
        match self.state {
            ListeningState::Listening(token) => Some(token),
            ListeningState::Idle => None,
        }
    }

    /// Match an utterance against the command catalog
    #[must_use]
    pub fn match_utterance(&self, utterance: &str) -> MatchResult {
        self.catalog.match_utterance(utterance)
    }

    /// Begin a listening session
    ///
    /// A live session is stopped first, so the recognizer always sees
    /// stop-then-start.
    ///
    /// # Errors
    ///
    /// Returns `Error::RecognizerStart` if the recognizer could not begin
    /// capture; the interpreter is left `Idle`
    pub async fn start_listening(&mut self) -> Result<SessionToken> {
        if self.is_listening() {
            tracing::debug!("restarting live session");
            self.stop_listening().await;
        }

        self.next_token += 1;
        let token = SessionToken(self.next_token);
        self.state = ListeningState::Listening(token);

        if let Err(e) = self.recognizer.start(token, &self.recognizer_config).await {
            self.state = ListeningState::Idle;
            tracing::warn!(%token, error = %e, "recognizer failed to start");
            return Err(match e {
                Error::RecognizerStart(reason) => Error::RecognizerStart(reason),
                other => Error::RecognizerStart(other.to_string()),
            });
        }

        tracing::info!(%token, "listening");
        Ok(token)
    }

    /// End the live session, if any
    ///
    /// Always asks the recognizer to stop; a failure to do so is logged.
    pub async fn stop_listening(&mut self) {
        if let Err(e) = self.recognizer.stop().await {
            tracing::warn!(error = %e, "recognizer failed to stop");
        }

        if let ListeningState::Listening(token) = self.state {
            tracing::debug!(%token, "stopped listening");
        }
        self.state = ListeningState::Idle;
    }

    /// Route a recognizer event to its callback
    pub async fn handle_event(&mut self, event: RecognitionEvent) -> IntentOutcome {
        match event.kind {
            RecognitionEventKind::Final(utterance) => {
                self.on_recognition_final(event.session, &utterance).await
            }
            RecognitionEventKind::Error(message) => {
                self.on_recognition_error(event.session, &Error::Recognition(message))
                    .await
            }
        }
    }

    /// Final transcript for a session
    pub async fn on_recognition_final(
        &mut self,
        session: SessionToken,
        utterance: &str,
    ) -> IntentOutcome {
        if !self.accept(session) {
            return IntentOutcome::Stale;
        }

        tracing::debug!(%session, utterance, "final transcript");
        self.process_text(utterance).await
    }

    /// Recognizer failure for a session
    ///
    /// Speaks the "didn't catch that" line; the error goes no further.
    pub async fn on_recognition_error(
        &mut self,
        session: SessionToken,
        error: &Error,
    ) -> IntentOutcome {
        if !self.accept(session) {
            return IntentOutcome::Stale;
        }

        tracing::warn!(%session, error = %error, "recognition failed");
        self.speak(Situation::FallbackError, &BTreeMap::new()).await;
        IntentOutcome::RecognitionFailed
    }

    /// Run the match, dispatch and speak pipeline on typed or transcribed text
    ///
    /// Does not touch the listening state.
    pub async fn process_text(&self, utterance: &str) -> IntentOutcome {
        let utterance = utterance.trim().to_lowercase();
        let matched = self.catalog.match_utterance(&utterance);

        let Some(intent) = matched.action else {
            tracing::info!(utterance = %utterance, "unknown command");
            self.speak(Situation::FallbackUnknown, &BTreeMap::new()).await;
            return IntentOutcome::UnknownCommand;
        };

        tracing::info!(action = %intent, score = matched.score, "command matched");

        match self.dispatcher.dispatch(intent).await {
            Ok(outcome) => {
                self.speak(Situation::for_intent(intent), &outcome.variables)
                    .await;
                IntentOutcome::Handled(intent)
            }
            Err(e) => {
                tracing::warn!(action = %intent, error = %e, "handler failed");
                self.speak(Situation::Apology, &BTreeMap::new()).await;
                IntentOutcome::HandlerFailed {
                    intent,
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Speak the greeting for the current time of day
    pub async fn greet(&self) {
        let part = time_of_day(Local::now().hour());
        let vars = BTreeMap::from([("time_of_day".to_string(), part.to_string())]);
        self.speak(Situation::Greeting, &vars).await;
    }

    /// Speak the "I'm listening" prompt
    pub async fn announce_listening(&self) {
        self.speak(Situation::Listening, &BTreeMap::new()).await;
    }

    /// Speak a medication reminder
    pub async fn remind(&self, medication: &str, dosage: &str, with_food: bool) {
        let situation = if with_food {
            Situation::ReminderWithFood
        } else {
            Situation::Reminder
        };
        let vars = BTreeMap::from([
            ("medication".to_string(), medication.to_string()),
            ("dosage".to_string(), dosage.to_string()),
        ]);
        self.speak(situation, &vars).await;
    }

    /// Consume a callback for `session` if it is the live one
    fn accept(&mut self, session: SessionToken) -> bool {
        if self.current_session() == Some(session) {
            self.state = ListeningState::Idle;
            true
        } else {
            tracing::debug!(%session, current = ?self.current_session(), "discarding stale callback");
            false
        }
    }

    async fn speak(&self, situation: Situation, variables: &BTreeMap<String, String>) {
        let template = self.responses.response(situation, self.persona.as_deref());
        let text = render(&template, variables);

        tracing::debug!(%situation, persona = ?self.persona, "speaking");
        if let Err(e) = self.sink.speak(&text).await {
            tracing::warn!(%situation, error = %e, "speech synthesis failed");
        }
    }
}

impl std::fmt::Debug for VoiceInterpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceInterpreter")
            .field("rules", &self.catalog.len())
            .field("persona", &self.persona)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Part of the day named in the greeting
#[must_use]
pub const fn time_of_day(hour: u32) -> &'static str {
    match hour {
        0..12 => "morning",
        12..17 => "afternoon",
        _ => "evening",
    }
}
