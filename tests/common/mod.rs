//! Shared test utilities

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use companion_voice::config::RecognizerConfig;
use companion_voice::{
    ActionHandler, ActivityJournal, CommandCatalog, Dispatcher, Error, HandlerOutcome, Intent,
    ResponseTable, Result, SessionToken, SpeechRecognizer, SpeechSink, VoiceInterpreter,
};

/// A call the interpreter made on the recognizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognizerCall {
    Start(SessionToken),
    Stop,
}

/// Recognizer that records calls instead of capturing audio
#[derive(Default)]
pub struct RecordingRecognizer {
    calls: Mutex<Vec<RecognizerCall>>,
    configs: Mutex<Vec<RecognizerConfig>>,
    failing_starts: AtomicUsize,
    start_attempts: AtomicUsize,
}

impl RecordingRecognizer {
    /// Make subsequent starts fail
    pub fn fail_starts(&self, fail: bool) {
        let remaining = if fail { usize::MAX } else { 0 };
        self.failing_starts.store(remaining, Ordering::SeqCst);
    }

    /// Make only the next `count` starts fail
    pub fn fail_next_starts(&self, count: usize) {
        self.failing_starts.store(count, Ordering::SeqCst);
    }

    /// Calls made so far
    pub fn calls(&self) -> Vec<RecognizerCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Tuning passed to each successful start
    pub fn configs(&self) -> Vec<RecognizerConfig> {
        self.configs.lock().unwrap().clone()
    }

    /// Starts attempted, failed ones included
    pub fn start_attempts(&self) -> usize {
        self.start_attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechRecognizer for RecordingRecognizer {
    async fn start(&self, session: SessionToken, config: &RecognizerConfig) -> Result<()> {
        self.start_attempts.fetch_add(1, Ordering::SeqCst);
        let failing = self.failing_starts.load(Ordering::SeqCst);
        if failing > 0 {
            if failing != usize::MAX {
                self.failing_starts.store(failing - 1, Ordering::SeqCst);
            }
            return Err(Error::RecognizerStart("microphone unavailable".to_string()));
        }
        self.calls.lock().unwrap().push(RecognizerCall::Start(session));
        self.configs.lock().unwrap().push(config.clone());
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        self.calls.lock().unwrap().push(RecognizerCall::Stop);
        Ok(())
    }
}

/// Sink that keeps every spoken line
#[derive(Default)]
pub struct RecordingSink {
    lines: Mutex<Vec<String>>,
}

impl RecordingSink {
    /// Lines spoken so far
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechSink for RecordingSink {
    async fn speak(&self, text: &str) -> Result<()> {
        self.lines.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// Sink that always fails
pub struct BrokenSink;

#[async_trait]
impl SpeechSink for BrokenSink {
    async fn speak(&self, _text: &str) -> Result<()> {
        Err(Error::Synthesis("speaker disconnected".to_string()))
    }
}

/// Handler that fails with a storage integrity error
pub struct FailingHandler;

#[async_trait]
impl ActionHandler for FailingHandler {
    async fn handle(&self, _intent: Intent) -> Result<HandlerOutcome> {
        Err(Error::DataIntegrity("medication log checksum mismatch".to_string()))
    }
}

/// Handler that counts how often it ran
#[derive(Default)]
pub struct CountingHandler {
    calls: Mutex<Vec<Intent>>,
}

impl CountingHandler {
    /// Intents handled so far
    pub fn calls(&self) -> Vec<Intent> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ActionHandler for CountingHandler {
    async fn handle(&self, intent: Intent) -> Result<HandlerOutcome> {
        self.calls.lock().unwrap().push(intent);
        Ok(HandlerOutcome::empty())
    }
}

/// Interpreter over the reference catalog, recording recognizer and sink
pub fn interpreter(
    recognizer: Arc<RecordingRecognizer>,
    sink: Arc<RecordingSink>,
    dispatcher: Dispatcher,
) -> VoiceInterpreter {
    interpreter_with_catalog(CommandCatalog::reference(), recognizer, sink, dispatcher)
}

/// Interpreter over a given catalog
pub fn interpreter_with_catalog(
    catalog: CommandCatalog,
    recognizer: Arc<RecordingRecognizer>,
    sink: Arc<RecordingSink>,
    dispatcher: Dispatcher,
) -> VoiceInterpreter {
    VoiceInterpreter::new(
        catalog,
        recognizer,
        sink,
        Arc::new(ResponseTable::embedded().expect("embedded response table")),
        dispatcher,
    )
}

/// Dispatcher with the built-in handlers
pub fn default_dispatcher() -> Dispatcher {
    Dispatcher::with_defaults(Arc::new(ActivityJournal::new()))
}

/// Neutral line for a situation
pub fn neutral(situation: companion_voice::Situation) -> String {
    use companion_voice::ResponseCatalog;

    ResponseTable::embedded()
        .expect("embedded response table")
        .response(situation, None)
}
