//! Companion Voice - spoken command interpreter for a medication companion
//!
//! This library provides the core of the companion's voice interface:
//! - Lenient matching of transcribed speech onto a closed set of intents
//! - A listening state machine guarded by per-session tokens
//! - Persona-flavored spoken responses from a two-key lookup table
//! - Dispatch of matched intents to pluggable action handlers
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │        Speech recognizer  →  RecognitionEvent        │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │     SessionDriver (auto-stop) → VoiceInterpreter     │
//! │   CommandCatalog  │  Dispatcher  │  ResponseTable    │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                 Speech synthesis sink                │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod commands;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod intent;
pub mod interpreter;
pub mod matcher;
pub mod persona;
pub mod responses;
pub mod session;
pub mod voice;

pub use commands::{CommandCatalog, CommandRule};
pub use config::Config;
pub use dispatch::{ActionHandler, ActivityJournal, Clock, Dispatcher, HandlerOutcome};
pub use error::{Error, Result};
pub use intent::{Intent, IntentOutcome};
pub use interpreter::{ListeningState, VoiceInterpreter};
pub use matcher::{MatchResult, similarity};
pub use persona::{Persona, PersonaCategory, PersonaRoster};
pub use responses::{ResponseCatalog, ResponseTable, Situation};
pub use session::SessionDriver;
pub use voice::{
    ConsoleSink, LineRecognizer, RecognitionEvent, RecognitionEventKind, SessionToken,
    SpeechRecognizer, SpeechSink,
};
