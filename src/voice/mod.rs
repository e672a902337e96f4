//! Voice provider seams
//!
//! Speech recognition and synthesis are external services; this module holds
//! the traits the interpreter talks to and line-based stand-ins for terminals.

mod recognizer;
mod synthesis;

pub use recognizer::{
    LineRecognizer, RecognitionEvent, RecognitionEventKind, RecognitionReceiver,
    RecognitionSender, SessionToken, SpeechRecognizer, recognition_channel,
};
pub use synthesis::{ConsoleSink, SpeechSink};
