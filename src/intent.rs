//! Intent catalog and interpreter outcomes
//!
//! The intent set is closed: every downstream handler knows the full list.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// A discrete user goal that spoken input is mapped onto
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    MedicationTaken,
    MedicationSkip,
    MedicationSnooze,
    TellTime,
    ShowSchedule,
    MedicationStatus,
    PetWalkDone,
    PetFeedDone,
    PetWalkReminder,
    Emergency,
    MedicalEmergency,
    Acknowledgment,
}

impl Intent {
    /// Every intent, in reference catalog order
    pub const ALL: [Self; 12] = [
        Self::MedicationTaken,
        Self::MedicationSkip,
        Self::MedicationSnooze,
        Self::TellTime,
        Self::ShowSchedule,
        Self::MedicationStatus,
        Self::PetWalkDone,
        Self::PetFeedDone,
        Self::PetWalkReminder,
        Self::Emergency,
        Self::MedicalEmergency,
        Self::Acknowledgment,
    ];

    /// Machine-readable action identifier
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MedicationTaken => "medication_taken",
            Self::MedicationSkip => "medication_skip",
            Self::MedicationSnooze => "medication_snooze",
            Self::TellTime => "tell_time",
            Self::ShowSchedule => "show_schedule",
            Self::MedicationStatus => "medication_status",
            Self::PetWalkDone => "pet_walk_done",
            Self::PetFeedDone => "pet_feed_done",
            Self::PetWalkReminder => "pet_walk_reminder",
            Self::Emergency => "emergency",
            Self::MedicalEmergency => "medical_emergency",
            Self::Acknowledgment => "acknowledgment",
        }
    }

    /// Whether this intent asks for help from family or medical services
    #[must_use]
    pub const fn is_emergency(self) -> bool {
        matches!(self, Self::Emergency | Self::MedicalEmergency)
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Intent {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|intent| intent.as_str() == s)
            .ok_or_else(|| Error::Catalog(format!("unknown action: {s}")))
    }
}

/// Result of feeding one utterance or recognizer event through the interpreter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentOutcome {
    /// Intent matched and its handler completed
    Handled(Intent),

    /// No rule cleared its confidence threshold
    UnknownCommand,

    /// Intent matched but its handler reported an error
    HandlerFailed {
        /// Matched intent
        intent: Intent,
        /// Handler error message, passed through unmodified
        reason: String,
    },

    /// The recognizer reported a failure for the live session
    RecognitionFailed,

    /// Callback arrived for a session that is no longer listening
    Stale,

    /// No terminal event arrived before the auto-stop backstop fired
    TimedOut,
}

impl IntentOutcome {
    /// Stable tag for tests and logs
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Handled(intent) => intent.as_str(),
            Self::UnknownCommand => "unknown_command",
            Self::HandlerFailed { .. } => "handler_failure",
            Self::RecognitionFailed => "recognition_error",
            Self::Stale => "stale_session",
            Self::TimedOut => "timed_out",
        }
    }
}

impl fmt::Display for IntentOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_action_name() {
        for intent in Intent::ALL {
            assert_eq!(intent.as_str().parse::<Intent>().unwrap(), intent);
        }
    }

    #[test]
    fn rejects_unknown_action() {
        assert!(matches!("dance".parse::<Intent>(), Err(Error::Catalog(_))));
    }

    #[test]
    fn serde_names_match_action_names() {
        let json = serde_json::to_string(&Intent::PetWalkReminder).unwrap();
        assert_eq!(json, "\"pet_walk_reminder\"");
    }

    #[test]
    fn outcome_tags() {
        assert_eq!(IntentOutcome::Handled(Intent::Emergency).tag(), "emergency");
        assert_eq!(IntentOutcome::UnknownCommand.tag(), "unknown_command");
        assert_eq!(
            IntentOutcome::HandlerFailed {
                intent: Intent::TellTime,
                reason: "clock".to_string()
            }
            .tag(),
            "handler_failure"
        );
    }
}
