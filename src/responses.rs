//! Spoken response lines
//!
//! Lines are looked up by `(situation, persona)`. Every situation has a
//! neutral line, used when no persona is active or the persona has no line of
//! its own. Lines may carry `{{placeholder}}` variables filled at speak time.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::intent::Intent;
use crate::persona::{Persona, PersonaRoster};
use crate::{Error, Result};

/// Embedded persona roster and response lines
const EMBEDDED_RESPONSES: &str = include_str!("../personas/companions.json");

/// Occasion for a spoken line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Situation {
    Reminder,
    ReminderWithFood,
    Confirmation,
    Greeting,
    Emergency,
    FallbackError,
    FallbackUnknown,
    Listening,
    Apology,
    Skipped,
    Snoozed,
    TimeCheck,
    Schedule,
    MedicationStatus,
    PetWalkLogged,
    PetFedLogged,
    PetWalkReminder,
    MedicalEmergency,
    Acknowledgment,
}

impl Situation {
    /// Every situation
    pub const ALL: [Self; 19] = [
        Self::Reminder,
        Self::ReminderWithFood,
        Self::Confirmation,
        Self::Greeting,
        Self::Emergency,
        Self::FallbackError,
        Self::FallbackUnknown,
        Self::Listening,
        Self::Apology,
        Self::Skipped,
        Self::Snoozed,
        Self::TimeCheck,
        Self::Schedule,
        Self::MedicationStatus,
        Self::PetWalkLogged,
        Self::PetFedLogged,
        Self::PetWalkReminder,
        Self::MedicalEmergency,
        Self::Acknowledgment,
    ];

    /// Key used in response files
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Reminder => "reminder",
            Self::ReminderWithFood => "reminder_with_food",
            Self::Confirmation => "confirmation",
            Self::Greeting => "greeting",
            Self::Emergency => "emergency",
            Self::FallbackError => "fallback_error",
            Self::FallbackUnknown => "fallback_unknown",
            Self::Listening => "listening",
            Self::Apology => "apology",
            Self::Skipped => "skipped",
            Self::Snoozed => "snoozed",
            Self::TimeCheck => "time_check",
            Self::Schedule => "schedule",
            Self::MedicationStatus => "medication_status",
            Self::PetWalkLogged => "pet_walk_logged",
            Self::PetFedLogged => "pet_fed_logged",
            Self::PetWalkReminder => "pet_walk_reminder",
            Self::MedicalEmergency => "medical_emergency",
            Self::Acknowledgment => "acknowledgment",
        }
    }

    /// The line spoken after an intent's handler succeeds
    #[must_use]
    pub const fn for_intent(intent: Intent) -> Self {
        match intent {
            Intent::MedicationTaken => Self::Confirmation,
            Intent::MedicationSkip => Self::Skipped,
            Intent::MedicationSnooze => Self::Snoozed,
            Intent::TellTime => Self::TimeCheck,
            Intent::ShowSchedule => Self::Schedule,
            Intent::MedicationStatus => Self::MedicationStatus,
            Intent::PetWalkDone => Self::PetWalkLogged,
            Intent::PetFeedDone => Self::PetFedLogged,
            Intent::PetWalkReminder => Self::PetWalkReminder,
            Intent::Emergency => Self::Emergency,
            Intent::MedicalEmergency => Self::MedicalEmergency,
            Intent::Acknowledgment => Self::Acknowledgment,
        }
    }
}

impl fmt::Display for Situation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Situation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|situation| situation.as_str() == s)
            .ok_or_else(|| Error::Catalog(format!("unknown situation: {s}")))
    }
}

/// Source of spoken lines
pub trait ResponseCatalog: Send + Sync {
    /// Line for a situation, flavored by the persona when one is given
    ///
    /// `None` yields the neutral, persona-free line.
    fn response(&self, situation: Situation, persona: Option<&str>) -> String;
}

/// Response file schema
#[derive(Debug, Deserialize)]
struct ResponseFile {
    neutral: BTreeMap<String, String>,
    #[serde(default)]
    personas: Vec<PersonaEntry>,
}

#[derive(Debug, Deserialize)]
struct PersonaEntry {
    #[serde(flatten)]
    persona: Persona,
    #[serde(default)]
    lines: BTreeMap<String, String>,
}

/// Two-key `(situation, persona)` lookup table with neutral defaults
#[derive(Debug, Clone)]
pub struct ResponseTable {
    neutral: HashMap<Situation, String>,
    lines: HashMap<(Situation, String), String>,
    roster: PersonaRoster,
}

impl ResponseTable {
    /// Build from the response table compiled into the binary
    ///
    /// # Errors
    ///
    /// Returns error if the embedded table is malformed
    pub fn embedded() -> Result<Self> {
        Self::from_json(EMBEDDED_RESPONSES)
    }

    /// Load a response table from a JSON file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or is malformed
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let table = Self::from_json(&content)
            .map_err(|e| Error::Catalog(format!("{}: {e}", path.display())))?;
        tracing::info!(
            path = %path.display(),
            personas = table.roster.len(),
            "loaded response table"
        );
        Ok(table)
    }

    /// Parse and validate a response table
    ///
    /// # Errors
    ///
    /// Returns error if JSON is malformed, a situation key is unknown, a
    /// persona id repeats, or the neutral lines miss a situation
    pub fn from_json(content: &str) -> Result<Self> {
        let file: ResponseFile = serde_json::from_str(content)?;

        let mut neutral = HashMap::new();
        for (key, line) in file.neutral {
            neutral.insert(key.parse::<Situation>()?, line);
        }

        if let Some(missing) = Situation::ALL.iter().find(|s| !neutral.contains_key(s)) {
            return Err(Error::Catalog(format!("no neutral line for {missing}")));
        }

        let mut lines = HashMap::new();
        let mut personas = Vec::with_capacity(file.personas.len());
        for entry in file.personas {
            for (key, line) in entry.lines {
                let situation = key.parse::<Situation>().map_err(|e| {
                    Error::Catalog(format!("persona {}: {e}", entry.persona.id))
                })?;
                lines.insert((situation, entry.persona.id.clone()), line);
            }
            personas.push(entry.persona);
        }

        let roster = PersonaRoster::new(personas)?;

        tracing::debug!(
            personas = roster.len(),
            lines = lines.len(),
            "response table built"
        );

        Ok(Self {
            neutral,
            lines,
            roster,
        })
    }

    /// Personas that have lines in this table
    #[must_use]
    pub const fn roster(&self) -> &PersonaRoster {
        &self.roster
    }
}

impl ResponseCatalog for ResponseTable {
    fn response(&self, situation: Situation, persona: Option<&str>) -> String {
        persona
            .and_then(|id| self.lines.get(&(situation, id.to_string())))
            .or_else(|| self.neutral.get(&situation))
            .cloned()
            .unwrap_or_default()
    }
}

/// Fill `{{name}}` placeholders from `variables`
///
/// Runs a single left-to-right pass, so substituted values are never
/// expanded again. Placeholders without a value are left as written.
#[must_use]
pub fn render(template: &str, variables: &BTreeMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let tail = &rest[open + 2..];
        let Some(close) = tail.find("}}") else {
            rest = &rest[open..];
            break;
        };

        match variables.get(&tail[..close]) {
            Some(value) => out.push_str(value),
            None => out.push_str(&rest[open..open + close + 4]),
        }
        rest = &tail[close + 2..];
    }

    out.push_str(rest);
    out
}
