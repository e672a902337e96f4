//! Downstream action handlers
//!
//! Each matched intent is routed to one `ActionHandler`. Handlers may fail;
//! the interpreter turns failures into a spoken apology instead of crashing
//! the listening state machine.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta};

use crate::intent::Intent;
use crate::{Error, Result};

/// Values a handler hands back for the confirmation line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandlerOutcome {
    /// Template variables (e.g. `time`, `last_dose`)
    pub variables: BTreeMap<String, String>,
}

impl HandlerOutcome {
    /// Outcome with no template variables
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Add a template variable
    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.variables.insert(name.to_string(), value.into());
        self
    }
}

/// Performs the work behind an intent
#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// Handle a matched intent
    ///
    /// # Errors
    ///
    /// Returns error if the action could not be carried out
    async fn handle(&self, intent: Intent) -> Result<HandlerOutcome>;
}

/// Routes intents to their handlers
#[derive(Clone, Default)]
pub struct Dispatcher {
    handlers: HashMap<Intent, Arc<dyn ActionHandler>>,
}

impl Dispatcher {
    /// Create a dispatcher with no handlers
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a dispatcher with the built-in handlers
    ///
    /// `tell_time` goes to a [`Clock`]; every other intent is recorded in the
    /// given [`ActivityJournal`].
    #[must_use]
    pub fn with_defaults(journal: Arc<ActivityJournal>) -> Self {
        let mut dispatcher = Self::new();
        for intent in Intent::ALL {
            if intent == Intent::TellTime {
                dispatcher.register(intent, Arc::new(Clock));
            } else {
                dispatcher.register(intent, journal.clone());
            }
        }
        dispatcher
    }

    /// Register (or replace) the handler for an intent
    pub fn register(&mut self, intent: Intent, handler: Arc<dyn ActionHandler>) {
        self.handlers.insert(intent, handler);
    }

    /// Check if an intent has a handler
    #[must_use]
    pub fn handles(&self, intent: Intent) -> bool {
        self.handlers.contains_key(&intent)
    }

    /// Run the handler registered for an intent
    ///
    /// # Errors
    ///
    /// Returns `Error::Handler` if no handler is registered, or whatever the
    /// handler itself returns
    pub async fn dispatch(&self, intent: Intent) -> Result<HandlerOutcome> {
        let handler = self
            .handlers
            .get(&intent)
            .ok_or_else(|| Error::Handler(format!("no handler registered for {intent}")))?;

        tracing::debug!(%intent, "dispatching intent");
        handler.handle(intent).await
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("intents", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Reads the local wall clock for `tell_time`
#[derive(Debug, Clone, Copy, Default)]
pub struct Clock;

impl Clock {
    /// Format a time the way it is spoken, e.g. "3:05 PM"
    #[must_use]
    pub fn spoken(time: &DateTime<Local>) -> String {
        time.format("%-I:%M %p").to_string()
    }
}

#[async_trait]
impl ActionHandler for Clock {
    async fn handle(&self, _intent: Intent) -> Result<HandlerOutcome> {
        Ok(HandlerOutcome::empty().with("time", Self::spoken(&Local::now())))
    }
}

/// A recorded medication, pet care or emergency event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityEntry {
    /// Intent that was handled
    pub intent: Intent,

    /// When it was handled
    pub at: DateTime<Local>,
}

/// Entries older than this are pruned on each record
const JOURNAL_RETENTION: TimeDelta = TimeDelta::hours(24);

/// Most entries the journal keeps
const JOURNAL_CAPACITY: usize = 256;

/// In-memory journal of handled intents
///
/// Keeps the last day of activity, capped at a fixed number of entries.
#[derive(Debug, Default)]
pub struct ActivityJournal {
    entries: Mutex<Vec<ActivityEntry>>,
}

impl ActivityJournal {
    /// Create an empty journal
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an intent at the given time
    ///
    /// # Errors
    ///
    /// Returns error if the journal lock is poisoned
    pub fn record(&self, intent: Intent, at: DateTime<Local>) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| Error::Handler("activity journal lock poisoned".to_string()))?;

        entries.retain(|entry| at - entry.at < JOURNAL_RETENTION);
        entries.push(ActivityEntry { intent, at });

        let excess = entries.len().saturating_sub(JOURNAL_CAPACITY);
        if excess > 0 {
            entries.drain(..excess);
        }
        Ok(())
    }

    /// Snapshot of retained entries, oldest first
    #[must_use]
    pub fn entries(&self) -> Vec<ActivityEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    /// Most recent entry for an intent
    #[must_use]
    pub fn last(&self, intent: Intent) -> Option<ActivityEntry> {
        self.entries
            .lock()
            .ok()?
            .iter()
            .rev()
            .find(|entry| entry.intent == intent)
            .cloned()
    }
}

#[async_trait]
impl ActionHandler for ActivityJournal {
    async fn handle(&self, intent: Intent) -> Result<HandlerOutcome> {
        if intent == Intent::MedicationStatus {
            let last_dose = self.last(Intent::MedicationTaken).map_or_else(
                || "not recorded yet today".to_string(),
                |entry| format!("at {}", Clock::spoken(&entry.at)),
            );
            return Ok(HandlerOutcome::empty().with("last_dose", last_dose));
        }

        if intent.is_emergency() {
            tracing::warn!(%intent, "emergency requested");
        } else {
            tracing::info!(%intent, "activity recorded");
        }

        self.record(intent, Local::now())?;
        Ok(HandlerOutcome::empty())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[tokio::test]
    async fn missing_handler_is_a_handler_error() {
        let dispatcher = Dispatcher::new();
        let result = dispatcher.dispatch(Intent::Emergency).await;
        assert!(matches!(result, Err(Error::Handler(_))));
    }

    #[tokio::test]
    async fn defaults_cover_every_intent() {
        let dispatcher = Dispatcher::with_defaults(Arc::new(ActivityJournal::new()));
        for intent in Intent::ALL {
            assert!(dispatcher.handles(intent), "{intent}");
        }
    }

    #[tokio::test]
    async fn clock_supplies_time_variable() {
        let dispatcher = Dispatcher::with_defaults(Arc::new(ActivityJournal::new()));
        let outcome = dispatcher.dispatch(Intent::TellTime).await.unwrap();
        let time = outcome.variables.get("time").unwrap();
        assert!(time.ends_with("AM") || time.ends_with("PM"), "{time}");
    }

    #[test]
    fn spoken_time_is_twelve_hour() {
        let afternoon = Local.with_ymd_and_hms(2024, 5, 1, 15, 5, 0).unwrap();
        assert_eq!(Clock::spoken(&afternoon), "3:05 PM");

        let morning = Local.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
        assert_eq!(Clock::spoken(&morning), "9:30 AM");
    }

    #[tokio::test]
    async fn journal_records_and_reports_last_dose() {
        let journal = Arc::new(ActivityJournal::new());
        let dispatcher = Dispatcher::with_defaults(journal.clone());

        let before = dispatcher.dispatch(Intent::MedicationStatus).await.unwrap();
        assert_eq!(
            before.variables.get("last_dose").map(String::as_str),
            Some("not recorded yet today")
        );

        dispatcher.dispatch(Intent::MedicationTaken).await.unwrap();
        dispatcher.dispatch(Intent::PetWalkDone).await.unwrap();

        let after = dispatcher.dispatch(Intent::MedicationStatus).await.unwrap();
        assert!(after.variables["last_dose"].starts_with("at "));

        let recorded: Vec<Intent> = journal.entries().iter().map(|e| e.intent).collect();
        assert_eq!(recorded, vec![Intent::MedicationTaken, Intent::PetWalkDone]);
    }

    #[test]
    fn journal_prunes_entries_older_than_a_day() {
        let journal = ActivityJournal::new();
        let morning = Local.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();

        journal.record(Intent::MedicationTaken, morning).unwrap();
        journal
            .record(Intent::PetFeedDone, morning + TimeDelta::hours(12))
            .unwrap();
        journal
            .record(Intent::PetWalkDone, morning + TimeDelta::hours(25))
            .unwrap();

        let kept: Vec<Intent> = journal.entries().iter().map(|e| e.intent).collect();
        assert_eq!(kept, vec![Intent::PetFeedDone, Intent::PetWalkDone]);
        assert!(journal.last(Intent::MedicationTaken).is_none());
    }

    #[test]
    fn journal_is_capped() {
        let journal = ActivityJournal::new();
        let start = Local.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();

        for i in 0..JOURNAL_CAPACITY + 10 {
            let at = start + TimeDelta::seconds(i64::try_from(i).unwrap());
            journal.record(Intent::Acknowledgment, at).unwrap();
        }

        let entries = journal.entries();
        assert_eq!(entries.len(), JOURNAL_CAPACITY);
        assert_eq!(entries[0].at, start + TimeDelta::seconds(10));
    }
}
