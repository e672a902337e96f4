//! Command rule catalog
//!
//! Maps reference trigger phrases to intents. The catalog is built once and
//! never mutated; malformed catalogs are rejected at construction.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::intent::Intent;
use crate::{Error, Result};

/// A set of trigger phrases for one intent
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CommandRule {
    /// Reference phrases, evaluated in order
    pub patterns: Vec<String>,

    /// Intent selected when a pattern clears the threshold
    pub action: Intent,

    /// Minimum similarity score in `[0, 1]`
    pub confidence: f64,
}

impl CommandRule {
    /// Build a rule from string literals
    #[must_use]
    pub fn new(patterns: &[&str], action: Intent, confidence: f64) -> Self {
        Self {
            patterns: patterns.iter().map(ToString::to_string).collect(),
            action,
            confidence,
        }
    }
}

/// On-disk catalog file schema
#[derive(Debug, Deserialize)]
struct CatalogFile {
    rules: Vec<CommandRule>,
}

/// Immutable, validated rule catalog
#[derive(Debug, Clone)]
pub struct CommandCatalog {
    rules: Vec<CommandRule>,
}

impl CommandCatalog {
    /// Validate and normalize a rule list
    ///
    /// Patterns are trimmed and lower-cased. Rule order is preserved, since it
    /// decides ties.
    ///
    /// # Errors
    ///
    /// Returns error if the list is empty, a rule has no patterns, a pattern
    /// is blank, or a confidence lies outside `[0, 1]`
    pub fn new(rules: Vec<CommandRule>) -> Result<Self> {
        if rules.is_empty() {
            return Err(Error::Catalog("command catalog has no rules".to_string()));
        }

        let mut normalized = Vec::with_capacity(rules.len());
        for rule in rules {
            if rule.patterns.is_empty() {
                return Err(Error::Catalog(format!(
                    "rule for {} has no patterns",
                    rule.action
                )));
            }

            if !rule.confidence.is_finite() || !(0.0..=1.0).contains(&rule.confidence) {
                return Err(Error::Catalog(format!(
                    "rule for {} has confidence {} outside [0, 1]",
                    rule.action, rule.confidence
                )));
            }

            let mut patterns = Vec::with_capacity(rule.patterns.len());
            for pattern in rule.patterns {
                let pattern = pattern.trim().to_lowercase();
                if pattern.is_empty() {
                    return Err(Error::Catalog(format!(
                        "rule for {} has a blank pattern",
                        rule.action
                    )));
                }
                patterns.push(pattern);
            }

            normalized.push(CommandRule {
                patterns,
                action: rule.action,
                confidence: rule.confidence,
            });
        }

        tracing::debug!(rules = normalized.len(), "command catalog built");

        Ok(Self { rules: normalized })
    }

    /// Parse a catalog from TOML (`[[rules]]` tables)
    ///
    /// # Errors
    ///
    /// Returns error if the TOML is malformed or the catalog is invalid
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(content)?;
        Self::new(file.rules)
    }

    /// Load a catalog from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or is invalid
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let catalog = Self::from_toml_str(&content)
            .map_err(|e| Error::Catalog(format!("{}: {e}", path.display())))?;
        tracing::info!(path = %path.display(), rules = catalog.len(), "loaded command catalog");
        Ok(catalog)
    }

    /// The built-in catalog of medication, pet care, emergency and
    /// acknowledgment commands
    #[must_use]
    pub fn reference() -> Self {
        let rules = vec![
            CommandRule::new(
                &[
                    "i took it",
                    "took it",
                    "i took my medicine",
                    "i took my medication",
                    "done",
                    "finished",
                ],
                Intent::MedicationTaken,
                0.6,
            ),
            CommandRule::new(
                &["skip", "skip this", "dont need it", "not now", "i dont need it"],
                Intent::MedicationSkip,
                0.7,
            ),
            CommandRule::new(
                &["snooze", "remind me later", "in a few minutes", "wait"],
                Intent::MedicationSnooze,
                0.7,
            ),
            CommandRule::new(
                &["what time", "what time is it", "time"],
                Intent::TellTime,
                0.8,
            ),
            CommandRule::new(
                &["whats next", "what is next", "schedule", "agenda"],
                Intent::ShowSchedule,
                0.7,
            ),
            CommandRule::new(
                &[
                    "did i take",
                    "have i taken",
                    "medication status",
                    "medicine status",
                ],
                Intent::MedicationStatus,
                0.7,
            ),
            CommandRule::new(
                &["walked the dog", "i walked", "dog walked", "walk done"],
                Intent::PetWalkDone,
                0.7,
            ),
            CommandRule::new(
                &["fed the dog", "dog fed", "feeding done", "i fed"],
                Intent::PetFeedDone,
                0.7,
            ),
            CommandRule::new(
                &["time to walk", "walk time", "dog walk", "walk the dog"],
                Intent::PetWalkReminder,
                0.7,
            ),
            CommandRule::new(
                &[
                    "help",
                    "emergency",
                    "i need help",
                    "call family",
                    "im hurt",
                    "i fell",
                ],
                Intent::Emergency,
                0.9,
            ),
            CommandRule::new(
                &["call doctor", "need doctor", "medical help", "call 911"],
                Intent::MedicalEmergency,
                0.9,
            ),
            CommandRule::new(
                &["thank you", "thanks", "good job"],
                Intent::Acknowledgment,
                0.8,
            ),
        ];

        Self { rules }
    }

    /// Rules in evaluation order
    #[must_use]
    pub fn rules(&self) -> &[CommandRule] {
        &self.rules
    }

    /// Number of rules
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Always false for a constructed catalog
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for CommandCatalog {
    fn default() -> Self {
        Self::reference()
    }
}
