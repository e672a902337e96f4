//! Persona roster
//!
//! A persona is a selectable companion voice. It only flavors the spoken
//! lines; it never changes how commands are matched.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A selectable companion personality
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Persona {
    /// Unique identifier (e.g. "ward_cleaver")
    pub id: String,

    /// Short name
    pub name: String,

    /// Name shown in persona pickers
    pub display_name: String,

    /// Presented gender
    pub gender: Gender,

    /// One-line description of the character
    pub description: String,

    /// Era the character is drawn from
    pub era: String,

    /// Personality traits
    #[serde(default)]
    pub personality: Vec<String>,

    /// Roster grouping
    pub category: PersonaCategory,
}

/// Presented gender of a persona
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Gender {
    Male,
    Female,
    NonBinary,
}

/// Roster grouping used when presenting personas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonaCategory {
    Classic,
    Lgbtq,
    Authority,
    Nurturing,
}

impl PersonaCategory {
    /// Every category, in presentation order
    pub const ALL: [Self; 4] = [Self::Classic, Self::Lgbtq, Self::Authority, Self::Nurturing];
}

/// The personas available for selection
#[derive(Debug, Clone, Default)]
pub struct PersonaRoster {
    personas: Vec<Persona>,
}

impl PersonaRoster {
    /// Build a roster, rejecting duplicate or blank ids
    ///
    /// # Errors
    ///
    /// Returns error if an id is blank or appears twice
    pub fn new(personas: Vec<Persona>) -> Result<Self> {
        for (i, persona) in personas.iter().enumerate() {
            if persona.id.trim().is_empty() {
                return Err(Error::Catalog(format!("persona '{}' has a blank id", persona.name)));
            }
            if personas[..i].iter().any(|p| p.id == persona.id) {
                return Err(Error::Catalog(format!("duplicate persona id: {}", persona.id)));
            }
        }

        Ok(Self { personas })
    }

    /// Find a persona by id
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Persona> {
        self.personas.iter().find(|p| p.id == id)
    }

    /// Resolve a requested persona id
    ///
    /// `None` or an empty id selects no persona (neutral lines).
    ///
    /// # Errors
    ///
    /// Returns `PersonaNotFound` if a non-empty id is not in the roster
    pub fn select(&self, id: Option<&str>) -> Result<Option<&Persona>> {
        match id.map(str::trim) {
            None | Some("") => Ok(None),
            Some(id) => self
                .get(id)
                .map(Some)
                .ok_or_else(|| Error::PersonaNotFound(id.to_string())),
        }
    }

    /// Personas in declaration order
    #[must_use]
    pub fn personas(&self) -> &[Persona] {
        &self.personas
    }

    /// Personas in one category
    pub fn by_category(&self, category: PersonaCategory) -> impl Iterator<Item = &Persona> {
        self.personas.iter().filter(move |p| p.category == category)
    }

    /// Number of personas
    #[must_use]
    pub fn len(&self) -> usize {
        self.personas.len()
    }

    /// Check if the roster is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.personas.is_empty()
    }
}
