//! Domain entities for the pet registry
//!
//! A Pet is a record describing a lost (and possibly later found) animal.
//! Once registered it is mutated exactly once, by the Lost→Found
//! transition; nothing in the core ever deletes one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::storage::EntityId;

/// Sentinel stored when a pet has no photo reference
pub const PHOTO_REF_NONE: &str = "none";

/// Lifecycle state of a pet record
///
/// The transition is one-way: `Lost` → `Found`, and `Found` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PetStatus {
    Lost,
    Found,
}

impl PetStatus {
    /// The canonical wire/storage spelling
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lost => "LOST",
            Self::Found => "FOUND",
        }
    }

    /// Parse the canonical spelling, `None` for anything else
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "LOST" => Some(Self::Lost),
            "FOUND" => Some(Self::Found),
            _ => None,
        }
    }
}

impl fmt::Display for PetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-supplied fields for a new lost-pet report
///
/// `name`, `species`, `last_seen_location` and `last_seen_date` are
/// required (the registry rejects blanks); the rest are optional
/// descriptive details.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PetDraft {
    pub name: String,
    pub species: String,
    pub breed: Option<String>,
    pub sex: Option<String>,
    pub approximate_age: Option<String>,
    pub color: Option<String>,
    pub last_seen_location: String,
    /// Locale-formatted date string, e.g. "10/07/2024"
    pub last_seen_date: String,
    pub owner_comment: Option<String>,
    pub photo_ref: Option<String>,
}

/// A lost-pet record
///
/// Invariants, upheld by the registry and checked by the mapper on read:
/// - `owner_id` referenced an existing tutor at creation time
/// - `status == Lost` exactly when `reunited_at` is `None`
/// - `registered_at <= reunited_at` whenever the latter is set
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pet {
    pub(crate) id: EntityId,
    pub(crate) name: String,
    pub(crate) species: String,
    pub(crate) breed: String,
    pub(crate) sex: String,
    pub(crate) approximate_age: String,
    pub(crate) color: String,
    pub(crate) last_seen_location: String,
    pub(crate) last_seen_date: String,
    pub(crate) owner_comment: String,
    pub(crate) photo_ref: String,
    pub(crate) owner_id: EntityId,
    pub(crate) status: PetStatus,
    pub(crate) registered_at: DateTime<Utc>,
    pub(crate) reunited_at: Option<DateTime<Utc>>,
}

impl Pet {
    /// Backend-assigned identifier, immutable after creation
    pub fn id(&self) -> &EntityId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn species(&self) -> &str {
        &self.species
    }

    pub fn breed(&self) -> &str {
        &self.breed
    }

    pub fn sex(&self) -> &str {
        &self.sex
    }

    pub fn approximate_age(&self) -> &str {
        &self.approximate_age
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn last_seen_location(&self) -> &str {
        &self.last_seen_location
    }

    pub fn last_seen_date(&self) -> &str {
        &self.last_seen_date
    }

    pub fn owner_comment(&self) -> &str {
        &self.owner_comment
    }

    pub fn photo_ref(&self) -> &str {
        &self.photo_ref
    }

    /// Id of the tutor who reported this pet
    pub fn owner_id(&self) -> &EntityId {
        &self.owner_id
    }

    pub fn status(&self) -> PetStatus {
        self.status
    }

    /// When the report was created
    pub fn registered_at(&self) -> &DateTime<Utc> {
        &self.registered_at
    }

    /// When the pet was reunited with its tutor, if it has been
    pub fn reunited_at(&self) -> Option<&DateTime<Utc>> {
        self.reunited_at.as_ref()
    }

    pub fn is_lost(&self) -> bool {
        self.status == PetStatus::Lost
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_spelling_round_trips() {
        assert_eq!(PetStatus::parse("LOST"), Some(PetStatus::Lost));
        assert_eq!(PetStatus::parse("FOUND"), Some(PetStatus::Found));
        assert_eq!(PetStatus::parse("lost"), None);
        assert_eq!(PetStatus::Found.to_string(), "FOUND");
    }

    #[test]
    fn test_status_serializes_as_canonical_string() {
        assert_eq!(
            serde_json::to_value(PetStatus::Lost).unwrap(),
            serde_json::json!("LOST")
        );
    }
}
