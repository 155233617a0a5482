//! Domain entities for tutor accounts

use serde::{Deserialize, Serialize};

use crate::storage::EntityId;

/// Caller-supplied fields for a new tutor account
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TutorDraft {
    pub name: String,
    /// Unique across all tutors
    pub email: String,
    /// Opaque credential, stored verbatim (hashing is a non-goal)
    pub credential: String,
}

/// A tutor account
///
/// Tutors and pets reference each other by id only: a tutor holds the ids
/// of the pets it reported, a pet holds its owner's id. Neither ever embeds
/// the other.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tutor {
    pub(crate) id: EntityId,
    pub(crate) name: String,
    pub(crate) email: String,
    #[serde(skip_serializing)]
    pub(crate) credential: String,
    pub(crate) registered_pet_ids: Vec<EntityId>,
}

impl Tutor {
    /// Backend-assigned identifier
    pub fn id(&self) -> &EntityId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Ids of the pets this tutor reported, in reporting order
    pub fn registered_pet_ids(&self) -> &[EntityId] {
        &self.registered_pet_ids
    }
}
