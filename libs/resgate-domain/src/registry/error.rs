//! Domain errors for registry operations
//!
//! Expected conditions (bad input, unknown owner, missing pet, repeated
//! resolution) are ordinary variants the caller is meant to branch on;
//! `Integrity` and `Backend` are the failures an API layer maps to 500.

use thiserror::Error;

use crate::mapper::MapError;
use crate::storage::{EntityId, StoreError};

/// Errors that can occur during registry operations
#[derive(Error, Debug)]
pub enum RegistryError {
    /// A required field was absent or blank (named as the caller sent it)
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// The owner id does not resolve to a registered tutor
    #[error("no tutor exists with id {0}")]
    UnknownOwner(EntityId),

    /// No pet with this id
    #[error("no pet found with id {0}")]
    NotFound(EntityId),

    /// The pet was already marked found; the transition is one-way
    #[error("pet \"{name}\" ({id}) has already been marked as found")]
    AlreadyResolved { id: EntityId, name: String },

    /// A multi-step operation partially succeeded and left state to clean up
    #[error("registry state is inconsistent: {0}")]
    Integrity(String),

    /// The storage backend failed
    #[error("pet storage failed: {0}")]
    Backend(#[from] StoreError),
}

impl RegistryError {
    /// Create an integrity error with a message
    pub fn integrity(msg: impl Into<String>) -> Self {
        Self::Integrity(msg.into())
    }
}

impl From<MapError> for RegistryError {
    fn from(err: MapError) -> Self {
        // A record we cannot map back is stored state the registry never
        // writes; that is an integrity breach, not a user error.
        Self::Integrity(err.to_string())
    }
}

/// Result type alias for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;
