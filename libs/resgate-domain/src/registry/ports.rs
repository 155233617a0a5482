//! Tutor directory port
//!
//! The registry never owns tutor accounts; the Identity side does. This
//! trait is the registry's entire view of it: resolve a tutor, and append a
//! newly reported pet to the tutor's back-reference list. Credential
//! handling stays on the other side of the boundary.

use std::future::Future;

use thiserror::Error;

use crate::identity::Tutor;
use crate::storage::EntityId;

/// Errors the directory can signal to the registry
#[derive(Error, Debug)]
pub enum DirectoryError {
    /// No tutor with this id
    #[error("no tutor exists with id {0}")]
    UnknownTutor(EntityId),

    /// The directory's backing store failed
    #[error("tutor directory unavailable: {0}")]
    Unavailable(String),
}

/// Port for the Identity collaborator
pub trait TutorDirectory: Send + Sync {
    /// Resolve a tutor by id, `None` if absent
    fn resolve_tutor(
        &self,
        id: &EntityId,
    ) -> impl Future<Output = Result<Option<Tutor>, DirectoryError>> + Send;

    /// Append a pet id to the tutor's ordered `registered_pet_ids` list
    ///
    /// # Errors
    ///
    /// - [`DirectoryError::UnknownTutor`] if the tutor does not exist
    /// - [`DirectoryError::Unavailable`] if the backing store fails
    fn append_registered_pet(
        &self,
        tutor_id: &EntityId,
        pet_id: &EntityId,
    ) -> impl Future<Output = Result<(), DirectoryError>> + Send;
}
