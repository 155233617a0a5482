//! Domain errors for identity operations

use thiserror::Error;

use crate::mapper::MapError;
use crate::storage::{EntityId, StoreError};

/// Errors that can occur during identity operations
#[derive(Error, Debug)]
pub enum IdentityError {
    /// A required field was absent or blank
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Another tutor already registered with this email
    #[error("the email '{0}' is already registered")]
    EmailTaken(String),

    /// Email/credential pair did not match any tutor
    #[error("invalid email or credential")]
    InvalidCredentials,

    /// No tutor with this id
    #[error("no tutor found with id {0}")]
    NotFound(EntityId),

    /// Stored identity state the service never writes
    #[error("identity records are inconsistent: {0}")]
    Integrity(String),

    /// The storage backend failed
    #[error("identity storage failed: {0}")]
    Backend(StoreError),
}

impl From<StoreError> for IdentityError {
    fn from(err: StoreError) -> Self {
        Self::Backend(err)
    }
}

impl From<MapError> for IdentityError {
    fn from(err: MapError) -> Self {
        Self::Integrity(err.to_string())
    }
}

/// Result type alias for identity operations
pub type Result<T> = std::result::Result<T, IdentityError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_taken_names_the_email() {
        let err = IdentityError::EmailTaken("ana@example.com".to_string());
        assert_eq!(
            err.to_string(),
            "the email 'ana@example.com' is already registered"
        );
    }

    #[test]
    fn test_store_conflicts_convert() {
        let err: IdentityError = StoreError::conflict("tutors", "email").into();
        assert!(matches!(err, IdentityError::Backend(_)));
    }
}
