//! Storage-level errors
//!
//! These are the failures a Persistence Port realization may signal. They
//! are backend-independent: no SQLite error codes or driver types leak
//! through here.

use thiserror::Error;

/// Errors signalled by a Persistence Port realization
///
/// Absence of a record is NOT an error: `find_by_id` and `update_by_id`
/// return `None` for unknown ids, and the domain layer decides what that
/// means.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A create violated a unique-field declaration
    #[error("a {collection} record with this {field} already exists")]
    Conflict {
        collection: String,
        field: String,
    },

    /// The backend has no schema for this collection
    #[error("unknown collection: {0}")]
    UnknownCollection(String),

    /// The record cannot be represented in the backend's native form
    #[error("malformed {collection} record: {reason}")]
    MalformedRecord {
        collection: String,
        reason: String,
    },

    /// The storage backend failed
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Create a uniqueness conflict error
    pub fn conflict(collection: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Conflict {
            collection: collection.into(),
            field: field.into(),
        }
    }

    /// Create a malformed-record error
    pub fn malformed(collection: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            collection: collection.into(),
            reason: reason.into(),
        }
    }

    /// Create a backend-failure error
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}

/// Result type alias for storage operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_names_the_field() {
        let err = StoreError::conflict("tutors", "email");
        assert!(matches!(err, StoreError::Conflict { .. }));
        assert_eq!(
            err.to_string(),
            "a tutors record with this email already exists"
        );
    }

    #[test]
    fn test_unavailable_error() {
        let err = StoreError::unavailable("disk on fire");
        assert!(err.to_string().contains("disk on fire"));
    }
}
