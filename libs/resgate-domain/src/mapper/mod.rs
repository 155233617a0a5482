//! Entity Mapper
//!
//! Pure, side-effect-free translation between domain values and the
//! backend-neutral stored form. This is the only place that knows how a
//! `Pet` or `Tutor` is laid out in storage: canonical field names, the
//! `LOST`/`FOUND` status strings, RFC 3339 timestamps. Ids arrive already
//! normalized to [`EntityId`](crate::storage::EntityId) by the backends, so
//! mapping is identical no matter where a record came from.

pub mod pet;
pub mod tutor;

use thiserror::Error;

use crate::storage::EntityId;

/// A stored record could not be turned back into a domain value
///
/// Mapping failures mean the stored data disagrees with what the registry
/// ever writes; callers surface them as integrity failures, not user errors.
#[derive(Error, Debug)]
pub enum MapError {
    /// A required field is absent
    #[error("stored record {id} is missing field '{field}'")]
    MissingField { id: EntityId, field: &'static str },

    /// A field is present but unreadable
    #[error("stored record {id} has a malformed '{field}' field: {reason}")]
    MalformedField {
        id: EntityId,
        field: &'static str,
        reason: String,
    },

    /// The record as a whole violates a domain invariant
    #[error("stored record {id} is inconsistent: {reason}")]
    Inconsistent { id: EntityId, reason: String },
}
