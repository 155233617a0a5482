//! The Persistence Port
//!
//! Following hexagonal architecture, the domain defines what it needs from
//! storage and the adapter crates provide implementations. Three
//! interchangeable realizations exist (ephemeral, relational, document);
//! the registry must not be able to tell them apart.
//!
//! ## Static Dispatch
//!
//! We use native Rust async traits with `impl Future` return types to keep
//! static dispatch and zero-cost abstractions; no trait objects, no
//! `async_trait` boxing.

use std::future::Future;

use super::error::StoreResult;
use super::ids::EntityId;
use super::record::{CasOutcome, CollectionSpec, FieldMap, RecordFilter, RecordPatch, StoredRecord};

/// Port for record storage
///
/// Implementations must satisfy this contract identically:
///
/// - ids are assigned by the backend and immutable afterwards;
/// - `find` returns records in insertion order (oldest first);
/// - absent records are `None`, never an error dressed up as success;
/// - uniqueness declared on the collection is enforced at `create`;
/// - `update_if_matches` is atomic with respect to concurrent callers:
///   of two racing calls with the same guard, at most one observes
///   [`CasOutcome::Updated`].
pub trait PersistencePort: Send + Sync {
    /// Persist a new record, assigning its id
    ///
    /// Takes the field map by value; the stored form (including the new id)
    /// is returned.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Conflict`] if a `unique_fields` declaration is violated
    /// - [`StoreError::Unavailable`] if the backend fails
    ///
    /// [`StoreError::Conflict`]: super::StoreError::Conflict
    /// [`StoreError::Unavailable`]: super::StoreError::Unavailable
    fn create(
        &self,
        collection: &'static CollectionSpec,
        record: FieldMap,
    ) -> impl Future<Output = StoreResult<StoredRecord>> + Send;

    /// Fetch a record by id, `None` if absent
    fn find_by_id(
        &self,
        collection: &'static CollectionSpec,
        id: &EntityId,
    ) -> impl Future<Output = StoreResult<Option<StoredRecord>>> + Send;

    /// Fetch all records matching the filter, in insertion order
    fn find(
        &self,
        collection: &'static CollectionSpec,
        filter: &RecordFilter,
    ) -> impl Future<Output = StoreResult<Vec<StoredRecord>>> + Send;

    /// Apply a partial update; fields not in the patch are untouched
    ///
    /// Returns the updated record, or `None` if no record has this id.
    fn update_by_id(
        &self,
        collection: &'static CollectionSpec,
        id: &EntityId,
        patch: RecordPatch,
    ) -> impl Future<Output = StoreResult<Option<StoredRecord>>> + Send;

    /// Atomically apply a partial update if the guard filter holds
    ///
    /// The check and the write are one linearizable step per record: when
    /// two callers race on the same id with the same guard, exactly one
    /// observes [`CasOutcome::Updated`] and the other
    /// [`CasOutcome::GuardFailed`].
    fn update_if_matches(
        &self,
        collection: &'static CollectionSpec,
        id: &EntityId,
        guard: &RecordFilter,
        patch: RecordPatch,
    ) -> impl Future<Output = StoreResult<CasOutcome>> + Send;

    /// Count records, optionally restricted by a filter
    fn count(
        &self,
        collection: &'static CollectionSpec,
        filter: Option<&RecordFilter>,
    ) -> impl Future<Output = StoreResult<u64>> + Send;
}
