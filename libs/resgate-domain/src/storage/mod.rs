//! Storage abstraction for the registry
//!
//! This module defines the Persistence Port: the storage-agnostic contract
//! every backend (ephemeral, relational, document) must satisfy identically,
//! together with the backend-neutral record shapes the port trades in.

mod error;
mod ids;
mod ports;
mod record;

pub use error::{StoreError, StoreResult};
pub use ids::EntityId;
pub use ports::PersistencePort;
pub use record::{
    collections, CasOutcome, CollectionSpec, FieldMap, FieldMatch, RecordFilter, RecordPatch,
    StoredRecord,
};
