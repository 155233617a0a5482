//! # Pet Resgate Storage Adapters
//!
//! Three interchangeable realizations of the domain's
//! [`PersistencePort`](resgate_domain::storage::PersistencePort):
//!
//! - [`MemoryStore`]: process-memory, instance-owned monotonic id counters;
//!   everything is lost on exit. The default for development and tests.
//! - [`SqliteStore`]: a SQLite database with one flat table per collection
//!   and a real foreign key from pets to tutors.
//! - [`DocumentStore`]: a schema-flexible collection of JSON documents with
//!   store-generated opaque string ids and regex-based search.
//!
//! The registry cannot tell them apart: the contract suite in
//! `tests/port_contract.rs` runs the same cases against all three.

mod document;
mod memory;
mod sqlite;

pub use document::DocumentStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
