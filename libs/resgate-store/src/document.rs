//! Document Store - schema-flexible realization of the persistence port
//!
//! Collections of JSON documents with store-generated opaque string ids
//! (UUIDv7 hex, so insertion order and id order agree). Nested structures
//! are stored natively; nothing enforces a schema or a foreign key, which
//! is why referential checks live in the registry. Substring filters
//! compile to case-insensitive regexes, the document-store equivalent of
//! the original `$regex` search.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use regex::{Regex, RegexBuilder};
use resgate_domain::storage::{
    CasOutcome, CollectionSpec, EntityId, FieldMap, FieldMatch, PersistencePort, RecordFilter,
    RecordPatch, StoreError, StoreResult, StoredRecord,
};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

type Collections = HashMap<&'static str, Vec<StoredRecord>>;

/// A compiled filter: equality stays structural, containment becomes a regex
enum DocMatcher {
    Equals(String, Value),
    Matches(String, Regex),
}

impl DocMatcher {
    fn matches(&self, fields: &FieldMap) -> bool {
        match self {
            Self::Equals(field, expected) => fields.get(field) == Some(expected),
            Self::Matches(field, regex) => fields
                .get(field)
                .and_then(Value::as_str)
                .is_some_and(|hay| regex.is_match(hay)),
        }
    }
}

fn compile_filter(filter: &RecordFilter) -> StoreResult<Vec<DocMatcher>> {
    filter
        .clauses()
        .iter()
        .map(|(field, matcher)| match matcher {
            FieldMatch::Equals(value) => Ok(DocMatcher::Equals(field.clone(), value.clone())),
            FieldMatch::Contains(needle) => RegexBuilder::new(&regex::escape(needle))
                .case_insensitive(true)
                .build()
                .map(|regex| DocMatcher::Matches(field.clone(), regex))
                .map_err(|err| StoreError::unavailable(err.to_string())),
        })
        .collect()
}

fn matches_all(matchers: &[DocMatcher], fields: &FieldMap) -> bool {
    matchers.iter().all(|matcher| matcher.matches(fields))
}

/// Document-collection implementation of the persistence port
///
/// All mutations happen under a single mutex; documents keep insertion
/// order in their collection vector.
#[derive(Clone, Default)]
pub struct DocumentStore {
    inner: Arc<Mutex<Collections>>,
}

impl DocumentStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Collections>> {
        self.inner
            .lock()
            .map_err(|_| StoreError::unavailable("document store mutex poisoned"))
    }

    fn generate_id() -> EntityId {
        EntityId::new(Uuid::now_v7().simple().to_string())
    }
}

impl PersistencePort for DocumentStore {
    fn create(
        &self,
        collection: &'static CollectionSpec,
        record: FieldMap,
    ) -> impl Future<Output = StoreResult<StoredRecord>> + Send {
        let result = (|| {
            let mut inner = self.lock()?;
            let documents = inner.entry(collection.name).or_default();

            // No schema and no constraints in a document collection;
            // uniqueness is validated here, in application code.
            for field in collection.unique_fields {
                let taken = record.get(*field).is_some_and(|value| {
                    documents
                        .iter()
                        .any(|doc| doc.fields.get(*field) == Some(value))
                });
                if taken {
                    return Err(StoreError::conflict(collection.name, *field));
                }
            }

            let stored = StoredRecord {
                id: Self::generate_id(),
                fields: record,
            };
            documents.push(stored.clone());
            debug!(collection = collection.name, id = %stored.id, "stored document");
            Ok(stored)
        })();
        async move { result }
    }

    fn find_by_id(
        &self,
        collection: &'static CollectionSpec,
        id: &EntityId,
    ) -> impl Future<Output = StoreResult<Option<StoredRecord>>> + Send {
        let result = self.lock().map(|inner| {
            inner
                .get(collection.name)
                .and_then(|documents| documents.iter().find(|doc| &doc.id == id).cloned())
        });
        async move { result }
    }

    fn find(
        &self,
        collection: &'static CollectionSpec,
        filter: &RecordFilter,
    ) -> impl Future<Output = StoreResult<Vec<StoredRecord>>> + Send {
        let result = (|| {
            let matchers = compile_filter(filter)?;
            let inner = self.lock()?;
            Ok(inner
                .get(collection.name)
                .map(|documents| {
                    documents
                        .iter()
                        .filter(|doc| matches_all(&matchers, &doc.fields))
                        .cloned()
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default())
        })();
        async move { result }
    }

    fn update_by_id(
        &self,
        collection: &'static CollectionSpec,
        id: &EntityId,
        patch: RecordPatch,
    ) -> impl Future<Output = StoreResult<Option<StoredRecord>>> + Send {
        let result = (|| {
            let mut inner = self.lock()?;
            let doc = inner
                .get_mut(collection.name)
                .and_then(|documents| documents.iter_mut().find(|doc| &doc.id == id));
            Ok(doc.map(|doc| {
                doc.fields.extend(patch.into_fields());
                doc.clone()
            }))
        })();
        async move { result }
    }

    fn update_if_matches(
        &self,
        collection: &'static CollectionSpec,
        id: &EntityId,
        guard: &RecordFilter,
        patch: RecordPatch,
    ) -> impl Future<Output = StoreResult<CasOutcome>> + Send {
        let result = (|| {
            let matchers = compile_filter(guard)?;
            let mut inner = self.lock()?;
            let doc = inner
                .get_mut(collection.name)
                .and_then(|documents| documents.iter_mut().find(|doc| &doc.id == id));
            Ok(match doc {
                None => CasOutcome::Missing,
                Some(doc) if !matches_all(&matchers, &doc.fields) => {
                    CasOutcome::GuardFailed(doc.clone())
                }
                Some(doc) => {
                    doc.fields.extend(patch.into_fields());
                    CasOutcome::Updated(doc.clone())
                }
            })
        })();
        async move { result }
    }

    fn count(
        &self,
        collection: &'static CollectionSpec,
        filter: Option<&RecordFilter>,
    ) -> impl Future<Output = StoreResult<u64>> + Send {
        let result = (|| {
            let matchers = match filter {
                Some(filter) => compile_filter(filter)?,
                None => Vec::new(),
            };
            let inner = self.lock()?;
            Ok(inner
                .get(collection.name)
                .map(|documents| {
                    documents
                        .iter()
                        .filter(|doc| matches_all(&matchers, &doc.fields))
                        .count() as u64
                })
                .unwrap_or(0))
        })();
        async move { result }
    }
}
