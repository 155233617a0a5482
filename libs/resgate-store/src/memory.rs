//! Ephemeral Store - process-memory realization of the persistence port
//!
//! Records live in per-collection vectors behind one mutex; ids come from a
//! monotonically increasing counter owned by the store instance (never a
//! process-wide static, so separate stores in tests never share sequences).
//! Everything is valid only for the process lifetime.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use resgate_domain::storage::{
    CasOutcome, CollectionSpec, EntityId, FieldMap, PersistencePort, RecordFilter, RecordPatch,
    StoreError, StoreResult, StoredRecord,
};
use tracing::debug;

#[derive(Default)]
struct Collection {
    next_id: u64,
    rows: Vec<StoredRecord>,
}

type Collections = HashMap<&'static str, Collection>;

/// In-memory implementation of the persistence port
///
/// All mutations happen under a single mutex, which makes the id-counter
/// increment and the compare-and-set linearizable without further ceremony.
/// Substring filters use the domain's reference matching
/// ([`RecordFilter::matches`]): Unicode-lowercase containment.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Collections>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Collections>> {
        self.inner
            .lock()
            .map_err(|_| StoreError::unavailable("memory store mutex poisoned"))
    }
}

impl PersistencePort for MemoryStore {
    fn create(
        &self,
        collection: &'static CollectionSpec,
        record: FieldMap,
    ) -> impl Future<Output = StoreResult<StoredRecord>> + Send {
        let result = (|| {
            let mut inner = self.lock()?;
            let entries = inner.entry(collection.name).or_default();

            for field in collection.unique_fields {
                let taken = record.get(*field).is_some_and(|value| {
                    entries
                        .rows
                        .iter()
                        .any(|row| row.fields.get(*field) == Some(value))
                });
                if taken {
                    return Err(StoreError::conflict(collection.name, *field));
                }
            }

            entries.next_id += 1;
            let stored = StoredRecord {
                id: EntityId::new(entries.next_id.to_string()),
                fields: record,
            };
            entries.rows.push(stored.clone());
            debug!(collection = collection.name, id = %stored.id, "created record");
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
                .and_then(|entries| entries.rows.iter().find(|row| &row.id == id).cloned())
        });
        async move { result }
    }

    fn find(
        &self,
        collection: &'static CollectionSpec,
        filter: &RecordFilter,
    ) -> impl Future<Output = StoreResult<Vec<StoredRecord>>> + Send {
        let result = self.lock().map(|inner| {
            inner
                .get(collection.name)
                .map(|entries| {
                    entries
                        .rows
                        .iter()
                        .filter(|row| filter.matches(&row.fields))
                        .cloned()
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default()
        });
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
            let row = inner
                .get_mut(collection.name)
                .and_then(|entries| entries.rows.iter_mut().find(|row| &row.id == id));
            Ok(row.map(|row| {
                row.fields.extend(patch.into_fields());
                row.clone()
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
        // Guard check and write happen under the same lock acquisition:
        // the outcome is decided atomically per record.
        let result = (|| {
            let mut inner = self.lock()?;
            let row = inner
                .get_mut(collection.name)
                .and_then(|entries| entries.rows.iter_mut().find(|row| &row.id == id));
            Ok(match row {
                None => CasOutcome::Missing,
                Some(row) if !guard.matches(&row.fields) => CasOutcome::GuardFailed(row.clone()),
                Some(row) => {
                    row.fields.extend(patch.into_fields());
                    CasOutcome::Updated(row.clone())
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
        let result = self.lock().map(|inner| {
            inner
                .get(collection.name)
                .map(|entries| {
                    entries
                        .rows
                        .iter()
                        .filter(|row| filter.map_or(true, |f| f.matches(&row.fields)))
                        .count() as u64
                })
                .unwrap_or(0)
        });
        async move { result }
    }
}
