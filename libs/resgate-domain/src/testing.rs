//! Hand-rolled doubles for exercising the services without an adapter crate
//!
//! Test-only: a minimal in-memory Persistence Port and a scriptable tutor
//! directory. The real backends live in the storage adapter crate and get
//! their own contract suite.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::identity::Tutor;
use crate::registry::{DirectoryError, TutorDirectory};
use crate::storage::{
    CasOutcome, CollectionSpec, EntityId, FieldMap, PersistencePort, RecordFilter, RecordPatch,
    StoreError, StoreResult, StoredRecord,
};

#[derive(Default)]
struct TestCollection {
    next_id: u64,
    rows: Vec<StoredRecord>,
}

/// In-memory Persistence Port double
#[derive(Clone, Default)]
pub(crate) struct TestStore {
    inner: Arc<Mutex<HashMap<&'static str, TestCollection>>>,
}

impl TestStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<&'static str, TestCollection>> {
        self.inner.lock().unwrap()
    }
}

impl PersistencePort for TestStore {
    fn create(
        &self,
        collection: &'static CollectionSpec,
        record: FieldMap,
    ) -> impl Future<Output = StoreResult<StoredRecord>> + Send {
        let result = {
            let mut inner = self.lock();
            let entries = inner.entry(collection.name).or_default();
            let conflict = collection.unique_fields.iter().find(|field| {
                record.get(**field).is_some_and(|value| {
                    entries
                        .rows
                        .iter()
                        .any(|row| row.fields.get(**field) == Some(value))
                })
            });
            match conflict {
                Some(field) => Err(StoreError::conflict(collection.name, *field)),
                None => {
                    entries.next_id += 1;
                    let stored = StoredRecord {
                        id: EntityId::from(entries.next_id as i64),
                        fields: record,
                    };
                    entries.rows.push(stored.clone());
                    Ok(stored)
                }
            }
        };
        async move { result }
    }

    fn find_by_id(
        &self,
        collection: &'static CollectionSpec,
        id: &EntityId,
    ) -> impl Future<Output = StoreResult<Option<StoredRecord>>> + Send {
        let result = Ok(self
            .lock()
            .get(collection.name)
            .and_then(|entries| entries.rows.iter().find(|row| &row.id == id).cloned()));
        async move { result }
    }

    fn find(
        &self,
        collection: &'static CollectionSpec,
        filter: &RecordFilter,
    ) -> impl Future<Output = StoreResult<Vec<StoredRecord>>> + Send {
        let result = Ok(self
            .lock()
            .get(collection.name)
            .map(|entries| {
                entries
                    .rows
                    .iter()
                    .filter(|row| filter.matches(&row.fields))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default());
        async move { result }
    }

    fn update_by_id(
        &self,
        collection: &'static CollectionSpec,
        id: &EntityId,
        patch: RecordPatch,
    ) -> impl Future<Output = StoreResult<Option<StoredRecord>>> + Send {
        let result = {
            let mut inner = self.lock();
            let row = inner
                .get_mut(collection.name)
                .and_then(|entries| entries.rows.iter_mut().find(|row| &row.id == id));
            Ok(row.map(|row| {
                row.fields.extend(patch.into_fields());
                row.clone()
            }))
        };
        async move { result }
    }

    fn update_if_matches(
        &self,
        collection: &'static CollectionSpec,
        id: &EntityId,
        guard: &RecordFilter,
        patch: RecordPatch,
    ) -> impl Future<Output = StoreResult<CasOutcome>> + Send {
        let result = {
            let mut inner = self.lock();
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
        };
        async move { result }
    }

    fn count(
        &self,
        collection: &'static CollectionSpec,
        filter: Option<&RecordFilter>,
    ) -> impl Future<Output = StoreResult<u64>> + Send {
        let result = Ok(self
            .lock()
            .get(collection.name)
            .map(|entries| {
                entries
                    .rows
                    .iter()
                    .filter(|row| filter.map_or(true, |f| f.matches(&row.fields)))
                    .count() as u64
            })
            .unwrap_or(0));
        async move { result }
    }
}

/// Scriptable TutorDirectory double
#[derive(Clone, Default)]
pub(crate) struct StubDirectory {
    tutors: Arc<Mutex<Vec<Tutor>>>,
    appended: Arc<Mutex<Vec<EntityId>>>,
    fail_appends: Arc<AtomicBool>,
}

impl StubDirectory {
    /// A directory knowing a single tutor with the given id
    pub(crate) fn with_tutor(id: &str) -> Self {
        let directory = Self::default();
        directory.tutors.lock().unwrap().push(Tutor {
            id: EntityId::new(id),
            name: "Ana Silva".to_string(),
            email: format!("tutor{id}@example.com"),
            credential: "senha123".to_string(),
            registered_pet_ids: Vec::new(),
        });
        directory
    }

    /// Make every subsequent append fail
    pub(crate) fn fail_appends(&self) {
        self.fail_appends.store(true, Ordering::SeqCst);
    }

    /// Pet ids appended so far, in order
    pub(crate) fn appended(&self) -> Vec<EntityId> {
        self.appended.lock().unwrap().clone()
    }
}

impl TutorDirectory for StubDirectory {
    fn resolve_tutor(
        &self,
        id: &EntityId,
    ) -> impl Future<Output = Result<Option<Tutor>, DirectoryError>> + Send {
        let result = Ok(self
            .tutors
            .lock()
            .unwrap()
            .iter()
            .find(|tutor| tutor.id() == id)
            .cloned());
        async move { result }
    }

    fn append_registered_pet(
        &self,
        tutor_id: &EntityId,
        pet_id: &EntityId,
    ) -> impl Future<Output = Result<(), DirectoryError>> + Send {
        let result = if self.fail_appends.load(Ordering::SeqCst) {
            Err(DirectoryError::Unavailable(
                "directory write rejected".to_string(),
            ))
        } else if self
            .tutors
            .lock()
            .unwrap()
            .iter()
            .any(|tutor| tutor.id() == tutor_id)
        {
            self.appended.lock().unwrap().push(pet_id.clone());
            Ok(())
        } else {
            Err(DirectoryError::UnknownTutor(tutor_id.clone()))
        };
        async move { result }
    }
}
