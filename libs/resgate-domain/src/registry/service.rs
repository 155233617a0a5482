//! Pet registry service - Business logic orchestration
//!
//! The registry coordinates between the domain entities, the Entity Mapper
//! and the Persistence Port, and consults the TutorDirectory port for
//! referential checks. It holds no state of its own: every read goes to the
//! store, so the service behaves identically over any backend.

use chrono::Utc;
use serde::Serialize;

use crate::mapper::pet as pet_mapper;
use crate::mapper::pet::fields;
use crate::storage::{collections, CasOutcome, EntityId, PersistencePort, RecordFilter, StoreError};

use super::entity::{Pet, PetDraft, PetStatus};
use super::error::{RegistryError, Result};
use super::ports::{DirectoryError, TutorDirectory};

/// Optional search filters, ANDed when both are present
#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    /// Case-insensitive substring match against the pet's name
    pub name: Option<String>,
    /// Case-insensitive substring match against the last-seen location
    pub location: Option<String>,
}

/// Aggregate counts over the whole registry
///
/// `total == lost + found` holds by construction: the service counts
/// `found` and `total` and derives `lost`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    pub total: u64,
    pub lost: u64,
    pub found: u64,
}

/// The lost-pet registry
///
/// Generic over any [`PersistencePort`] and [`TutorDirectory`]
/// implementation; the compiler monomorphizes per backend, so the
/// abstraction costs nothing at runtime.
pub struct PetRegistry<S, D> {
    store: S,
    directory: D,
}

impl<S, D> PetRegistry<S, D>
where
    S: PersistencePort,
    D: TutorDirectory,
{
    /// Create a registry over the given store and tutor directory
    pub fn new(store: S, directory: D) -> Self {
        Self { store, directory }
    }

    /// Register a new lost-pet report
    ///
    /// Validates the required fields, verifies the owner exists, persists
    /// the pet as `LOST`, and appends the new id to the owner's
    /// back-reference list.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::MissingField`] if a required field is blank
    /// - [`RegistryError::UnknownOwner`] if the owner does not resolve
    /// - [`RegistryError::Integrity`] if the pet was stored but linking it
    ///   to the owner failed; the operation as a whole counts as failed
    pub async fn register_lost_pet(&self, draft: PetDraft, owner_id: &EntityId) -> Result<Pet> {
        require("name", &draft.name)?;
        require("species", &draft.species)?;
        require("lastSeenLocation", &draft.last_seen_location)?;
        require("lastSeenDate", &draft.last_seen_date)?;

        let owner = self
            .directory
            .resolve_tutor(owner_id)
            .await
            .map_err(directory_failure)?;
        if owner.is_none() {
            return Err(RegistryError::UnknownOwner(owner_id.clone()));
        }

        let record = pet_mapper::new_pet_record(&draft, owner_id, Utc::now());
        let stored = self.store.create(&collections::PETS, record).await?;
        let pet = pet_mapper::pet_from_record(&stored)?;

        // Two-phase write: the owner was verified just above, so a failure
        // here leaves an orphaned pet record. Surface it, never swallow it.
        self.directory
            .append_registered_pet(owner_id, pet.id())
            .await
            .map_err(|err| {
                RegistryError::integrity(format!(
                    "pet {} was stored but linking it to tutor {} failed: {}",
                    pet.id(),
                    owner_id,
                    err
                ))
            })?;

        Ok(pet)
    }

    /// List pets, optionally restricted to one status, oldest first
    pub async fn list_pets(&self, status: Option<PetStatus>) -> Result<Vec<Pet>> {
        let filter = match status {
            Some(status) => RecordFilter::new().equals(fields::STATUS, status.as_str()),
            None => RecordFilter::new(),
        };
        self.find_pets(&filter).await
    }

    /// Search pets of the given status by name and/or location substring
    ///
    /// Both filters are case-insensitive and ANDed; blank filters impose no
    /// constraint.
    pub async fn search_pets(&self, filters: &SearchFilters, status: PetStatus) -> Result<Vec<Pet>> {
        let mut filter = RecordFilter::new().equals(fields::STATUS, status.as_str());
        if let Some(name) = non_blank(filters.name.as_deref()) {
            filter = filter.contains(fields::NAME, name);
        }
        if let Some(location) = non_blank(filters.location.as_deref()) {
            filter = filter.contains(fields::LAST_SEEN_LOCATION, location);
        }
        self.find_pets(&filter).await
    }

    /// Fetch a single pet
    ///
    /// # Errors
    ///
    /// [`RegistryError::NotFound`] if no pet has this id
    pub async fn get_pet_by_id(&self, id: &EntityId) -> Result<Pet> {
        match self.store.find_by_id(&collections::PETS, id).await? {
            Some(record) => Ok(pet_mapper::pet_from_record(&record)?),
            None => Err(RegistryError::NotFound(id.clone())),
        }
    }

    /// Record a reunion: transition the pet from `LOST` to `FOUND`
    ///
    /// The check and the write are one atomic step through the port's
    /// compare-and-set, so two concurrent calls on the same pet cannot both
    /// succeed.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::NotFound`] if no pet has this id
    /// - [`RegistryError::AlreadyResolved`] if the pet is no longer `LOST`
    pub async fn mark_found(&self, id: &EntityId) -> Result<Pet> {
        let guard = RecordFilter::new().equals(fields::STATUS, PetStatus::Lost.as_str());
        let patch = pet_mapper::found_patch(Utc::now());

        match self
            .store
            .update_if_matches(&collections::PETS, id, &guard, patch)
            .await?
        {
            CasOutcome::Updated(record) => Ok(pet_mapper::pet_from_record(&record)?),
            CasOutcome::Missing => Err(RegistryError::NotFound(id.clone())),
            CasOutcome::GuardFailed(record) => Err(RegistryError::AlreadyResolved {
                id: id.clone(),
                name: record.str_field(fields::NAME).unwrap_or_default().to_string(),
            }),
        }
    }

    /// All pets already reunited with their tutors, oldest first
    pub async fn list_reunion_history(&self) -> Result<Vec<Pet>> {
        self.list_pets(Some(PetStatus::Found)).await
    }

    /// Aggregate counts: total, still lost, reunited
    pub async fn compute_stats(&self) -> Result<RegistryStats> {
        let found_filter = RecordFilter::new().equals(fields::STATUS, PetStatus::Found.as_str());
        // Found is counted first: it only ever grows and total never
        // shrinks, so found <= total even when writes land in between.
        let found = self
            .store
            .count(&collections::PETS, Some(&found_filter))
            .await?;
        let total = self.store.count(&collections::PETS, None).await?;

        Ok(RegistryStats {
            total,
            lost: total - found,
            found,
        })
    }

    async fn find_pets(&self, filter: &RecordFilter) -> Result<Vec<Pet>> {
        let records = self.store.find(&collections::PETS, filter).await?;
        records
            .iter()
            .map(|record| pet_mapper::pet_from_record(record).map_err(RegistryError::from))
            .collect()
    }
}

fn require(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(RegistryError::MissingField(field));
    }
    Ok(())
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn directory_failure(err: DirectoryError) -> RegistryError {
    RegistryError::Backend(StoreError::unavailable(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{StubDirectory, TestStore};

    fn registry(directory: StubDirectory) -> PetRegistry<TestStore, StubDirectory> {
        PetRegistry::new(TestStore::new(), directory)
    }

    fn draft(name: &str, location: &str) -> PetDraft {
        PetDraft {
            name: name.to_string(),
            species: "Cachorro".to_string(),
            last_seen_location: location.to_string(),
            last_seen_date: "10/07/2024".to_string(),
            ..PetDraft::default()
        }
    }

    #[tokio::test]
    async fn test_register_persists_a_lost_pet() {
        let directory = StubDirectory::with_tutor("1");
        let registry = registry(directory.clone());

        let pet = registry
            .register_lost_pet(draft("Bolinha", "Parque Central, São Paulo"), &EntityId::new("1"))
            .await
            .unwrap();

        assert_eq!(pet.status(), PetStatus::Lost);
        assert!(pet.reunited_at().is_none());
        assert_eq!(pet.photo_ref(), crate::registry::PHOTO_REF_NONE);
        assert_eq!(directory.appended(), vec![pet.id().clone()]);

        let listed = registry.list_pets(Some(PetStatus::Lost)).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name(), "Bolinha");
    }

    #[tokio::test]
    async fn test_register_rejects_blank_required_fields() {
        let registry = registry(StubDirectory::with_tutor("1"));

        let err = registry
            .register_lost_pet(draft("", "Centro"), &EntityId::new("1"))
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::MissingField("name")));

        let err = registry
            .register_lost_pet(draft("Rex", "   "), &EntityId::new("1"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RegistryError::MissingField("lastSeenLocation")
        ));
    }

    #[tokio::test]
    async fn test_register_with_unknown_owner_creates_nothing() {
        let registry = registry(StubDirectory::default());

        let err = registry
            .register_lost_pet(draft("Rex", "Centro"), &EntityId::new("99"))
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::UnknownOwner(_)));

        let listed = registry.list_pets(None).await.unwrap();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn test_failed_owner_append_surfaces_integrity_error() {
        let directory = StubDirectory::with_tutor("1");
        directory.fail_appends();
        let registry = registry(directory);

        let err = registry
            .register_lost_pet(draft("Rex", "Centro"), &EntityId::new("1"))
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::Integrity(_)));
        assert!(err.to_string().contains("linking it to tutor"));
    }

    #[tokio::test]
    async fn test_mark_found_is_one_way() {
        let registry = registry(StubDirectory::with_tutor("1"));
        let pet = registry
            .register_lost_pet(draft("Fred", "Centro"), &EntityId::new("1"))
            .await
            .unwrap();

        let reunited = registry.mark_found(pet.id()).await.unwrap();
        assert_eq!(reunited.status(), PetStatus::Found);
        assert!(reunited.reunited_at().is_some());
        assert!(reunited.registered_at() <= reunited.reunited_at().unwrap());

        let err = registry.mark_found(pet.id()).await.unwrap_err();
        match err {
            RegistryError::AlreadyResolved { name, .. } => assert_eq!(name, "Fred"),
            other => panic!("expected AlreadyResolved, got {other:?}"),
        }

        let history = registry.list_reunion_history().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].name(), "Fred");
    }

    #[tokio::test]
    async fn test_mark_found_unknown_id() {
        let registry = registry(StubDirectory::default());
        let err = registry.mark_found(&EntityId::new("404")).await.unwrap_err();
        assert!(matches!(err, RegistryError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_search_matches_name_substring_case_insensitively() {
        let registry = registry(StubDirectory::with_tutor("1"));
        for name in ["Luna", "Lunático", "Rex"] {
            registry
                .register_lost_pet(draft(name, "Centro"), &EntityId::new("1"))
                .await
                .unwrap();
        }

        let filters = SearchFilters {
            name: Some("lun".to_string()),
            location: None,
        };
        let matches = registry.search_pets(&filters, PetStatus::Lost).await.unwrap();
        let names: Vec<_> = matches.iter().map(Pet::name).collect();
        assert_eq!(names, vec!["Luna", "Lunático"]);
    }

    #[tokio::test]
    async fn test_search_filters_are_anded_and_scoped_to_status() {
        let registry = registry(StubDirectory::with_tutor("1"));
        registry
            .register_lost_pet(draft("Oliver", "Praia de Boa Viagem, Recife"), &EntityId::new("1"))
            .await
            .unwrap();
        registry
            .register_lost_pet(draft("Simba", "Avenida Boa Viagem, Recife"), &EntityId::new("1"))
            .await
            .unwrap();
        let elsewhere = registry
            .register_lost_pet(draft("Bidu", "Centro"), &EntityId::new("1"))
            .await
            .unwrap();
        registry.mark_found(elsewhere.id()).await.unwrap();

        let filters = SearchFilters {
            name: None,
            location: Some("Boa Viagem".to_string()),
        };
        let matches = registry.search_pets(&filters, PetStatus::Lost).await.unwrap();
        assert_eq!(matches.len(), 2);

        let filters = SearchFilters {
            name: Some("simba".to_string()),
            location: Some("avenida".to_string()),
        };
        let matches = registry.search_pets(&filters, PetStatus::Lost).await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].name(), "Simba");
    }

    #[tokio::test]
    async fn test_stats_identity_holds() {
        let registry = registry(StubDirectory::with_tutor("1"));
        for name in ["Luna", "Rex", "Mia"] {
            registry
                .register_lost_pet(draft(name, "Centro"), &EntityId::new("1"))
                .await
                .unwrap();
        }
        let pets = registry.list_pets(None).await.unwrap();
        registry.mark_found(pets[2].id()).await.unwrap();

        let stats = registry.compute_stats().await.unwrap();
        assert_eq!(
            stats,
            RegistryStats {
                total: 3,
                lost: 2,
                found: 1
            }
        );
        assert_eq!(stats.total, stats.lost + stats.found);
    }
}
