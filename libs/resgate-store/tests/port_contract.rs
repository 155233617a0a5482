//! Persistence Port contract suite
//!
//! The whole point of the port is that the registry cannot tell the three
//! backends apart, so every case here runs verbatim against MemoryStore,
//! SqliteStore and DocumentStore. Ids, filter semantics, partial updates,
//! the compare-and-set and uniqueness enforcement must all agree.

use chrono::Utc;
use resgate_domain::identity::TutorDraft;
use resgate_domain::mapper::{pet as pet_mapper, tutor as tutor_mapper};
use resgate_domain::registry::{PetDraft, PetStatus};
use resgate_domain::storage::{
    collections, CasOutcome, EntityId, PersistencePort, RecordFilter, RecordPatch, StoreError,
};
use resgate_store::{DocumentStore, MemoryStore, SqliteStore};

mod cases {
    use super::*;

    async fn seed_tutor(store: &impl PersistencePort, email: &str) -> EntityId {
        let draft = TutorDraft {
            name: "Ana Silva".to_string(),
            email: email.to_string(),
            credential: "senha123".to_string(),
        };
        store
            .create(&collections::TUTORS, tutor_mapper::new_tutor_record(&draft))
            .await
            .unwrap()
            .id
    }

    async fn seed_pet(
        store: &impl PersistencePort,
        owner: &EntityId,
        name: &str,
        location: &str,
    ) -> EntityId {
        let draft = PetDraft {
            name: name.to_string(),
            species: "Cachorro".to_string(),
            last_seen_location: location.to_string(),
            last_seen_date: "10/07/2024".to_string(),
            ..PetDraft::default()
        };
        store
            .create(
                &collections::PETS,
                pet_mapper::new_pet_record(&draft, owner, Utc::now()),
            )
            .await
            .unwrap()
            .id
    }

    pub async fn create_assigns_unique_ids_and_returns_the_stored_form(
        store: impl PersistencePort,
    ) {
        let owner = seed_tutor(&store, "ana@example.com").await;
        let luna = seed_pet(&store, &owner, "Luna", "Centro").await;
        let rex = seed_pet(&store, &owner, "Rex", "Centro").await;
        assert_ne!(luna, rex);

        let fetched = store
            .find_by_id(&collections::PETS, &luna)
            .await
            .unwrap()
            .expect("created record must resolve");
        assert_eq!(fetched.id, luna);
        assert_eq!(fetched.str_field("name"), Some("Luna"));
        assert_eq!(fetched.str_field("status"), Some("LOST"));
    }

    pub async fn absent_ids_resolve_to_none(store: impl PersistencePort) {
        let missing = EntityId::new("407370");
        let found = store.find_by_id(&collections::PETS, &missing).await.unwrap();
        assert!(found.is_none());

        let patch = RecordPatch::new().set("owner_comment", "ninguém");
        let updated = store
            .update_by_id(&collections::PETS, &missing, patch)
            .await
            .unwrap();
        assert!(updated.is_none());
    }

    pub async fn containment_filters_fold_case(store: impl PersistencePort) {
        let owner = seed_tutor(&store, "ana@example.com").await;
        for name in ["Luna", "Lunático", "Rex"] {
            seed_pet(&store, &owner, name, "Centro").await;
        }

        for needle in ["lun", "LUN"] {
            let filter = RecordFilter::new().contains("name", needle);
            let matched = store.find(&collections::PETS, &filter).await.unwrap();
            let names: Vec<_> = matched
                .iter()
                .map(|record| record.str_field("name").unwrap().to_string())
                .collect();
            assert_eq!(names, vec!["Luna", "Lunático"], "needle {needle:?}");
        }
    }

    pub async fn filter_clauses_are_anded(store: impl PersistencePort) {
        let owner = seed_tutor(&store, "ana@example.com").await;
        seed_pet(&store, &owner, "Oliver", "Praia de Boa Viagem, Recife").await;
        seed_pet(&store, &owner, "Simba", "Avenida Boa Viagem, Recife").await;
        seed_pet(&store, &owner, "Bidu", "Centro").await;

        let filter = RecordFilter::new()
            .equals("status", PetStatus::Lost.as_str())
            .contains("last_seen_location", "boa viagem");
        assert_eq!(store.find(&collections::PETS, &filter).await.unwrap().len(), 2);

        let filter = filter.contains("name", "simba");
        let matched = store.find(&collections::PETS, &filter).await.unwrap();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].str_field("name"), Some("Simba"));
    }

    pub async fn find_preserves_insertion_order(store: impl PersistencePort) {
        let owner = seed_tutor(&store, "ana@example.com").await;
        for name in ["Primeiro", "Segundo", "Terceiro"] {
            seed_pet(&store, &owner, name, "Centro").await;
        }

        let all = store
            .find(&collections::PETS, &RecordFilter::new())
            .await
            .unwrap();
        let names: Vec<_> = all
            .iter()
            .map(|record| record.str_field("name").unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["Primeiro", "Segundo", "Terceiro"]);
    }

    pub async fn updates_are_partial(store: impl PersistencePort) {
        let owner = seed_tutor(&store, "ana@example.com").await;
        let pet = seed_pet(&store, &owner, "Luna", "Centro").await;

        let patch = RecordPatch::new().set("owner_comment", "vista perto da praça");
        let updated = store
            .update_by_id(&collections::PETS, &pet, patch)
            .await
            .unwrap()
            .expect("record exists");

        assert_eq!(updated.str_field("owner_comment"), Some("vista perto da praça"));
        assert_eq!(updated.str_field("name"), Some("Luna"));
        assert_eq!(updated.str_field("status"), Some("LOST"));
    }

    pub async fn compare_and_set_applies_exactly_once(store: impl PersistencePort) {
        let owner = seed_tutor(&store, "ana@example.com").await;
        let pet = seed_pet(&store, &owner, "Fred", "Centro").await;

        let guard = RecordFilter::new().equals("status", PetStatus::Lost.as_str());
        let patch = pet_mapper::found_patch(Utc::now());

        let first = store
            .update_if_matches(&collections::PETS, &pet, &guard, patch.clone())
            .await
            .unwrap();
        let CasOutcome::Updated(record) = first else {
            panic!("first transition must apply, got {first:?}");
        };
        assert_eq!(record.str_field("status"), Some("FOUND"));

        let second = store
            .update_if_matches(&collections::PETS, &pet, &guard, patch)
            .await
            .unwrap();
        let CasOutcome::GuardFailed(current) = second else {
            panic!("second transition must fail the guard, got {second:?}");
        };
        assert_eq!(current.str_field("status"), Some("FOUND"));

        let missing = store
            .update_if_matches(
                &collections::PETS,
                &EntityId::new("407370"),
                &guard,
                pet_mapper::found_patch(Utc::now()),
            )
            .await
            .unwrap();
        assert_eq!(missing, CasOutcome::Missing);
    }

    pub async fn counts_agree_with_find(store: impl PersistencePort) {
        let owner = seed_tutor(&store, "ana@example.com").await;
        for name in ["Luna", "Rex", "Mia"] {
            seed_pet(&store, &owner, name, "Centro").await;
        }
        let mia = store
            .find(&collections::PETS, &RecordFilter::new().contains("name", "mia"))
            .await
            .unwrap();
        store
            .update_if_matches(
                &collections::PETS,
                &mia[0].id,
                &RecordFilter::new().equals("status", PetStatus::Lost.as_str()),
                pet_mapper::found_patch(Utc::now()),
            )
            .await
            .unwrap();

        assert_eq!(store.count(&collections::PETS, None).await.unwrap(), 3);
        let lost = RecordFilter::new().equals("status", PetStatus::Lost.as_str());
        assert_eq!(
            store.count(&collections::PETS, Some(&lost)).await.unwrap(),
            2
        );
    }

    pub async fn duplicate_unique_fields_conflict(store: impl PersistencePort) {
        seed_tutor(&store, "ana@example.com").await;

        let draft = TutorDraft {
            name: "Outra Ana".to_string(),
            email: "ana@example.com".to_string(),
            credential: "outra".to_string(),
        };
        let err = store
            .create(&collections::TUTORS, tutor_mapper::new_tutor_record(&draft))
            .await
            .unwrap_err();
        assert!(
            matches!(err, StoreError::Conflict { ref field, .. } if field.as_str() == "email"),
            "expected an email conflict, got {err:?}"
        );
    }
}

macro_rules! contract_tests {
    ($backend:ident, $make:expr) => {
        mod $backend {
            use super::*;

            #[tokio::test]
            async fn create_assigns_unique_ids_and_returns_the_stored_form() {
                cases::create_assigns_unique_ids_and_returns_the_stored_form($make).await;
            }

            #[tokio::test]
            async fn absent_ids_resolve_to_none() {
                cases::absent_ids_resolve_to_none($make).await;
            }

            #[tokio::test]
            async fn containment_filters_fold_case() {
                cases::containment_filters_fold_case($make).await;
            }

            #[tokio::test]
            async fn filter_clauses_are_anded() {
                cases::filter_clauses_are_anded($make).await;
            }

            #[tokio::test]
            async fn find_preserves_insertion_order() {
                cases::find_preserves_insertion_order($make).await;
            }

            #[tokio::test]
            async fn updates_are_partial() {
                cases::updates_are_partial($make).await;
            }

            #[tokio::test]
            async fn compare_and_set_applies_exactly_once() {
                cases::compare_and_set_applies_exactly_once($make).await;
            }

            #[tokio::test]
            async fn counts_agree_with_find() {
                cases::counts_agree_with_find($make).await;
            }

            #[tokio::test]
            async fn duplicate_unique_fields_conflict() {
                cases::duplicate_unique_fields_conflict($make).await;
            }
        }
    };
}

contract_tests!(memory, MemoryStore::new());
contract_tests!(sqlite, SqliteStore::open_in_memory().unwrap());
contract_tests!(document, DocumentStore::new());
