//! Identity service - Tutor account orchestration
//!
//! Owns everything about tutors: registration (with the unique-email rule),
//! lookup, the credential check, and the pet back-reference list the
//! registry appends to through the [`TutorDirectory`] port.

use std::future::Future;

use crate::mapper::tutor as tutor_mapper;
use crate::mapper::tutor::fields;
use crate::registry::{DirectoryError, TutorDirectory};
use crate::storage::{collections, EntityId, PersistencePort, RecordFilter, StoreError};

use super::entity::{Tutor, TutorDraft};
use super::error::{IdentityError, Result};

/// Service managing tutor accounts
///
/// Generic over any [`PersistencePort`] implementation; tutors live in the
/// same backend as the pets that reference them.
#[derive(Clone)]
pub struct IdentityService<S> {
    store: S,
}

impl<S> IdentityService<S>
where
    S: PersistencePort,
{
    /// Create an identity service over the given store
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Register a new tutor account
    ///
    /// # Errors
    ///
    /// - [`IdentityError::MissingField`] if a required field is blank
    /// - [`IdentityError::EmailTaken`] if the email is already registered
    pub async fn register_tutor(&self, draft: TutorDraft) -> Result<Tutor> {
        require("name", &draft.name)?;
        require("email", &draft.email)?;
        require("credential", &draft.credential)?;

        let record = tutor_mapper::new_tutor_record(&draft);
        let stored = match self.store.create(&collections::TUTORS, record).await {
            Ok(stored) => stored,
            Err(StoreError::Conflict { ref field, .. }) if field.as_str() == fields::EMAIL => {
                return Err(IdentityError::EmailTaken(draft.email));
            }
            Err(err) => return Err(err.into()),
        };

        Ok(tutor_mapper::tutor_from_record(&stored)?)
    }

    /// Check an email/credential pair, returning the matching tutor
    ///
    /// The credential is compared verbatim; secure credential storage is an
    /// explicit non-goal of this system.
    ///
    /// # Errors
    ///
    /// [`IdentityError::InvalidCredentials`] for an unknown email or a
    /// mismatched credential; deliberately the same error for both.
    pub async fn authenticate(&self, email: &str, credential: &str) -> Result<Tutor> {
        let filter = RecordFilter::new().equals(fields::EMAIL, email);
        let records = self.store.find(&collections::TUTORS, &filter).await?;

        let Some(record) = records.first() else {
            return Err(IdentityError::InvalidCredentials);
        };
        let tutor = tutor_mapper::tutor_from_record(record)?;
        if tutor.credential != credential {
            return Err(IdentityError::InvalidCredentials);
        }
        Ok(tutor)
    }

    /// Fetch a tutor account
    ///
    /// # Errors
    ///
    /// [`IdentityError::NotFound`] if no tutor has this id
    pub async fn get_tutor_by_id(&self, id: &EntityId) -> Result<Tutor> {
        match self.find_tutor(id).await? {
            Some(tutor) => Ok(tutor),
            None => Err(IdentityError::NotFound(id.clone())),
        }
    }

    async fn find_tutor(&self, id: &EntityId) -> Result<Option<Tutor>> {
        match self.store.find_by_id(&collections::TUTORS, id).await? {
            Some(record) => Ok(Some(tutor_mapper::tutor_from_record(&record)?)),
            None => Ok(None),
        }
    }
}

impl<S> TutorDirectory for IdentityService<S>
where
    S: PersistencePort,
{
    fn resolve_tutor(
        &self,
        id: &EntityId,
    ) -> impl Future<Output = std::result::Result<Option<Tutor>, DirectoryError>> + Send {
        async move {
            self.find_tutor(id)
                .await
                .map_err(|err| DirectoryError::Unavailable(err.to_string()))
        }
    }

    fn append_registered_pet(
        &self,
        tutor_id: &EntityId,
        pet_id: &EntityId,
    ) -> impl Future<Output = std::result::Result<(), DirectoryError>> + Send {
        async move {
            let tutor = self
                .find_tutor(tutor_id)
                .await
                .map_err(|err| DirectoryError::Unavailable(err.to_string()))?;
            let Some(tutor) = tutor else {
                return Err(DirectoryError::UnknownTutor(tutor_id.clone()));
            };

            let mut pet_ids = tutor.registered_pet_ids;
            pet_ids.push(pet_id.clone());
            let patch = tutor_mapper::registered_pets_patch(&pet_ids);

            let updated = self
                .store
                .update_by_id(&collections::TUTORS, tutor_id, patch)
                .await
                .map_err(|err| DirectoryError::Unavailable(err.to_string()))?;
            match updated {
                Some(_) => Ok(()),
                None => Err(DirectoryError::UnknownTutor(tutor_id.clone())),
            }
        }
    }
}

fn require(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(IdentityError::MissingField(field));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestStore;

    fn service() -> IdentityService<TestStore> {
        IdentityService::new(TestStore::new())
    }

    fn draft(name: &str, email: &str) -> TutorDraft {
        TutorDraft {
            name: name.to_string(),
            email: email.to_string(),
            credential: "senha123".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_and_fetch_tutor() {
        let service = service();
        let tutor = service
            .register_tutor(draft("Ana Silva", "ana@example.com"))
            .await
            .unwrap();

        let fetched = service.get_tutor_by_id(tutor.id()).await.unwrap();
        assert_eq!(fetched.name(), "Ana Silva");
        assert_eq!(fetched.email(), "ana@example.com");
        assert!(fetched.registered_pet_ids().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_a_conflict() {
        let service = service();
        service
            .register_tutor(draft("Ana Silva", "ana@example.com"))
            .await
            .unwrap();

        let err = service
            .register_tutor(draft("Outra Ana", "ana@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::EmailTaken(email) if email == "ana@example.com"));
    }

    #[tokio::test]
    async fn test_blank_fields_are_rejected() {
        let err = service()
            .register_tutor(draft("", "ana@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::MissingField("name")));
    }

    #[tokio::test]
    async fn test_authenticate_checks_the_credential() {
        let service = service();
        service
            .register_tutor(draft("Ana Silva", "ana@example.com"))
            .await
            .unwrap();

        let tutor = service
            .authenticate("ana@example.com", "senha123")
            .await
            .unwrap();
        assert_eq!(tutor.email(), "ana@example.com");

        let err = service
            .authenticate("ana@example.com", "errada")
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::InvalidCredentials));

        let err = service
            .authenticate("ninguem@example.com", "senha123")
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_unknown_tutor_is_not_found() {
        let err = service()
            .get_tutor_by_id(&EntityId::new("404"))
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_directory_appends_preserve_order() {
        let service = service();
        let tutor = service
            .register_tutor(draft("Ana Silva", "ana@example.com"))
            .await
            .unwrap();

        service
            .append_registered_pet(tutor.id(), &EntityId::new("10"))
            .await
            .unwrap();
        service
            .append_registered_pet(tutor.id(), &EntityId::new("11"))
            .await
            .unwrap();

        let fetched = service.get_tutor_by_id(tutor.id()).await.unwrap();
        assert_eq!(
            fetched.registered_pet_ids(),
            &[EntityId::new("10"), EntityId::new("11")][..]
        );
    }

    #[tokio::test]
    async fn test_directory_append_to_unknown_tutor_fails() {
        let err = service()
            .append_registered_pet(&EntityId::new("404"), &EntityId::new("1"))
            .await
            .unwrap_err();
        assert!(matches!(err, DirectoryError::UnknownTutor(_)));
    }

    #[tokio::test]
    async fn test_directory_resolves_registered_tutors() {
        let service = service();
        let tutor = service
            .register_tutor(draft("Ana Silva", "ana@example.com"))
            .await
            .unwrap();

        let resolved = service.resolve_tutor(tutor.id()).await.unwrap();
        assert!(resolved.is_some());

        let resolved = service.resolve_tutor(&EntityId::new("404")).await.unwrap();
        assert!(resolved.is_none());
    }
}
