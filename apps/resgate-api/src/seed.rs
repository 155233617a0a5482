//! Demo seed data
//!
//! Loads a handful of tutors and lost-pet reports at startup so the API is
//! browsable out of the box. Disabled with `RESGATE_SEED=false`. Seeding is
//! idempotent across restarts: on a persistent backend the first duplicate
//! email short-circuits the whole run.

use anyhow::Result;
use tracing::info;

use resgate_domain::identity::{IdentityError, TutorDraft};
use resgate_domain::registry::PetDraft;
use resgate_domain::storage::PersistencePort;

use crate::AppState;

pub async fn populate<S>(state: &AppState<S>) -> Result<()>
where
    S: PersistencePort + Clone,
{
    info!("Populating seed data");

    let ana = match state
        .identity
        .register_tutor(tutor("Ana Silva", "ana@example.com", "senha123"))
        .await
    {
        Ok(tutor) => tutor,
        Err(IdentityError::EmailTaken(_)) => {
            info!("Seed data already present, skipping");
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };
    let bruno = state
        .identity
        .register_tutor(tutor("Bruno Costa", "bruno@example.com", "senha456"))
        .await?;
    state
        .identity
        .register_tutor(tutor("Carlos Lima", "carlos@example.com", "senha789"))
        .await?;

    state
        .registry
        .register_lost_pet(
            PetDraft {
                name: "Bolinha".to_string(),
                species: "Cachorro".to_string(),
                breed: Some("Poodle".to_string()),
                sex: Some("Macho".to_string()),
                approximate_age: Some("3 anos".to_string()),
                color: Some("Branco".to_string()),
                last_seen_location: "Parque Central, São Paulo".to_string(),
                last_seen_date: "10/07/2024".to_string(),
                owner_comment: Some("Muito dócil, fugiu durante passeio.".to_string()),
                photo_ref: None,
            },
            ana.id(),
        )
        .await?;

    let mia = state
        .registry
        .register_lost_pet(
            PetDraft {
                name: "Mia".to_string(),
                species: "Gato".to_string(),
                breed: Some("Siamês".to_string()),
                sex: Some("Fêmea".to_string()),
                approximate_age: Some("1 ano".to_string()),
                color: Some("Creme com pontas escuras".to_string()),
                last_seen_location: "Rua das Flores, 123, Rio de Janeiro".to_string(),
                last_seen_date: "12/07/2024".to_string(),
                owner_comment: Some("Assustada, pode estar escondida.".to_string()),
                photo_ref: None,
            },
            ana.id(),
        )
        .await?;

    state
        .registry
        .register_lost_pet(
            PetDraft {
                name: "Rex".to_string(),
                species: "Cachorro".to_string(),
                breed: Some("Pastor Alemão".to_string()),
                sex: Some("Macho".to_string()),
                approximate_age: Some("5 anos".to_string()),
                color: Some("Preto e Marrom".to_string()),
                last_seen_location: "Rua das Palmeiras, Belo Horizonte".to_string(),
                last_seen_date: "05/07/2024".to_string(),
                owner_comment: Some("Usa coleira vermelha.".to_string()),
                photo_ref: None,
            },
            bruno.id(),
        )
        .await?;

    // One reunion so the history and stats have something to show
    state.registry.mark_found(mia.id()).await?;

    info!("Seed data loaded");
    Ok(())
}

fn tutor(name: &str, email: &str, credential: &str) -> TutorDraft {
    TutorDraft {
        name: name.to_string(),
        email: email.to_string(),
        credential: credential.to_string(),
    }
}
