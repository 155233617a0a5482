//! DTOs for pet endpoints

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use resgate_domain::registry::{Pet, PetDraft, RegistryStats};

/// Request body for reporting a lost pet
///
/// Required fields are validated by the registry (so a blank and a missing
/// field produce the same 400); everything else is optional detail.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPetRequest {
    #[schema(example = "Bolinha")]
    pub name: Option<String>,
    #[schema(example = "Cachorro")]
    pub species: Option<String>,
    #[schema(example = "Poodle")]
    pub breed: Option<String>,
    #[schema(example = "Macho")]
    pub sex: Option<String>,
    #[schema(example = "3 anos")]
    pub age: Option<String>,
    #[schema(example = "Branco")]
    pub color: Option<String>,
    #[schema(example = "Parque Central, São Paulo")]
    pub last_seen_location: Option<String>,
    #[schema(example = "10/07/2024")]
    pub last_seen_date: Option<String>,
    #[schema(example = "Muito dócil, fugiu durante passeio.")]
    pub owner_comment: Option<String>,
    pub photo_ref: Option<String>,
    #[schema(example = "1")]
    pub owner_id: Option<String>,
}

impl RegisterPetRequest {
    /// Split into the domain draft and the owner id
    pub fn into_draft(self) -> (PetDraft, Option<String>) {
        let draft = PetDraft {
            name: self.name.unwrap_or_default(),
            species: self.species.unwrap_or_default(),
            breed: self.breed,
            sex: self.sex,
            approximate_age: self.age,
            color: self.color,
            last_seen_location: self.last_seen_location.unwrap_or_default(),
            last_seen_date: self.last_seen_date.unwrap_or_default(),
            owner_comment: self.owner_comment,
            photo_ref: self.photo_ref,
        };
        (draft, self.owner_id)
    }
}

/// A pet record as served to clients
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PetResponse {
    #[schema(example = "1")]
    pub id: String,
    #[schema(example = "Bolinha")]
    pub name: String,
    #[schema(example = "Cachorro")]
    pub species: String,
    pub breed: String,
    pub sex: String,
    pub approximate_age: String,
    pub color: String,
    #[schema(example = "Parque Central, São Paulo")]
    pub last_seen_location: String,
    #[schema(example = "10/07/2024")]
    pub last_seen_date: String,
    pub owner_comment: String,
    #[schema(example = "none")]
    pub photo_ref: String,
    #[schema(example = "1")]
    pub owner_id: String,
    #[schema(example = "LOST")]
    pub status: String,
    pub registered_at: DateTime<Utc>,
    pub reunited_at: Option<DateTime<Utc>>,
}

impl From<Pet> for PetResponse {
    fn from(pet: Pet) -> Self {
        Self {
            id: pet.id().to_string(),
            name: pet.name().to_string(),
            species: pet.species().to_string(),
            breed: pet.breed().to_string(),
            sex: pet.sex().to_string(),
            approximate_age: pet.approximate_age().to_string(),
            color: pet.color().to_string(),
            last_seen_location: pet.last_seen_location().to_string(),
            last_seen_date: pet.last_seen_date().to_string(),
            owner_comment: pet.owner_comment().to_string(),
            photo_ref: pet.photo_ref().to_string(),
            owner_id: pet.owner_id().to_string(),
            status: pet.status().to_string(),
            registered_at: *pet.registered_at(),
            reunited_at: pet.reunited_at().copied(),
        }
    }
}

/// Response body for a recorded reunion
#[derive(Debug, Serialize, ToSchema)]
pub struct MarkFoundResponse {
    /// Confirmation message
    #[schema(example = "Pet \"Fred\" marked as FOUND.")]
    pub message: String,
    /// The updated pet record
    pub pet: PetResponse,
}

/// Aggregate registry counts
#[derive(Debug, Serialize, ToSchema)]
pub struct StatsResponse {
    #[schema(example = 3)]
    pub total: u64,
    #[schema(example = 2)]
    pub lost: u64,
    #[schema(example = 1)]
    pub found: u64,
}

impl From<RegistryStats> for StatsResponse {
    fn from(stats: RegistryStats) -> Self {
        Self {
            total: stats.total,
            lost: stats.lost,
            found: stats.found,
        }
    }
}

/// Query parameters for the pet listing
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListPetsQuery {
    /// LOST or FOUND; absent returns every pet
    pub status: Option<String>,
}

/// Query parameters for the pet search
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchPetsQuery {
    /// Substring of the pet's name, case-insensitive
    pub nome: Option<String>,
    /// Substring of the last-seen location, case-insensitive
    pub localidade: Option<String>,
    /// LOST or FOUND; defaults to LOST
    pub status: Option<String>,
}
