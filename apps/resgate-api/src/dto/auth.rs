//! DTOs for identity endpoints

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use resgate_domain::identity::{Tutor, TutorDraft};

/// Request body for registering a tutor account
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterTutorRequest {
    #[schema(example = "Ana Silva")]
    pub name: Option<String>,
    #[schema(example = "ana@example.com")]
    pub email: Option<String>,
    #[schema(example = "senha123")]
    pub credential: Option<String>,
}

impl RegisterTutorRequest {
    pub fn into_draft(self) -> TutorDraft {
        TutorDraft {
            name: self.name.unwrap_or_default(),
            email: self.email.unwrap_or_default(),
            credential: self.credential.unwrap_or_default(),
        }
    }
}

/// Request body for the credential check
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[schema(example = "ana@example.com")]
    pub email: Option<String>,
    #[schema(example = "senha123")]
    pub credential: Option<String>,
}

/// A tutor account as served to clients; the credential never leaves the
/// identity module
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TutorResponse {
    #[schema(example = "1")]
    pub id: String,
    #[schema(example = "Ana Silva")]
    pub name: String,
    #[schema(example = "ana@example.com")]
    pub email: String,
    /// Ids of the pets this tutor reported, in reporting order
    pub registered_pet_ids: Vec<String>,
}

impl From<Tutor> for TutorResponse {
    fn from(tutor: Tutor) -> Self {
        Self {
            id: tutor.id().to_string(),
            name: tutor.name().to_string(),
            email: tutor.email().to_string(),
            registered_pet_ids: tutor
                .registered_pet_ids()
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

/// Response body for successful registration or login
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    /// Confirmation message
    #[schema(example = "Tutor registered successfully")]
    pub message: String,
    /// The tutor account
    pub tutor: TutorResponse,
}
