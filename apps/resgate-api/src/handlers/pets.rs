//! Pet registry handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, info};

use resgate_domain::registry::{PetStatus, RegistryError, SearchFilters};
use resgate_domain::storage::{EntityId, PersistencePort};

use crate::{
    dto::pets::{
        ListPetsQuery, MarkFoundResponse, PetResponse, RegisterPetRequest, SearchPetsQuery,
        StatsResponse,
    },
    dto::ErrorResponse,
    AppState,
};

/// Report a lost pet
#[utoipa::path(
    post,
    path = "/pets",
    request_body = RegisterPetRequest,
    responses(
        (status = 201, description = "Pet registered successfully", body = PetResponse),
        (status = 400, description = "Missing field or unknown owner", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "pets"
)]
pub async fn register_pet<S>(
    State(state): State<AppState<S>>,
    Json(body): Json<RegisterPetRequest>,
) -> Response
where
    S: PersistencePort + Clone + 'static,
{
    let (draft, owner_id) = body.into_draft();
    let Some(owner_id) = owner_id.filter(|id| !id.trim().is_empty()) else {
        return bad_request("missing required field: ownerId");
    };

    info!(pet = %draft.name, owner = %owner_id, "received lost-pet report");

    match state
        .registry
        .register_lost_pet(draft, &EntityId::new(owner_id))
        .await
    {
        Ok(pet) => (StatusCode::CREATED, Json(PetResponse::from(pet))).into_response(),
        Err(err) => error_response(err),
    }
}

/// List pets, optionally by status
#[utoipa::path(
    get,
    path = "/pets",
    params(ListPetsQuery),
    responses(
        (status = 200, description = "Pets in insertion order", body = [PetResponse]),
        (status = 400, description = "Invalid status value", body = ErrorResponse)
    ),
    tag = "pets"
)]
pub async fn list_pets<S>(
    State(state): State<AppState<S>>,
    Query(query): Query<ListPetsQuery>,
) -> Response
where
    S: PersistencePort + Clone + 'static,
{
    let status = match parse_status(query.status.as_deref()) {
        Ok(status) => status,
        Err(response) => return response,
    };

    match state.registry.list_pets(status).await {
        Ok(pets) => pet_list(pets),
        Err(err) => error_response(err),
    }
}

/// Search open cases by name and/or location substring
#[utoipa::path(
    get,
    path = "/pets/search",
    params(SearchPetsQuery),
    responses(
        (status = 200, description = "Matching pets", body = [PetResponse]),
        (status = 400, description = "Invalid status value", body = ErrorResponse)
    ),
    tag = "pets"
)]
pub async fn search_pets<S>(
    State(state): State<AppState<S>>,
    Query(query): Query<SearchPetsQuery>,
) -> Response
where
    S: PersistencePort + Clone + 'static,
{
    let status = match parse_status(query.status.as_deref()) {
        Ok(status) => status.unwrap_or(PetStatus::Lost),
        Err(response) => return response,
    };
    let filters = SearchFilters {
        name: query.nome,
        location: query.localidade,
    };

    match state.registry.search_pets(&filters, status).await {
        Ok(pets) => pet_list(pets),
        Err(err) => error_response(err),
    }
}

/// Fetch a single pet
#[utoipa::path(
    get,
    path = "/pets/{id}",
    params(("id" = String, Path, description = "Pet id")),
    responses(
        (status = 200, description = "The pet", body = PetResponse),
        (status = 404, description = "No pet with this id", body = ErrorResponse)
    ),
    tag = "pets"
)]
pub async fn get_pet<S>(State(state): State<AppState<S>>, Path(id): Path<String>) -> Response
where
    S: PersistencePort + Clone + 'static,
{
    match state.registry.get_pet_by_id(&EntityId::new(id)).await {
        Ok(pet) => (StatusCode::OK, Json(PetResponse::from(pet))).into_response(),
        Err(err) => error_response(err),
    }
}

/// Record a reunion
#[utoipa::path(
    put,
    path = "/pets/{id}/encontrado",
    params(("id" = String, Path, description = "Pet id")),
    responses(
        (status = 200, description = "Reunion recorded", body = MarkFoundResponse),
        (status = 400, description = "No such pet, or already resolved", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "pets"
)]
pub async fn mark_found<S>(State(state): State<AppState<S>>, Path(id): Path<String>) -> Response
where
    S: PersistencePort + Clone + 'static,
{
    match state.registry.mark_found(&EntityId::new(id)).await {
        Ok(pet) => {
            info!(pet = %pet.name(), id = %pet.id(), "reunion recorded");
            let response = MarkFoundResponse {
                message: format!("Pet \"{}\" marked as FOUND.", pet.name()),
                pet: PetResponse::from(pet),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        // This endpoint reports a missing pet as a 400, same as a repeated
        // resolution; GET /pets/{id} is the one that 404s.
        Err(err @ RegistryError::NotFound(_)) => bad_request(err.to_string()),
        Err(err) => error_response(err),
    }
}

/// Reunion history: every pet already marked found, oldest first
#[utoipa::path(
    get,
    path = "/pets/historico/reencontros",
    responses(
        (status = 200, description = "Reunited pets in insertion order", body = [PetResponse])
    ),
    tag = "pets"
)]
pub async fn reunion_history<S>(State(state): State<AppState<S>>) -> Response
where
    S: PersistencePort + Clone + 'static,
{
    match state.registry.list_reunion_history().await {
        Ok(pets) => pet_list(pets),
        Err(err) => error_response(err),
    }
}

/// Aggregate statistics
#[utoipa::path(
    get,
    path = "/stats",
    responses(
        (status = 200, description = "Registry counts", body = StatsResponse)
    ),
    tag = "pets"
)]
pub async fn stats<S>(State(state): State<AppState<S>>) -> Response
where
    S: PersistencePort + Clone + 'static,
{
    match state.registry.compute_stats().await {
        Ok(stats) => (StatusCode::OK, Json(StatsResponse::from(stats))).into_response(),
        Err(err) => error_response(err),
    }
}

fn pet_list(pets: Vec<resgate_domain::registry::Pet>) -> Response {
    let pets: Vec<PetResponse> = pets.into_iter().map(PetResponse::from).collect();
    (StatusCode::OK, Json(pets)).into_response()
}

fn parse_status(raw: Option<&str>) -> Result<Option<PetStatus>, Response> {
    match raw {
        None => Ok(None),
        Some(raw) => match PetStatus::parse(raw) {
            Some(status) => Ok(Some(status)),
            None => Err(bad_request(format!(
                "invalid status '{raw}' (expected LOST or FOUND)"
            ))),
        },
    }
}

fn bad_request(message: impl Into<String>) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(message))).into_response()
}

fn error_response(err: RegistryError) -> Response {
    let status = match &err {
        RegistryError::MissingField(_)
        | RegistryError::UnknownOwner(_)
        | RegistryError::AlreadyResolved { .. } => StatusCode::BAD_REQUEST,
        RegistryError::NotFound(_) => StatusCode::NOT_FOUND,
        RegistryError::Integrity(_) | RegistryError::Backend(_) => {
            error!(error = %err, "registry operation failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(ErrorResponse::new(err.to_string()))).into_response()
}
