//! Tutor account handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, info};

use resgate_domain::identity::IdentityError;
use resgate_domain::storage::{EntityId, PersistencePort};

use crate::{
    dto::auth::{AuthResponse, LoginRequest, RegisterTutorRequest, TutorResponse},
    dto::ErrorResponse,
    AppState,
};

/// Register a tutor account
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterTutorRequest,
    responses(
        (status = 201, description = "Tutor registered successfully", body = AuthResponse),
        (status = 400, description = "Missing field", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn register_tutor<S>(
    State(state): State<AppState<S>>,
    Json(body): Json<RegisterTutorRequest>,
) -> Response
where
    S: PersistencePort + Clone + 'static,
{
    match state.identity.register_tutor(body.into_draft()).await {
        Ok(tutor) => {
            info!(tutor = %tutor.id(), "tutor registered");
            let response = AuthResponse {
                message: "Tutor registered successfully".to_string(),
                tutor: TutorResponse::from(tutor),
            };
            (StatusCode::CREATED, Json(response)).into_response()
        }
        Err(err) => error_response(err),
    }
}

/// Check an email/credential pair
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Credentials accepted", body = AuthResponse),
        (status = 401, description = "Invalid email or credential", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login<S>(State(state): State<AppState<S>>, Json(body): Json<LoginRequest>) -> Response
where
    S: PersistencePort + Clone + 'static,
{
    let email = body.email.unwrap_or_default();
    let credential = body.credential.unwrap_or_default();

    match state.identity.authenticate(&email, &credential).await {
        Ok(tutor) => {
            let response = AuthResponse {
                message: "Login successful".to_string(),
                tutor: TutorResponse::from(tutor),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => error_response(err),
    }
}

/// Fetch a tutor account
#[utoipa::path(
    get,
    path = "/auth/user/{id}",
    params(("id" = String, Path, description = "Tutor id")),
    responses(
        (status = 200, description = "The tutor", body = TutorResponse),
        (status = 404, description = "No tutor with this id", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn get_tutor<S>(State(state): State<AppState<S>>, Path(id): Path<String>) -> Response
where
    S: PersistencePort + Clone + 'static,
{
    match state.identity.get_tutor_by_id(&EntityId::new(id)).await {
        Ok(tutor) => (StatusCode::OK, Json(TutorResponse::from(tutor))).into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: IdentityError) -> Response {
    let status = match &err {
        IdentityError::MissingField(_) => StatusCode::BAD_REQUEST,
        IdentityError::EmailTaken(_) => StatusCode::CONFLICT,
        IdentityError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        IdentityError::NotFound(_) => StatusCode::NOT_FOUND,
        IdentityError::Integrity(_) | IdentityError::Backend(_) => {
            error!(error = %err, "identity operation failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(ErrorResponse::new(err.to_string()))).into_response()
}
