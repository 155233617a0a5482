//! API routes

pub mod auth;
pub mod pets;

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use resgate_domain::storage::PersistencePort;

use crate::{
    dto::auth::{AuthResponse, LoginRequest, RegisterTutorRequest, TutorResponse},
    dto::pets::{
        MarkFoundResponse, PetResponse, RegisterPetRequest, StatsResponse,
    },
    dto::ErrorResponse,
    handlers, AppState,
};

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::pets::register_pet,
        handlers::pets::list_pets,
        handlers::pets::search_pets,
        handlers::pets::get_pet,
        handlers::pets::mark_found,
        handlers::pets::reunion_history,
        handlers::pets::stats,
        handlers::auth::register_tutor,
        handlers::auth::login,
        handlers::auth::get_tutor,
        health_handler
    ),
    components(
        schemas(
            RegisterPetRequest,
            PetResponse,
            MarkFoundResponse,
            StatsResponse,
            RegisterTutorRequest,
            LoginRequest,
            TutorResponse,
            AuthResponse,
            ErrorResponse
        )
    ),
    tags(
        (name = "pets", description = "Lost-pet reports, search, reunions and statistics"),
        (name = "auth", description = "Tutor accounts"),
        (name = "health", description = "Health check endpoints")
    ),
    info(
        title = "Pet Resgate API",
        version = "0.1.0",
        description = "Lost-pet registry: report lost animals, browse and search open cases, record reunions",
        contact(
            name = "Pet Resgate Team"
        )
    )
)]
pub struct ApiDoc;

/// Create the main application router
pub fn create_router<S>(state: AppState<S>) -> Router
where
    S: PersistencePort + Clone + 'static,
{
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(pets::routes::<S>())
        .merge(auth::routes::<S>())
        .route("/health", axum::routing::get(health_handler))
        .with_state(state)
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = String)
    ),
    tag = "health"
)]
async fn health_handler() -> &'static str {
    "OK"
}
