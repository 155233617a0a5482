//! Pet registry routes

use axum::{
    routing::{get, post, put},
    Router,
};

use resgate_domain::storage::PersistencePort;

use crate::{handlers::pets, AppState};

/// Create pet registry routes
pub fn routes<S>() -> Router<AppState<S>>
where
    S: PersistencePort + Clone + 'static,
{
    Router::new()
        .route("/pets", post(pets::register_pet::<S>).get(pets::list_pets::<S>))
        .route("/pets/search", get(pets::search_pets::<S>))
        .route(
            "/pets/historico/reencontros",
            get(pets::reunion_history::<S>),
        )
        .route("/pets/:id", get(pets::get_pet::<S>))
        .route("/pets/:id/encontrado", put(pets::mark_found::<S>))
        .route("/stats", get(pets::stats::<S>))
}
