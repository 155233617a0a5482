//! Tutor account routes

use axum::{
    routing::{get, post},
    Router,
};

use resgate_domain::storage::PersistencePort;

use crate::{handlers::auth, AppState};

/// Create tutor account routes
pub fn routes<S>() -> Router<AppState<S>>
where
    S: PersistencePort + Clone + 'static,
{
    Router::new()
        .route("/auth/register", post(auth::register_tutor::<S>))
        .route("/auth/login", post(auth::login::<S>))
        .route("/auth/user/:id", get(auth::get_tutor::<S>))
}
