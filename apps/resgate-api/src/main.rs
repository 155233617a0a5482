//! Pet Resgate API
//!
//! HTTP service for reporting lost pets, browsing and searching open cases,
//! and recording reunions. The storage backend is chosen at startup via
//! `RESGATE_BACKEND` (memory, sqlite or document); the domain services are
//! generic over it, so each arm below serves the exact same behavior.

mod dto;
mod handlers;
mod routes;
mod seed;

use anyhow::{bail, Result};
use std::sync::Arc;

use resgate_domain::identity::IdentityService;
use resgate_domain::registry::PetRegistry;
use resgate_domain::storage::PersistencePort;
use resgate_store::{DocumentStore, MemoryStore, SqliteStore};
use tracing::info;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState<S> {
    pub registry: Arc<PetRegistry<S, IdentityService<S>>>,
    pub identity: Arc<IdentityService<S>>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    info!("Starting Pet Resgate API");

    // Load environment variables
    dotenvy::dotenv().ok();

    let backend = std::env::var("RESGATE_BACKEND").unwrap_or_else(|_| {
        info!("RESGATE_BACKEND not set, using default: memory");
        "memory".to_string()
    });
    let host = std::env::var("RESGATE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("RESGATE_PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{host}:{port}");
    let seed_enabled = std::env::var("RESGATE_SEED").map_or(true, |v| v != "false");

    match backend.as_str() {
        "memory" => serve(MemoryStore::new(), &addr, seed_enabled).await,
        "sqlite" => {
            let path =
                std::env::var("RESGATE_DB_PATH").unwrap_or_else(|_| "petresgate.db".to_string());
            let store = SqliteStore::open(&path)?;
            serve(store, &addr, seed_enabled).await
        }
        "document" => serve(DocumentStore::new(), &addr, seed_enabled).await,
        other => bail!("unknown RESGATE_BACKEND '{other}' (expected memory, sqlite or document)"),
    }
}

async fn serve<S>(store: S, addr: &str, seed_enabled: bool) -> Result<()>
where
    S: PersistencePort + Clone + 'static,
{
    let identity = IdentityService::new(store.clone());
    let registry = PetRegistry::new(store, identity.clone());
    let state = AppState {
        registry: Arc::new(registry),
        identity: Arc::new(identity),
    };

    if seed_enabled {
        seed::populate(&state).await?;
    }

    let app = routes::create_router(state);

    info!(addr = %addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
