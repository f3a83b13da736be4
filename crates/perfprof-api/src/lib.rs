//! perfprof-api — REST API for the profile engine.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | POST | `/api/v1/profile` | Generate a performance profile for a workload |
//! | GET | `/healthz` | Liveness probe |

pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tokio_util::sync::CancellationToken;

use perfprof_engine::ProfileEngine;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub engine: Arc<ProfileEngine>,
    /// Cancelled on server shutdown; each request runs under a child token.
    pub shutdown: CancellationToken,
}

/// Build the complete API router.
pub fn build_router(engine: Arc<ProfileEngine>, shutdown: CancellationToken) -> Router {
    let state = ApiState { engine, shutdown };

    let api_routes = Router::new()
        .route("/profile", post(handlers::generate_profile))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/healthz", get(handlers::healthz))
}
