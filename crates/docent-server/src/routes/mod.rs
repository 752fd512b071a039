//! Route definitions for the REST API.

mod conversations;
mod feedback;
mod health;
mod ingest;
mod retrieve;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::state::AppState;

/// Create the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/retrieve", post(retrieve::retrieve))
        .route("/ingest", post(ingest::ingest))
        .route("/feedback", post(feedback::submit_feedback))
        .route(
            "/conversations/:user_id",
            get(conversations::load_conversation).post(conversations::append_turn),
        )
        .route(
            "/conversations/:user_id/profile",
            put(conversations::update_profile),
        )
        .with_state(state)
}

pub use conversations::*;
pub use feedback::*;
pub use health::*;
pub use ingest::*;
pub use retrieve::*;
