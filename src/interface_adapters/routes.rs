use crate::interface_adapters::handlers::{
    add_turn, cancel_controller, destroy_entity, get_entity, resume_turn, spawn_entity,
    suspend_turn,
};
use crate::interface_adapters::state::AppState;
use axum::{
    Router,
    routing::{delete, get, post},
};
use std::sync::Arc;

// Build the HTTP router for the cell endpoints.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/entities", post(spawn_entity))
        .route("/entities/{entity_id}", get(get_entity).delete(destroy_entity))
        .route("/entities/{entity_id}/turns", post(add_turn))
        .route("/entities/{entity_id}/turns/resume", post(resume_turn))
        .route("/controllers/{controller_id}", delete(cancel_controller))
        .route("/controllers/{controller_id}/suspend", post(suspend_turn))
        .with_state(state)
}
