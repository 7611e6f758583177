use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod forms;
pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod services;
pub mod voter;

pub fn router() -> Router<AppState> {
    handlers::comment_routes()
}
