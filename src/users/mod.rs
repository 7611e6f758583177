use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod forms;
pub mod handlers;
pub mod voter;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::account_routes())
        .merge(handlers::admin_routes())
}
