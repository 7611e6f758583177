mod app;
mod auth;
mod categories;
mod comments;
mod config;
mod db;
mod error;
mod flash;
mod forms;
mod home;
mod pagination;
mod recipes;
mod state;
mod tags;
mod users;
mod view;
mod voter;

#[cfg(test)]
mod test_support;

use crate::{auth::services::UserService, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "recipebox=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let app_state = AppState::init().await?;

    match &app_state.config.admin {
        Some(seed) => UserService::new(app_state.users.clone())
            .ensure_admin(seed)
            .await?,
        None => tracing::warn!("ADMIN_EMAIL/ADMIN_PASSWORD not set; no administrator bootstrapped"),
    }

    let bind_addr = app_state.config.bind_addr();
    app::serve(app::build_app(app_state), &bind_addr).await
}
