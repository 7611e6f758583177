use axum::{
    extract::{Path, State},
    response::Response,
    routing::get,
    Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::CommentDeletePage, repo_types::Comment, services::CommentService, voter::CommentVoter,
};
use crate::{
    auth::extractors::CurrentUser,
    error::AppError,
    flash::{redirect, FlashLevel},
    state::AppState,
    view::View,
    voter::{deny_unless_granted, Action},
};

pub fn comment_routes() -> Router<AppState> {
    Router::new().route("/comment/:id/delete", get(delete_form).delete(delete))
}

async fn load(comments: &CommentService, id: Uuid) -> Result<Comment, AppError> {
    comments
        .find_one_by_id(id)
        .await?
        .ok_or(AppError::NotFound("comment"))
}

#[instrument(skip(comments, user))]
pub async fn delete_form(
    State(comments): State<CommentService>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<View<CommentDeletePage>, AppError> {
    let comment = load(&comments, id).await?;
    deny_unless_granted(&CommentVoter, Action::Delete, Some(&comment), &user)?;
    Ok(View::new(CommentDeletePage { comment }))
}

#[instrument(skip(comments, user))]
pub async fn delete(
    State(comments): State<CommentService>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let comment = load(&comments, id).await?;
    deny_unless_granted(&CommentVoter, Action::Delete, Some(&comment), &user)?;
    comments.delete(&comment).await?;
    Ok(redirect(
        &format!("/recipe/{}", comment.recipe_id),
        FlashLevel::Success,
        "message_deleted_successfully",
    ))
}
