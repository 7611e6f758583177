use std::sync::Arc;

use axum::extract::FromRef;
use tracing::info;
use uuid::Uuid;

use super::{repo::CommentRepository, repo_types::Comment};
use crate::state::AppState;

#[derive(Clone)]
pub struct CommentService {
    comments: Arc<dyn CommentRepository>,
}

impl FromRef<AppState> for CommentService {
    fn from_ref(state: &AppState) -> Self {
        Self::new(state.comments.clone())
    }
}

impl CommentService {
    pub fn new(comments: Arc<dyn CommentRepository>) -> Self {
        Self { comments }
    }

    pub async fn find_by_recipe(&self, recipe_id: Uuid) -> anyhow::Result<Vec<Comment>> {
        self.comments.find_by_recipe(recipe_id).await
    }

    pub async fn find_one_by_id(&self, id: Uuid) -> anyhow::Result<Option<Comment>> {
        self.comments.find_one_by_id(id).await
    }

    pub async fn count_by_recipe(&self, recipe_id: Uuid) -> anyhow::Result<i64> {
        self.comments.count_by_recipe(recipe_id).await
    }

    pub async fn save(&self, comment: &Comment) -> anyhow::Result<()> {
        self.comments.save(comment).await?;
        info!(comment_id = %comment.id, recipe_id = %comment.recipe_id, "comment saved");
        Ok(())
    }

    pub async fn delete(&self, comment: &Comment) -> anyhow::Result<()> {
        self.comments.delete(comment).await?;
        info!(comment_id = %comment.id, "comment deleted");
        Ok(())
    }
}
