use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::Comment;

#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Oldest first, in conversation order.
    async fn find_by_recipe(&self, recipe_id: Uuid) -> anyhow::Result<Vec<Comment>>;
    async fn find_one_by_id(&self, id: Uuid) -> anyhow::Result<Option<Comment>>;
    async fn count_by_recipe(&self, recipe_id: Uuid) -> anyhow::Result<i64>;
    async fn save(&self, comment: &Comment) -> anyhow::Result<()>;
    async fn delete(&self, comment: &Comment) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct PgCommentRepository {
    db: PgPool,
}

impl PgCommentRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CommentRepository for PgCommentRepository {
    async fn find_by_recipe(&self, recipe_id: Uuid) -> anyhow::Result<Vec<Comment>> {
        let rows = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, recipe_id, author_id, content, created_at, updated_at
              FROM comments
             WHERE recipe_id = $1
             ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(recipe_id)
        .fetch_all(&self.db)
        .await
        .context("list comments by recipe")?;
        Ok(rows)
    }

    async fn find_one_by_id(&self, id: Uuid) -> anyhow::Result<Option<Comment>> {
        let row = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, recipe_id, author_id, content, created_at, updated_at
              FROM comments
             WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find comment by id")?;
        Ok(row)
    }

    async fn count_by_recipe(&self, recipe_id: Uuid) -> anyhow::Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE recipe_id = $1")
            .bind(recipe_id)
            .fetch_one(&self.db)
            .await
            .context("count comments by recipe")?;
        Ok(count)
    }

    async fn save(&self, comment: &Comment) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO comments (id, recipe_id, author_id, content, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE
               SET content = EXCLUDED.content,
                   updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(comment.id)
        .bind(comment.recipe_id)
        .bind(comment.author_id)
        .bind(&comment.content)
        .bind(comment.created_at)
        .bind(comment.updated_at)
        .execute(&self.db)
        .await
        .context("save comment")?;
        Ok(())
    }

    async fn delete(&self, comment: &Comment) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(comment.id)
            .execute(&self.db)
            .await
            .context("delete comment")?;
        Ok(())
    }
}
