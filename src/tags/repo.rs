use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::Tag;
use crate::{
    db::write_error,
    pagination::{Page, PageRequest},
};

#[async_trait]
pub trait TagRepository: Send + Sync {
    /// Alphabetical by title.
    async fn query_all(&self, page: PageRequest) -> anyhow::Result<Page<Tag>>;
    async fn find_one_by_id(&self, id: Uuid) -> anyhow::Result<Option<Tag>>;
    async fn find_one_by_title(&self, title: &str) -> anyhow::Result<Option<Tag>>;
    /// Titles are unique; a taken one fails with
    /// [`UniqueViolation`](crate::db::UniqueViolation).
    async fn save(&self, tag: &Tag) -> anyhow::Result<()>;
    /// Also unlinks the tag from every recipe.
    async fn delete(&self, tag: &Tag) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct PgTagRepository {
    db: PgPool,
}

impl PgTagRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TagRepository for PgTagRepository {
    async fn query_all(&self, page: PageRequest) -> anyhow::Result<Page<Tag>> {
        let rows = sqlx::query_as::<_, Tag>(
            "SELECT id, title FROM tags ORDER BY title ASC, id ASC LIMIT $1 OFFSET $2",
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.db)
        .await
        .context("list tags")?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tags")
            .fetch_one(&self.db)
            .await
            .context("count tags")?;

        Ok(Page::new(rows, page, total))
    }

    async fn find_one_by_id(&self, id: Uuid) -> anyhow::Result<Option<Tag>> {
        let row = sqlx::query_as::<_, Tag>("SELECT id, title FROM tags WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .context("find tag by id")?;
        Ok(row)
    }

    async fn find_one_by_title(&self, title: &str) -> anyhow::Result<Option<Tag>> {
        let row = sqlx::query_as::<_, Tag>("SELECT id, title FROM tags WHERE title = $1")
            .bind(title)
            .fetch_optional(&self.db)
            .await
            .context("find tag by title")?;
        Ok(row)
    }

    async fn save(&self, tag: &Tag) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO tags (id, title)
            VALUES ($1, $2)
            ON CONFLICT (id) DO UPDATE SET title = EXCLUDED.title
            "#,
        )
        .bind(tag.id)
        .bind(&tag.title)
        .execute(&self.db)
        .await
        .map_err(|e| write_error(e, "save tag"))?;
        Ok(())
    }

    async fn delete(&self, tag: &Tag) -> anyhow::Result<()> {
        let mut tx = self.db.begin().await.context("begin tx")?;
        sqlx::query("DELETE FROM recipes_tags WHERE tag_id = $1")
            .bind(tag.id)
            .execute(&mut *tx)
            .await
            .context("unlink tag")?;
        sqlx::query("DELETE FROM tags WHERE id = $1")
            .bind(tag.id)
            .execute(&mut *tx)
            .await
            .context("delete tag")?;
        tx.commit().await.context("commit tx")?;
        Ok(())
    }
}
