use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::Category;
use crate::pagination::{Page, PageRequest};

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Newest-updated first.
    async fn query_all(&self, page: PageRequest) -> anyhow::Result<Page<Category>>;
    /// Every category, by name, for choice lists.
    async fn find_all(&self) -> anyhow::Result<Vec<Category>>;
    async fn find_one_by_id(&self, id: Uuid) -> anyhow::Result<Option<Category>>;
    async fn find_one_by_name(&self, name: &str) -> anyhow::Result<Option<Category>>;
    async fn save(&self, category: &Category) -> anyhow::Result<()>;
    /// Fails while recipes still reference the category.
    async fn delete(&self, category: &Category) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct PgCategoryRepository {
    db: PgPool,
}

impl PgCategoryRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CategoryRepository for PgCategoryRepository {
    async fn query_all(&self, page: PageRequest) -> anyhow::Result<Page<Category>> {
        let rows = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name, created_at, updated_at
            FROM categories
            ORDER BY updated_at DESC, id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.db)
        .await
        .context("list categories")?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
            .fetch_one(&self.db)
            .await
            .context("count categories")?;

        Ok(Page::new(rows, page, total))
    }

    async fn find_all(&self) -> anyhow::Result<Vec<Category>> {
        let rows = sqlx::query_as::<_, Category>(
            "SELECT id, name, created_at, updated_at FROM categories ORDER BY name ASC",
        )
        .fetch_all(&self.db)
        .await
        .context("list category choices")?;
        Ok(rows)
    }

    async fn find_one_by_id(&self, id: Uuid) -> anyhow::Result<Option<Category>> {
        let row = sqlx::query_as::<_, Category>(
            "SELECT id, name, created_at, updated_at FROM categories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find category by id")?;
        Ok(row)
    }

    async fn find_one_by_name(&self, name: &str) -> anyhow::Result<Option<Category>> {
        let row = sqlx::query_as::<_, Category>(
            "SELECT id, name, created_at, updated_at FROM categories WHERE name = $1 LIMIT 1",
        )
        .bind(name)
        .fetch_optional(&self.db)
        .await
        .context("find category by name")?;
        Ok(row)
    }

    async fn save(&self, category: &Category) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO categories (id, name, created_at, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE
               SET name = EXCLUDED.name,
                   updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(category.id)
        .bind(&category.name)
        .bind(category.created_at)
        .bind(category.updated_at)
        .execute(&self.db)
        .await
        .context("save category")?;
        Ok(())
    }

    async fn delete(&self, category: &Category) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(category.id)
            .execute(&self.db)
            .await
            .context("delete category")?;
        Ok(())
    }
}
