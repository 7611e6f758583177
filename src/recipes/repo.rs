use std::collections::HashMap;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::repo_types::{Recipe, RecipeCriteria};
use crate::{
    db::write_error,
    pagination::{Page, PageRequest},
    tags::repo_types::Tag,
};

#[async_trait]
pub trait RecipeRepository: Send + Sync {
    /// Matching recipes, newest-updated first, one page at a time.
    async fn query_all(
        &self,
        criteria: &RecipeCriteria,
        page: PageRequest,
    ) -> anyhow::Result<Page<Recipe>>;
    async fn find_by(&self, criteria: &RecipeCriteria) -> anyhow::Result<Vec<Recipe>>;
    async fn find_one_by_id(&self, id: Uuid) -> anyhow::Result<Option<Recipe>>;
    async fn find_one_by_title(&self, title: &str) -> anyhow::Result<Option<Recipe>>;
    async fn count_by_category(&self, category_id: Uuid) -> anyhow::Result<i64>;
    /// Upserts the recipe and replaces its tag links, storing tags that do
    /// not exist yet. A taken title fails with
    /// [`UniqueViolation`](crate::db::UniqueViolation) and writes nothing.
    async fn save(&self, recipe: &Recipe) -> anyhow::Result<()>;
    /// Removes the recipe with its comments and tag links.
    async fn delete(&self, recipe: &Recipe) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct PgRecipeRepository {
    db: PgPool,
}

impl PgRecipeRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn attach_tags(&self, recipes: &mut [Recipe]) -> anyhow::Result<()> {
        if recipes.is_empty() {
            return Ok(());
        }
        let ids: Vec<Uuid> = recipes.iter().map(|r| r.id).collect();
        let rows: Vec<(Uuid, Uuid, String)> = sqlx::query_as(
            r#"
            SELECT rt.recipe_id, t.id, t.title
              FROM recipes_tags rt
              JOIN tags t ON t.id = rt.tag_id
             WHERE rt.recipe_id = ANY($1)
             ORDER BY t.title ASC
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.db)
        .await
        .context("load recipe tags")?;

        let mut by_recipe: HashMap<Uuid, Vec<Tag>> = HashMap::new();
        for (recipe_id, id, title) in rows {
            by_recipe.entry(recipe_id).or_default().push(Tag { id, title });
        }
        for recipe in recipes.iter_mut() {
            recipe.tags = by_recipe.remove(&recipe.id).unwrap_or_default();
        }
        Ok(())
    }

    /// Replaces the recipe's tag links. Tags missing from the table are
    /// inserted in the same transaction; a title stored concurrently is
    /// reused instead of conflicting.
    async fn link_tags(tx: &mut Transaction<'_, Postgres>, recipe: &Recipe) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM recipes_tags WHERE recipe_id = $1")
            .bind(recipe.id)
            .execute(&mut **tx)
            .await
            .context("clear recipe tags")?;
        for tag in &recipe.tags {
            let tag_id: Uuid = sqlx::query_scalar(
                r#"
                INSERT INTO tags (id, title) VALUES ($1, $2)
                ON CONFLICT (title) DO UPDATE SET title = EXCLUDED.title
                RETURNING id
                "#,
            )
            .bind(tag.id)
            .bind(&tag.title)
            .fetch_one(&mut **tx)
            .await
            .context("store recipe tag")?;
            sqlx::query(
                "INSERT INTO recipes_tags (recipe_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(recipe.id)
            .bind(tag_id)
            .execute(&mut **tx)
            .await
            .context("link recipe tag")?;
        }
        Ok(())
    }
}

const SELECT_RECIPE: &str = r#"
    SELECT r.id, r.title, r.category_id, r.author_id, r.time, r.difficulty,
           r.portion, r.calories, r.content, r.created_at, r.updated_at
      FROM recipes r
"#;

const CRITERIA: &str = r#"
     WHERE ($1::uuid IS NULL OR r.category_id = $1)
       AND ($2::uuid IS NULL OR r.author_id = $2)
       AND ($3::uuid IS NULL OR EXISTS (
             SELECT 1 FROM recipes_tags rt WHERE rt.recipe_id = r.id AND rt.tag_id = $3))
"#;

#[async_trait]
impl RecipeRepository for PgRecipeRepository {
    async fn query_all(
        &self,
        criteria: &RecipeCriteria,
        page: PageRequest,
    ) -> anyhow::Result<Page<Recipe>> {
        let sql = format!(
            "{SELECT_RECIPE} {CRITERIA} ORDER BY r.updated_at DESC, r.id DESC LIMIT $4 OFFSET $5"
        );
        let mut rows = sqlx::query_as::<_, Recipe>(&sql)
            .bind(criteria.category_id)
            .bind(criteria.author_id)
            .bind(criteria.tag_id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.db)
            .await
            .context("list recipes")?;
        self.attach_tags(&mut rows).await?;

        let count_sql = format!("SELECT COUNT(*) FROM recipes r {CRITERIA}");
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(criteria.category_id)
            .bind(criteria.author_id)
            .bind(criteria.tag_id)
            .fetch_one(&self.db)
            .await
            .context("count recipes")?;

        Ok(Page::new(rows, page, total))
    }

    async fn find_by(&self, criteria: &RecipeCriteria) -> anyhow::Result<Vec<Recipe>> {
        let sql = format!("{SELECT_RECIPE} {CRITERIA} ORDER BY r.updated_at DESC, r.id DESC");
        let mut rows = sqlx::query_as::<_, Recipe>(&sql)
            .bind(criteria.category_id)
            .bind(criteria.author_id)
            .bind(criteria.tag_id)
            .fetch_all(&self.db)
            .await
            .context("find recipes")?;
        self.attach_tags(&mut rows).await?;
        Ok(rows)
    }

    async fn find_one_by_id(&self, id: Uuid) -> anyhow::Result<Option<Recipe>> {
        let sql = format!("{SELECT_RECIPE} WHERE r.id = $1");
        let row = sqlx::query_as::<_, Recipe>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .context("find recipe by id")?;
        let Some(recipe) = row else { return Ok(None) };
        let mut one = [recipe];
        self.attach_tags(&mut one).await?;
        let [recipe] = one;
        Ok(Some(recipe))
    }

    async fn find_one_by_title(&self, title: &str) -> anyhow::Result<Option<Recipe>> {
        let sql = format!("{SELECT_RECIPE} WHERE r.title = $1");
        let row = sqlx::query_as::<_, Recipe>(&sql)
            .bind(title)
            .fetch_optional(&self.db)
            .await
            .context("find recipe by title")?;
        Ok(row)
    }

    async fn count_by_category(&self, category_id: Uuid) -> anyhow::Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(DISTINCT id) FROM recipes WHERE category_id = $1")
                .bind(category_id)
                .fetch_one(&self.db)
                .await
                .context("count recipes by category")?;
        Ok(count)
    }

    async fn save(&self, recipe: &Recipe) -> anyhow::Result<()> {
        let mut tx = self.db.begin().await.context("begin tx")?;
        sqlx::query(
            r#"
            INSERT INTO recipes (id, title, category_id, author_id, time, difficulty,
                                 portion, calories, content, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (id) DO UPDATE
               SET title = EXCLUDED.title,
                   category_id = EXCLUDED.category_id,
                   time = EXCLUDED.time,
                   difficulty = EXCLUDED.difficulty,
                   portion = EXCLUDED.portion,
                   calories = EXCLUDED.calories,
                   content = EXCLUDED.content,
                   updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(recipe.id)
        .bind(&recipe.title)
        .bind(recipe.category_id)
        .bind(recipe.author_id)
        .bind(recipe.time)
        .bind(&recipe.difficulty)
        .bind(recipe.portion)
        .bind(recipe.calories)
        .bind(&recipe.content)
        .bind(recipe.created_at)
        .bind(recipe.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| write_error(e, "save recipe"))?;
        Self::link_tags(&mut tx, recipe).await?;
        tx.commit().await.context("commit tx")?;
        Ok(())
    }

    async fn delete(&self, recipe: &Recipe) -> anyhow::Result<()> {
        let mut tx = self.db.begin().await.context("begin tx")?;
        sqlx::query("DELETE FROM comments WHERE recipe_id = $1")
            .bind(recipe.id)
            .execute(&mut *tx)
            .await
            .context("delete recipe comments")?;
        sqlx::query("DELETE FROM recipes_tags WHERE recipe_id = $1")
            .bind(recipe.id)
            .execute(&mut *tx)
            .await
            .context("unlink recipe tags")?;
        sqlx::query("DELETE FROM recipes WHERE id = $1")
            .bind(recipe.id)
            .execute(&mut *tx)
            .await
            .context("delete recipe")?;
        tx.commit().await.context("commit tx")?;
        Ok(())
    }
}
