use std::sync::Arc;

use axum::extract::FromRef;
use tracing::info;
use uuid::Uuid;

use super::{
    repo::RecipeRepository,
    repo_types::{Recipe, RecipeCriteria},
};
use crate::{
    pagination::{Page, PageRequest, PAGINATOR_ITEMS_PER_PAGE},
    state::AppState,
};

#[derive(Clone)]
pub struct RecipeService {
    recipes: Arc<dyn RecipeRepository>,
}

impl FromRef<AppState> for RecipeService {
    fn from_ref(state: &AppState) -> Self {
        Self::new(state.recipes.clone())
    }
}

impl RecipeService {
    pub fn new(recipes: Arc<dyn RecipeRepository>) -> Self {
        Self { recipes }
    }

    pub async fn paginated_list(
        &self,
        page: i64,
        criteria: &RecipeCriteria,
    ) -> anyhow::Result<Page<Recipe>> {
        self.recipes
            .query_all(criteria, PageRequest::new(page, PAGINATOR_ITEMS_PER_PAGE))
            .await
    }

    pub async fn find_by(&self, criteria: &RecipeCriteria) -> anyhow::Result<Vec<Recipe>> {
        self.recipes.find_by(criteria).await
    }

    pub async fn find_by_category(&self, category_id: Uuid) -> anyhow::Result<Vec<Recipe>> {
        self.recipes
            .find_by(&RecipeCriteria::by_category(category_id))
            .await
    }

    pub async fn find_one_by_id(&self, id: Uuid) -> anyhow::Result<Option<Recipe>> {
        self.recipes.find_one_by_id(id).await
    }

    /// Whether a recipe other than `except` already uses `title`.
    pub async fn is_title_taken(&self, title: &str, except: Option<Uuid>) -> anyhow::Result<bool> {
        Ok(self
            .recipes
            .find_one_by_title(title)
            .await?
            .is_some_and(|r| Some(r.id) != except))
    }

    pub async fn save(&self, recipe: &Recipe) -> anyhow::Result<()> {
        self.recipes.save(recipe).await?;
        info!(recipe_id = %recipe.id, title = %recipe.title, "recipe saved");
        Ok(())
    }

    /// Deletes the recipe together with its comments and tag links.
    pub async fn delete(&self, recipe: &Recipe) -> anyhow::Result<()> {
        self.recipes.delete(recipe).await?;
        info!(recipe_id = %recipe.id, "recipe deleted");
        Ok(())
    }
}
