use std::sync::Arc;

use axum::extract::FromRef;
use tracing::{info, warn};
use uuid::Uuid;

use super::{repo::CategoryRepository, repo_types::Category};
use crate::{
    pagination::{Page, PageRequest, PAGINATOR_ITEMS_PER_PAGE},
    recipes::repo::RecipeRepository,
    state::AppState,
};

#[derive(Clone)]
pub struct CategoryService {
    categories: Arc<dyn CategoryRepository>,
    recipes: Arc<dyn RecipeRepository>,
}

impl FromRef<AppState> for CategoryService {
    fn from_ref(state: &AppState) -> Self {
        Self::new(state.categories.clone(), state.recipes.clone())
    }
}

impl CategoryService {
    pub fn new(
        categories: Arc<dyn CategoryRepository>,
        recipes: Arc<dyn RecipeRepository>,
    ) -> Self {
        Self {
            categories,
            recipes,
        }
    }

    pub async fn paginated_list(&self, page: i64) -> anyhow::Result<Page<Category>> {
        self.categories
            .query_all(PageRequest::new(page, PAGINATOR_ITEMS_PER_PAGE))
            .await
    }

    /// Every category, for choice lists.
    pub async fn find_all(&self) -> anyhow::Result<Vec<Category>> {
        self.categories.find_all().await
    }

    pub async fn find_one_by_id(&self, id: Uuid) -> anyhow::Result<Option<Category>> {
        self.categories.find_one_by_id(id).await
    }

    /// A category may go only once no recipe references it. A failed lookup
    /// answers `false`.
    pub async fn can_be_deleted(&self, category: &Category) -> bool {
        match self.recipes.count_by_category(category.id).await {
            Ok(count) => count == 0,
            Err(e) => {
                warn!(error = %e, category_id = %category.id, "recipe count failed");
                false
            }
        }
    }

    pub async fn save(&self, category: &Category) -> anyhow::Result<()> {
        self.categories.save(category).await?;
        info!(category_id = %category.id, name = %category.name, "category saved");
        Ok(())
    }

    pub async fn delete(&self, category: &Category) -> anyhow::Result<()> {
        self.categories.delete(category).await?;
        info!(category_id = %category.id, "category deleted");
        Ok(())
    }
}
