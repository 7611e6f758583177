use std::sync::Arc;

use axum::extract::FromRef;
use tracing::info;
use uuid::Uuid;

use super::{repo::TagRepository, repo_types::Tag};
use crate::{
    pagination::{Page, PageRequest, PAGINATOR_ITEMS_PER_PAGE},
    state::AppState,
};

#[derive(Clone)]
pub struct TagService {
    tags: Arc<dyn TagRepository>,
}

impl FromRef<AppState> for TagService {
    fn from_ref(state: &AppState) -> Self {
        Self::new(state.tags.clone())
    }
}

impl TagService {
    pub fn new(tags: Arc<dyn TagRepository>) -> Self {
        Self { tags }
    }

    pub async fn paginated_list(&self, page: i64) -> anyhow::Result<Page<Tag>> {
        self.tags
            .query_all(PageRequest::new(page, PAGINATOR_ITEMS_PER_PAGE))
            .await
    }

    pub async fn find_one_by_id(&self, id: Uuid) -> anyhow::Result<Option<Tag>> {
        self.tags.find_one_by_id(id).await
    }

    pub async fn find_one_by_title(&self, title: &str) -> anyhow::Result<Option<Tag>> {
        self.tags.find_one_by_title(title).await
    }

    /// Whether another tag already carries `title`.
    pub async fn is_title_taken(&self, title: &str, except: Option<Uuid>) -> anyhow::Result<bool> {
        Ok(self
            .tags
            .find_one_by_title(title)
            .await?
            .is_some_and(|t| Some(t.id) != except))
    }

    pub async fn save(&self, tag: &Tag) -> anyhow::Result<()> {
        self.tags.save(tag).await?;
        info!(tag_id = %tag.id, title = %tag.title, "tag saved");
        Ok(())
    }

    /// Deletes the tag and unlinks it from every recipe.
    pub async fn delete(&self, tag: &Tag) -> anyhow::Result<()> {
        self.tags.delete(tag).await?;
        info!(tag_id = %tag.id, "tag deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;

    #[tokio::test]
    async fn titles_are_looked_up_exactly() {
        let svc = TagService::new(Arc::new(MemoryStore::default()));
        let quick = Tag::new("quick");
        svc.save(&quick).await.unwrap();

        assert_eq!(svc.find_one_by_title("quick").await.unwrap(), Some(quick.clone()));
        assert!(svc.find_one_by_title("Quick").await.unwrap().is_none());
        assert!(svc.is_title_taken("quick", None).await.unwrap());
        assert!(!svc.is_title_taken("quick", Some(quick.id)).await.unwrap());
    }

    #[tokio::test]
    async fn list_is_alphabetical() {
        let svc = TagService::new(Arc::new(MemoryStore::default()));
        for title in ["vegan", "easy", "quick"] {
            svc.save(&Tag::new(title)).await.unwrap();
        }
        let page = svc.paginated_list(1).await.unwrap();
        let titles: Vec<&str> = page.items.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["easy", "quick", "vegan"]);
    }
}
