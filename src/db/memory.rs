//! In-process store used when no `DATABASE_URL` is configured, and by tests.
//!
//! Mirrors the constraints of the PostgreSQL schema: unique recipe titles,
//! tag titles and emails, and a category that cannot go while recipes
//! reference it. Every write runs under one lock, so each repository call
//! is atomic like its SQL transaction.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    auth::{
        repo::UserRepository,
        repo_types::{User, UserRole},
    },
    categories::{repo::CategoryRepository, repo_types::Category},
    comments::{repo::CommentRepository, repo_types::Comment},
    db::UniqueViolation,
    pagination::{Page, PageRequest},
    recipes::{
        repo::RecipeRepository,
        repo_types::{Recipe, RecipeCriteria},
    },
    tags::{repo::TagRepository, repo_types::Tag},
};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    categories: HashMap<Uuid, Category>,
    tags: HashMap<Uuid, Tag>,
    /// Stored without tags; links live in `recipe_tags`.
    recipes: HashMap<Uuid, Recipe>,
    recipe_tags: HashMap<Uuid, Vec<Uuid>>,
    comments: HashMap<Uuid, Comment>,
}

impl Tables {
    fn hydrate(&self, recipe: &Recipe) -> Recipe {
        let mut out = recipe.clone();
        out.tags = self
            .recipe_tags
            .get(&recipe.id)
            .map(|ids| ids.iter().filter_map(|id| self.tags.get(id)).cloned().collect())
            .unwrap_or_default();
        out.tags.sort_by(|a, b| a.title.cmp(&b.title));
        out
    }

    fn recipes_matching(&self, criteria: &RecipeCriteria) -> Vec<Recipe> {
        let mut rows: Vec<Recipe> = self
            .recipes
            .values()
            .map(|r| self.hydrate(r))
            .filter(|r| criteria.matches(r))
            .collect();
        rows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));
        rows
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn query_all(&self, page: PageRequest) -> anyhow::Result<Page<User>> {
        let t = self.tables.read().await;
        let mut rows: Vec<User> = t.users.values().cloned().collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(Page::slice(rows, page))
    }

    async fn find_one_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_one_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let t = self.tables.read().await;
        Ok(t.users.values().find(|u| u.email == email).cloned())
    }

    async fn count_by_role(&self, role: UserRole) -> anyhow::Result<i64> {
        let t = self.tables.read().await;
        Ok(t.users.values().filter(|u| u.has_role(role)).count() as i64)
    }

    async fn revoke_role_unless_last(&self, id: Uuid, role: UserRole) -> anyhow::Result<bool> {
        let mut t = self.tables.write().await;
        let holders = t.users.values().filter(|u| u.has_role(role)).count();
        let Some(user) = t.users.get_mut(&id) else {
            return Ok(true);
        };
        if !user.has_role(role) {
            return Ok(true);
        }
        if holders <= 1 {
            return Ok(false);
        }
        user.revoke(role);
        Ok(true)
    }

    async fn save(&self, user: &User) -> anyhow::Result<()> {
        let mut t = self.tables.write().await;
        if t.users
            .values()
            .any(|u| u.id != user.id && u.email == user.email)
        {
            return Err(UniqueViolation::new("users_email_key").into());
        }
        t.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn upgrade_password(&self, id: Uuid, password_hash: &str) -> anyhow::Result<()> {
        let mut t = self.tables.write().await;
        if let Some(user) = t.users.get_mut(&id) {
            user.password_hash = password_hash.to_string();
        }
        Ok(())
    }
}

#[async_trait]
impl CategoryRepository for MemoryStore {
    async fn query_all(&self, page: PageRequest) -> anyhow::Result<Page<Category>> {
        let t = self.tables.read().await;
        let mut rows: Vec<Category> = t.categories.values().cloned().collect();
        rows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));
        Ok(Page::slice(rows, page))
    }

    async fn find_all(&self) -> anyhow::Result<Vec<Category>> {
        let t = self.tables.read().await;
        let mut rows: Vec<Category> = t.categories.values().cloned().collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn find_one_by_id(&self, id: Uuid) -> anyhow::Result<Option<Category>> {
        Ok(self.tables.read().await.categories.get(&id).cloned())
    }

    async fn find_one_by_name(&self, name: &str) -> anyhow::Result<Option<Category>> {
        let t = self.tables.read().await;
        Ok(t.categories.values().find(|c| c.name == name).cloned())
    }

    async fn save(&self, category: &Category) -> anyhow::Result<()> {
        let mut t = self.tables.write().await;
        t.categories.insert(category.id, category.clone());
        Ok(())
    }

    async fn delete(&self, category: &Category) -> anyhow::Result<()> {
        let mut t = self.tables.write().await;
        if t.recipes.values().any(|r| r.category_id == category.id) {
            anyhow::bail!("category {} is still referenced by recipes", category.id);
        }
        t.categories.remove(&category.id);
        Ok(())
    }
}

#[async_trait]
impl TagRepository for MemoryStore {
    async fn query_all(&self, page: PageRequest) -> anyhow::Result<Page<Tag>> {
        let t = self.tables.read().await;
        let mut rows: Vec<Tag> = t.tags.values().cloned().collect();
        rows.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(Page::slice(rows, page))
    }

    async fn find_one_by_id(&self, id: Uuid) -> anyhow::Result<Option<Tag>> {
        Ok(self.tables.read().await.tags.get(&id).cloned())
    }

    async fn find_one_by_title(&self, title: &str) -> anyhow::Result<Option<Tag>> {
        let t = self.tables.read().await;
        Ok(t.tags.values().find(|tag| tag.title == title).cloned())
    }

    async fn save(&self, tag: &Tag) -> anyhow::Result<()> {
        let mut t = self.tables.write().await;
        if t.tags.values().any(|x| x.id != tag.id && x.title == tag.title) {
            return Err(UniqueViolation::new("tags_title_key").into());
        }
        t.tags.insert(tag.id, tag.clone());
        Ok(())
    }

    async fn delete(&self, tag: &Tag) -> anyhow::Result<()> {
        let mut t = self.tables.write().await;
        for links in t.recipe_tags.values_mut() {
            links.retain(|id| *id != tag.id);
        }
        t.tags.remove(&tag.id);
        Ok(())
    }
}

#[async_trait]
impl RecipeRepository for MemoryStore {
    async fn query_all(
        &self,
        criteria: &RecipeCriteria,
        page: PageRequest,
    ) -> anyhow::Result<Page<Recipe>> {
        let t = self.tables.read().await;
        Ok(Page::slice(t.recipes_matching(criteria), page))
    }

    async fn find_by(&self, criteria: &RecipeCriteria) -> anyhow::Result<Vec<Recipe>> {
        Ok(self.tables.read().await.recipes_matching(criteria))
    }

    async fn find_one_by_id(&self, id: Uuid) -> anyhow::Result<Option<Recipe>> {
        let t = self.tables.read().await;
        Ok(t.recipes.get(&id).map(|r| t.hydrate(r)))
    }

    async fn find_one_by_title(&self, title: &str) -> anyhow::Result<Option<Recipe>> {
        let t = self.tables.read().await;
        Ok(t.recipes
            .values()
            .find(|r| r.title == title)
            .map(|r| t.hydrate(r)))
    }

    async fn count_by_category(&self, category_id: Uuid) -> anyhow::Result<i64> {
        let t = self.tables.read().await;
        Ok(t.recipes
            .values()
            .filter(|r| r.category_id == category_id)
            .count() as i64)
    }

    async fn save(&self, recipe: &Recipe) -> anyhow::Result<()> {
        let mut t = self.tables.write().await;
        if t.recipes
            .values()
            .any(|r| r.id != recipe.id && r.title == recipe.title)
        {
            return Err(UniqueViolation::new("recipes_title_key").into());
        }
        if !t.categories.contains_key(&recipe.category_id) {
            anyhow::bail!("category {} does not exist", recipe.category_id);
        }
        let mut links: Vec<Uuid> = Vec::with_capacity(recipe.tags.len());
        for tag in &recipe.tags {
            let existing = t.tags.values().find(|x| x.title == tag.title).map(|x| x.id);
            let id = match existing {
                Some(id) => id,
                None => {
                    t.tags.insert(tag.id, tag.clone());
                    tag.id
                }
            };
            if !links.contains(&id) {
                links.push(id);
            }
        }
        let mut row = recipe.clone();
        row.tags.clear();
        t.recipes.insert(row.id, row);
        t.recipe_tags.insert(recipe.id, links);
        Ok(())
    }

    async fn delete(&self, recipe: &Recipe) -> anyhow::Result<()> {
        let mut t = self.tables.write().await;
        t.comments.retain(|_, c| c.recipe_id != recipe.id);
        t.recipe_tags.remove(&recipe.id);
        t.recipes.remove(&recipe.id);
        Ok(())
    }
}

#[async_trait]
impl CommentRepository for MemoryStore {
    async fn find_by_recipe(&self, recipe_id: Uuid) -> anyhow::Result<Vec<Comment>> {
        let t = self.tables.read().await;
        let mut rows: Vec<Comment> = t
            .comments
            .values()
            .filter(|c| c.recipe_id == recipe_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn find_one_by_id(&self, id: Uuid) -> anyhow::Result<Option<Comment>> {
        Ok(self.tables.read().await.comments.get(&id).cloned())
    }

    async fn count_by_recipe(&self, recipe_id: Uuid) -> anyhow::Result<i64> {
        let t = self.tables.read().await;
        Ok(t.comments
            .values()
            .filter(|c| c.recipe_id == recipe_id)
            .count() as i64)
    }

    async fn save(&self, comment: &Comment) -> anyhow::Result<()> {
        let mut t = self.tables.write().await;
        if !t.recipes.contains_key(&comment.recipe_id) {
            anyhow::bail!("recipe {} does not exist", comment.recipe_id);
        }
        t.comments.insert(comment.id, comment.clone());
        Ok(())
    }

    async fn delete(&self, comment: &Comment) -> anyhow::Result<()> {
        self.tables.write().await.comments.remove(&comment.id);
        Ok(())
    }
}
