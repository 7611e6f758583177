use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{forms::RecipeForm, repo_types::Recipe};
use crate::{
    categories::repo_types::Category, comments::repo_types::Comment, forms::FieldErrors,
    pagination::Page, tags::repo_types::Tag,
};

/// `?page=&category=&tag=` on the recipe index.
#[derive(Debug, Default, Deserialize)]
pub struct RecipeListQuery {
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
}

#[derive(Serialize)]
pub struct RecipeIndex {
    pub pagination: Page<Recipe>,
    pub category: Option<Category>,
    pub tag: Option<Tag>,
}

#[derive(Serialize)]
pub struct RecipeShow {
    pub recipe: Recipe,
    pub category: Option<Category>,
    pub comments: Vec<Comment>,
    pub comment_count: i64,
}

#[derive(Serialize)]
pub struct RecipeFormPage {
    pub recipe: Option<Recipe>,
    pub form: RecipeForm,
    pub categories: Vec<Category>,
    pub errors: FieldErrors,
}

#[derive(Serialize)]
pub struct RecipeDeletePage {
    pub recipe: Recipe,
}

#[derive(Serialize)]
pub struct CommentFormPage {
    pub recipe_id: Uuid,
    pub recipe_title: String,
    pub form: crate::comments::forms::CommentForm,
    pub errors: FieldErrors,
}
