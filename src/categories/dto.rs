use serde::Serialize;

use super::{forms::CategoryForm, repo_types::Category};
use crate::{forms::FieldErrors, pagination::Page, recipes::repo_types::Recipe};

#[derive(Serialize)]
pub struct CategoryIndex {
    pub pagination: Page<Category>,
}

#[derive(Serialize)]
pub struct CategoryShow {
    pub category: Category,
    pub recipes: Vec<Recipe>,
}

/// Create and edit page. `category` is absent while creating.
#[derive(Serialize)]
pub struct CategoryFormPage {
    pub category: Option<Category>,
    pub form: CategoryForm,
    pub errors: FieldErrors,
}

#[derive(Serialize)]
pub struct CategoryDeletePage {
    pub category: Category,
}
