//! Landing page: pick a category and jump to its recipes.

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    categories::{repo_types::Category, services::CategoryService},
    error::AppError,
    flash::Flash,
    forms::{add_error, parse_id, FieldErrors},
    state::AppState,
    view::View,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(index).post(pick))
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct HomeForm {
    #[serde(default)]
    pub category: String,
}

#[derive(Serialize)]
pub struct HomePage {
    pub categories: Vec<Category>,
    pub form: HomeForm,
    pub errors: FieldErrors,
}

#[instrument(skip_all)]
pub async fn index(
    State(categories): State<CategoryService>,
    flash: Flash,
) -> Result<View<HomePage>, AppError> {
    Ok(View::new(HomePage {
        categories: categories.find_all().await?,
        form: HomeForm::default(),
        errors: FieldErrors::new(),
    })
    .with_flash(flash))
}

#[instrument(skip(categories))]
pub async fn pick(
    State(categories): State<CategoryService>,
    Form(form): Form<HomeForm>,
) -> Result<Response, AppError> {
    let mut errors = FieldErrors::new();
    if let Some(id) = parse_id(&mut errors, "category", &form.category) {
        if let Some(category) = categories.find_one_by_id(id).await? {
            return Ok(Redirect::to(&format!("/recipe?category={}", category.id)).into_response());
        }
        add_error(&mut errors, "category", "This value is not valid.");
    }
    Ok(View::invalid(HomePage {
        categories: categories.find_all().await?,
        form,
        errors,
    })
    .into_response())
}
