use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Form, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::{CategoryDeletePage, CategoryFormPage, CategoryIndex, CategoryShow},
    forms::CategoryForm,
    repo_types::Category,
    services::CategoryService,
    voter::CATEGORY_VOTER,
};
use crate::{
    auth::extractors::CurrentUser,
    error::AppError,
    flash::{redirect, Flash, FlashLevel},
    forms::FieldErrors,
    pagination::PageQuery,
    recipes::services::RecipeService,
    state::AppState,
    view::View,
    voter::{deny_unless_granted, Action},
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/category", get(index))
        .route("/category/:id", get(show))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/category/create", get(create_form).post(create))
        .route("/category/:id/edit", get(edit_form).put(edit))
        .route("/category/:id/delete", get(delete_form).delete(delete))
}

async fn load(categories: &CategoryService, id: Uuid) -> Result<Category, AppError> {
    categories
        .find_one_by_id(id)
        .await?
        .ok_or(AppError::NotFound("category"))
}

#[instrument(skip(categories, flash))]
pub async fn index(
    State(categories): State<CategoryService>,
    Query(q): Query<PageQuery>,
    flash: Flash,
) -> Result<View<CategoryIndex>, AppError> {
    let pagination = categories.paginated_list(q.request().page).await?;
    Ok(View::new(CategoryIndex { pagination }).with_flash(flash))
}

#[instrument(skip(categories, recipes, flash))]
pub async fn show(
    State(categories): State<CategoryService>,
    State(recipes): State<RecipeService>,
    Path(id): Path<Uuid>,
    flash: Flash,
) -> Result<View<CategoryShow>, AppError> {
    let category = load(&categories, id).await?;
    let recipes = recipes.find_by_category(category.id).await?;
    Ok(View::new(CategoryShow { category, recipes }).with_flash(flash))
}

#[instrument(skip_all)]
pub async fn create_form(CurrentUser(user): CurrentUser) -> Result<View<CategoryFormPage>, AppError> {
    deny_unless_granted(&CATEGORY_VOTER, Action::Create, None, &user)?;
    Ok(View::new(CategoryFormPage {
        category: None,
        form: CategoryForm::default(),
        errors: FieldErrors::new(),
    }))
}

#[instrument(skip(categories, user, form))]
pub async fn create(
    State(categories): State<CategoryService>,
    CurrentUser(user): CurrentUser,
    Form(mut form): Form<CategoryForm>,
) -> Result<Response, AppError> {
    deny_unless_granted(&CATEGORY_VOTER, Action::Create, None, &user)?;
    let errors = form.check();
    if !errors.is_empty() {
        return Ok(View::invalid(CategoryFormPage {
            category: None,
            form,
            errors,
        })
        .into_response());
    }

    let category = Category::new(&form.name);
    categories.save(&category).await?;
    Ok(redirect("/category", FlashLevel::Success, "message_added_successfully"))
}

#[instrument(skip(categories, user))]
pub async fn edit_form(
    State(categories): State<CategoryService>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<View<CategoryFormPage>, AppError> {
    let category = load(&categories, id).await?;
    deny_unless_granted(&CATEGORY_VOTER, Action::Edit, Some(&category), &user)?;
    let form = CategoryForm {
        name: category.name.clone(),
    };
    Ok(View::new(CategoryFormPage {
        category: Some(category),
        form,
        errors: FieldErrors::new(),
    }))
}

#[instrument(skip(categories, user, form))]
pub async fn edit(
    State(categories): State<CategoryService>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Form(mut form): Form<CategoryForm>,
) -> Result<Response, AppError> {
    let mut category = load(&categories, id).await?;
    deny_unless_granted(&CATEGORY_VOTER, Action::Edit, Some(&category), &user)?;
    let errors = form.check();
    if !errors.is_empty() {
        return Ok(View::invalid(CategoryFormPage {
            category: Some(category),
            form,
            errors,
        })
        .into_response());
    }

    category.name = form.name;
    category.touch();
    categories.save(&category).await?;
    Ok(redirect("/category", FlashLevel::Success, "message_updated_successfully"))
}

fn contains_recipes() -> Response {
    redirect(
        "/category",
        FlashLevel::Warning,
        "message_category_contains_recipes",
    )
}

#[instrument(skip(categories, user))]
pub async fn delete_form(
    State(categories): State<CategoryService>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let category = load(&categories, id).await?;
    deny_unless_granted(&CATEGORY_VOTER, Action::Delete, Some(&category), &user)?;
    if !categories.can_be_deleted(&category).await {
        return Ok(contains_recipes());
    }
    Ok(View::new(CategoryDeletePage { category }).into_response())
}

#[instrument(skip(categories, user))]
pub async fn delete(
    State(categories): State<CategoryService>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let category = load(&categories, id).await?;
    deny_unless_granted(&CATEGORY_VOTER, Action::Delete, Some(&category), &user)?;
    if !categories.can_be_deleted(&category).await {
        return Ok(contains_recipes());
    }
    categories.delete(&category).await?;
    Ok(redirect("/category", FlashLevel::Success, "message_deleted_successfully"))
}

#[cfg(test)]
mod tests {
    use axum::http::{header, Method, StatusCode};

    use crate::test_support::{body_json, flash_cookie, form_request, send, TestApp};

    #[tokio::test]
    async fn admin_creates_and_renames_a_category() {
        let app = TestApp::new();
        let (_, token) = app.admin("admin@example.com").await;

        let res = send(
            &app.router,
            form_request(Method::POST, "/category/create", Some(&token), "name=+Italian+"),
        )
        .await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(res.headers()[header::LOCATION], "/category");

        let category = app.category_named("Italian").await;
        let res = send(
            &app.router,
            form_request(
                Method::PUT,
                &format!("/category/{}/edit", category.id),
                Some(&token),
                "name=Tuscan",
            ),
        )
        .await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);

        let res = send(&app.router, app.get(&format!("/category/{}", category.id))).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_json(res).await["category"]["name"], "Tuscan");
    }

    #[tokio::test]
    async fn plain_users_cannot_manage_categories() {
        let app = TestApp::new();
        let (_, token) = app.user("cook@example.com").await;
        let res = send(
            &app.router,
            form_request(Method::POST, "/category/create", Some(&token), "name=Soups"),
        )
        .await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);

        let res = send(&app.router, app.get("/category/create")).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn blank_name_is_unprocessable() {
        let app = TestApp::new();
        let (_, token) = app.admin("admin@example.com").await;
        let res = send(
            &app.router,
            form_request(Method::POST, "/category/create", Some(&token), "name=+++"),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(res).await;
        assert!(body["errors"]["name"].is_array());
        assert_eq!(body["category"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn category_in_use_is_kept_with_a_warning() {
        let app = TestApp::new();
        let (_, token) = app.admin("admin@example.com").await;
        let category = app.create_category("Italian").await;
        app.create_recipe("Pasta", category.id, None).await;

        for method in [Method::GET, Method::DELETE] {
            let res = send(
                &app.router,
                form_request(
                    method,
                    &format!("/category/{}/delete", category.id),
                    Some(&token),
                    "",
                ),
            )
            .await;
            assert_eq!(res.status(), StatusCode::SEE_OTHER);
            assert_eq!(res.headers()[header::LOCATION], "/category");
            assert_eq!(
                flash_cookie(&res).as_deref(),
                Some("warning:message_category_contains_recipes")
            );
        }

        let res = send(&app.router, app.get(&format!("/category/{}", category.id))).await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unused_category_is_deleted() {
        let app = TestApp::new();
        let (_, token) = app.admin("admin@example.com").await;
        let category = app.create_category("Desserts").await;

        let res = send(
            &app.router,
            app.get_as(&format!("/category/{}/delete", category.id), &token),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);

        let res = send(
            &app.router,
            form_request(
                Method::DELETE,
                &format!("/category/{}/delete", category.id),
                Some(&token),
                "",
            ),
        )
        .await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);

        let res = send(&app.router, app.get(&format!("/category/{}", category.id))).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn index_shows_and_clears_the_flash() {
        let app = TestApp::new();
        app.create_category("Soups").await;
        let req = axum::http::Request::builder()
            .uri("/category")
            .header(header::COOKIE, "flash=success:message_added_successfully")
            .body(axum::body::Body::empty())
            .unwrap();
        let res = send(&app.router, req).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(flash_cookie(&res).as_deref(), Some(""));
        assert!(res.headers()[header::SET_COOKIE]
            .to_str()
            .unwrap()
            .contains("Max-Age=0"));
        let body = body_json(res).await;
        assert_eq!(body["flash"][0]["message"], "message_added_successfully");
        assert_eq!(body["pagination"]["total_items"], 1);
    }
}
