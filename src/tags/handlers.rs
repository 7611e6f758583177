use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Form, Router,
};
use tracing::{instrument, warn};
use uuid::Uuid;

use super::{
    dto::{TagDeletePage, TagFormPage, TagIndex},
    forms::TagForm,
    repo_types::Tag,
    services::TagService,
    voter::TAG_VOTER,
};
use crate::{
    auth::extractors::CurrentUser,
    error::AppError,
    flash::{redirect, Flash, FlashLevel},
    db::is_unique_violation,
    forms::{add_error, already_used, FieldErrors, ALREADY_USED},
    pagination::PageQuery,
    state::AppState,
    view::View,
    voter::{deny_unless_granted, Action},
};

pub fn tag_routes() -> Router<AppState> {
    Router::new()
        .route("/tag", get(index))
        .route("/tag/create", get(create_form).post(create))
        .route("/tag/:id/edit", get(edit_form).put(edit))
        .route("/tag/:id/delete", get(delete_form).delete(delete))
}

async fn load(tags: &TagService, id: Uuid) -> Result<Tag, AppError> {
    tags.find_one_by_id(id)
        .await?
        .ok_or(AppError::NotFound("tag"))
}

/// Field errors of the form plus the uniqueness check on the title.
async fn check(tags: &TagService, form: &mut TagForm, except: Option<Uuid>) -> Result<FieldErrors, AppError> {
    let mut errors = form.check();
    if errors.is_empty() && tags.is_title_taken(&form.title, except).await? {
        add_error(&mut errors, "title", ALREADY_USED);
    }
    Ok(errors)
}

#[instrument(skip(tags, flash))]
pub async fn index(
    State(tags): State<TagService>,
    Query(q): Query<PageQuery>,
    flash: Flash,
) -> Result<View<TagIndex>, AppError> {
    let pagination = tags.paginated_list(q.request().page).await?;
    Ok(View::new(TagIndex { pagination }).with_flash(flash))
}

#[instrument(skip_all)]
pub async fn create_form(CurrentUser(user): CurrentUser) -> Result<View<TagFormPage>, AppError> {
    deny_unless_granted(&TAG_VOTER, Action::Create, None, &user)?;
    Ok(View::new(TagFormPage {
        tag: None,
        form: TagForm::default(),
        errors: FieldErrors::new(),
    }))
}

#[instrument(skip(tags, user, form))]
pub async fn create(
    State(tags): State<TagService>,
    CurrentUser(user): CurrentUser,
    Form(mut form): Form<TagForm>,
) -> Result<Response, AppError> {
    deny_unless_granted(&TAG_VOTER, Action::Create, None, &user)?;
    let errors = check(&tags, &mut form, None).await?;
    if !errors.is_empty() {
        return Ok(View::invalid(TagFormPage {
            tag: None,
            form,
            errors,
        })
        .into_response());
    }

    if let Err(err) = tags.save(&Tag::new(&form.title)).await {
        if !is_unique_violation(&err) {
            return Err(err.into());
        }
        warn!(title = %form.title, "tag title taken before save");
        return Ok(View::invalid(TagFormPage {
            tag: None,
            form,
            errors: already_used("title"),
        })
        .into_response());
    }
    Ok(redirect("/tag", FlashLevel::Success, "message_added_successfully"))
}

#[instrument(skip(tags, user))]
pub async fn edit_form(
    State(tags): State<TagService>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<View<TagFormPage>, AppError> {
    let tag = load(&tags, id).await?;
    deny_unless_granted(&TAG_VOTER, Action::Edit, Some(&tag), &user)?;
    let form = TagForm {
        title: tag.title.clone(),
    };
    Ok(View::new(TagFormPage {
        tag: Some(tag),
        form,
        errors: FieldErrors::new(),
    }))
}

#[instrument(skip(tags, user, form))]
pub async fn edit(
    State(tags): State<TagService>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Form(mut form): Form<TagForm>,
) -> Result<Response, AppError> {
    let mut tag = load(&tags, id).await?;
    deny_unless_granted(&TAG_VOTER, Action::Edit, Some(&tag), &user)?;
    let errors = check(&tags, &mut form, Some(tag.id)).await?;
    if !errors.is_empty() {
        return Ok(View::invalid(TagFormPage {
            tag: Some(tag),
            form,
            errors,
        })
        .into_response());
    }

    let previous = tag.title.clone();
    tag.title = form.title.clone();
    if let Err(err) = tags.save(&tag).await {
        if !is_unique_violation(&err) {
            return Err(err.into());
        }
        warn!(tag_id = %tag.id, title = %tag.title, "tag title taken before save");
        tag.title = previous;
        return Ok(View::invalid(TagFormPage {
            tag: Some(tag),
            form,
            errors: already_used("title"),
        })
        .into_response());
    }
    Ok(redirect("/tag", FlashLevel::Success, "message_updated_successfully"))
}

#[instrument(skip(tags, user))]
pub async fn delete_form(
    State(tags): State<TagService>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<View<TagDeletePage>, AppError> {
    let tag = load(&tags, id).await?;
    deny_unless_granted(&TAG_VOTER, Action::Delete, Some(&tag), &user)?;
    Ok(View::new(TagDeletePage { tag }))
}

#[instrument(skip(tags, user))]
pub async fn delete(
    State(tags): State<TagService>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let tag = load(&tags, id).await?;
    deny_unless_granted(&TAG_VOTER, Action::Delete, Some(&tag), &user)?;
    tags.delete(&tag).await?;
    Ok(redirect("/tag", FlashLevel::Success, "message_deleted_successfully"))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::http::{Method, StatusCode};
    use uuid::Uuid;

    use crate::{
        pagination::{Page, PageRequest},
        state::AppState,
        tags::{repo::TagRepository, repo_types::Tag},
        test_support::{body_json, form_request, send, TestApp},
    };

    /// Lets every title through the pre-check so only the store can refuse it.
    struct BlindTitleCheck(Arc<dyn TagRepository>);

    #[async_trait]
    impl TagRepository for BlindTitleCheck {
        async fn query_all(&self, page: PageRequest) -> anyhow::Result<Page<Tag>> {
            self.0.query_all(page).await
        }
        async fn find_one_by_id(&self, id: Uuid) -> anyhow::Result<Option<Tag>> {
            self.0.find_one_by_id(id).await
        }
        async fn find_one_by_title(&self, _title: &str) -> anyhow::Result<Option<Tag>> {
            Ok(None)
        }
        async fn save(&self, tag: &Tag) -> anyhow::Result<()> {
            self.0.save(tag).await
        }
        async fn delete(&self, tag: &Tag) -> anyhow::Result<()> {
            self.0.delete(tag).await
        }
    }

    #[tokio::test]
    async fn title_taken_at_write_time_is_a_field_error() {
        let mut state = AppState::fake();
        state.tags = Arc::new(BlindTitleCheck(state.tags.clone()));
        let app = TestApp::with_state(state);
        let (_, token) = app.admin("admin@example.com").await;

        for title in ["vegan", "spicy"] {
            let res = send(
                &app.router,
                form_request(Method::POST, "/tag/create", Some(&token), &format!("title={title}")),
            )
            .await;
            assert_eq!(res.status(), StatusCode::SEE_OTHER);
        }

        let res = send(
            &app.router,
            form_request(Method::POST, "/tag/create", Some(&token), "title=vegan"),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body_json(res).await["errors"]["title"][0], "This value is already used.");

        let res = send(&app.router, app.get("/tag")).await;
        let list = body_json(res).await;
        assert_eq!(list["pagination"]["total_items"], 2);
        let spicy = list["pagination"]["items"][0]["id"].as_str().unwrap().to_string();

        let res = send(
            &app.router,
            form_request(Method::PUT, &format!("/tag/{spicy}/edit"), Some(&token), "title=vegan"),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(res).await;
        assert_eq!(body["errors"]["title"][0], "This value is already used.");
        assert_eq!(body["tag"]["title"], "spicy");
    }

    #[tokio::test]
    async fn duplicate_title_is_a_field_error() {
        let app = TestApp::new();
        let (_, token) = app.admin("admin@example.com").await;

        let res = send(
            &app.router,
            form_request(Method::POST, "/tag/create", Some(&token), "title=vegan"),
        )
        .await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);

        let res = send(
            &app.router,
            form_request(Method::POST, "/tag/create", Some(&token), "title=+vegan+"),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(res).await;
        assert_eq!(body["errors"]["title"][0], "This value is already used.");
    }

    #[tokio::test]
    async fn deleting_a_tag_keeps_its_recipes() {
        let app = TestApp::new();
        let (_, token) = app.admin("admin@example.com").await;
        let category = app.create_category("Italian").await;
        let recipe = app.create_recipe("Pasta", category.id, Some("quick")).await;
        let tag = recipe.tags[0].clone();

        let res = send(
            &app.router,
            form_request(Method::DELETE, &format!("/tag/{}/delete", tag.id), Some(&token), ""),
        )
        .await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);

        let res = send(&app.router, app.get(&format!("/recipe/{}", recipe.id))).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_json(res).await["recipe"]["tags"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn tag_edit_is_admin_only() {
        let app = TestApp::new();
        let (_, token) = app.user("cook@example.com").await;
        let category = app.create_category("Italian").await;
        let recipe = app.create_recipe("Pasta", category.id, Some("quick")).await;

        let res = send(
            &app.router,
            form_request(
                Method::PUT,
                &format!("/tag/{}/edit", recipe.tags[0].id),
                Some(&token),
                "title=slow",
            ),
        )
        .await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }
}
