use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Form, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::{RolesPage, UserEditPage, UserIndex},
    forms::{EditUserForm, RolesForm},
    voter::USER_VOTER,
};
use crate::{
    auth::{
        dto::PublicUser,
        extractors::CurrentUser,
        services::{RoleChange, UserService},
    },
    error::AppError,
    flash::{redirect, Flash, FlashLevel},
    forms::FieldErrors,
    pagination::PageQuery,
    state::AppState,
    view::View,
    voter::{deny_unless_granted, Action},
};

pub fn account_routes() -> Router<AppState> {
    Router::new().route("/user", get(edit_form).post(edit))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/user", get(index))
        .route("/admin/user/:id/roles", get(roles_form).put(roles))
}

#[instrument(skip_all)]
pub async fn edit_form(
    CurrentUser(user): CurrentUser,
    flash: Flash,
) -> View<UserEditPage> {
    View::new(UserEditPage {
        user: PublicUser::from(&user),
        errors: FieldErrors::new(),
    })
    .with_flash(flash)
}

#[instrument(skip_all)]
pub async fn edit(
    State(users): State<UserService>,
    CurrentUser(user): CurrentUser,
    Form(form): Form<EditUserForm>,
) -> Result<Response, AppError> {
    let errors = form.check();
    if !errors.is_empty() {
        return Ok(View::invalid(UserEditPage {
            user: PublicUser::from(&user),
            errors,
        })
        .into_response());
    }

    users.change_password(&user, &form.password).await?;
    Ok(redirect("/user", FlashLevel::Success, "message.edited_successfully"))
}

#[instrument(skip(users, user, flash))]
pub async fn index(
    State(users): State<UserService>,
    CurrentUser(user): CurrentUser,
    Query(q): Query<PageQuery>,
    flash: Flash,
) -> Result<View<UserIndex>, AppError> {
    deny_unless_granted(&USER_VOTER, Action::View, None, &user)?;
    let pagination = users
        .paginated_list(q.request().page)
        .await?
        .map(|u| PublicUser::from(&u));
    Ok(View::new(UserIndex { pagination }).with_flash(flash))
}

#[instrument(skip(users, user))]
pub async fn roles_form(
    State(users): State<UserService>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<View<RolesPage>, AppError> {
    let target = users
        .find_one_by_id(id)
        .await?
        .ok_or(AppError::NotFound("user"))?;
    deny_unless_granted(&USER_VOTER, Action::Edit, Some(&target), &user)?;
    Ok(View::new(RolesPage::new(&target)))
}

#[instrument(skip(users, user, form))]
pub async fn roles(
    State(users): State<UserService>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Form(form): Form<RolesForm>,
) -> Result<Response, AppError> {
    let mut target = users
        .find_one_by_id(id)
        .await?
        .ok_or(AppError::NotFound("user"))?;
    deny_unless_granted(&USER_VOTER, Action::Edit, Some(&target), &user)?;

    match users.set_admin(&mut target, form.wants_admin()).await? {
        RoleChange::Applied => Ok(redirect(
            "/admin/user",
            FlashLevel::Success,
            "message_updated_successfully",
        )),
        RoleChange::LastAdmin => Ok(redirect(
            "/admin/user",
            FlashLevel::Warning,
            "message_last_admin",
        )),
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{header, Method, StatusCode};

    use crate::test_support::{body_json, flash_cookie, form_request, json_request, send, TestApp};

    #[tokio::test]
    async fn password_change_takes_effect() {
        let app = TestApp::new();
        let (_, token) = app.user("cook@example.com").await;

        let res = send(&app.router, form_request(Method::POST, "/user", Some(&token), "password=abc")).await;
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body_json(res).await["errors"]["password"].is_array());

        let res = send(
            &app.router,
            form_request(Method::POST, "/user", Some(&token), "password=brand-new-secret"),
        )
        .await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(res.headers()[header::LOCATION], "/user");
        assert_eq!(flash_cookie(&res).as_deref(), Some("success:message.edited_successfully"));

        let res = send(
            &app.router,
            json_request(
                Method::POST,
                "/auth/login",
                serde_json::json!({"email": "cook@example.com", "password": "brand-new-secret"}),
            ),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn user_list_is_admin_only() {
        let app = TestApp::new();
        let (_, user_token) = app.user("cook@example.com").await;
        let (_, admin_token) = app.admin("admin@example.com").await;

        let res = send(&app.router, app.get_as("/admin/user", &user_token)).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);

        let res = send(&app.router, app.get_as("/admin/user", &admin_token)).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = body_json(res).await;
        assert_eq!(body["pagination"]["total_items"], 2);
        assert!(body["pagination"]["items"][0].get("password_hash").is_none());
    }

    #[tokio::test]
    async fn last_admin_keeps_the_role() {
        let app = TestApp::new();
        let (admin, admin_token) = app.admin("admin@example.com").await;
        let (cook, _) = app.user("cook@example.com").await;
        let own_roles = format!("/admin/user/{}/roles", admin.id);

        let res = send(&app.router, app.get_as(&own_roles, &admin_token)).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_json(res).await["roles"][1]["granted"], true);

        let res = send(&app.router, form_request(Method::PUT, &own_roles, Some(&admin_token), "")).await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(flash_cookie(&res).as_deref(), Some("warning:message_last_admin"));

        let promote = format!("/admin/user/{}/roles", cook.id);
        let res = send(&app.router, form_request(Method::PUT, &promote, Some(&admin_token), "admin=on")).await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);

        let res = send(&app.router, form_request(Method::PUT, &own_roles, Some(&admin_token), "")).await;
        assert_eq!(flash_cookie(&res).as_deref(), Some("success:message_updated_successfully"));

        // Roles are read per request, so the demotion applies at once.
        let res = send(&app.router, app.get_as("/admin/user", &admin_token)).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }
}
