//! Router-level helpers shared by the handler tests.

use axum::{
    body::Body,
    extract::FromRef,
    http::{header, Method, Request},
    response::Response,
    Router,
};
use axum_extra::extract::cookie::Cookie;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use crate::{
    app::build_app,
    auth::{jwt::JwtKeys, repo_types::User, services::UserService},
    categories::{repo_types::Category, services::CategoryService},
    comments::{repo_types::Comment, services::CommentService},
    flash::COOKIE_NAME,
    recipes::{repo_types::Recipe, services::RecipeService},
    state::AppState,
    tags::{services::TagService, transformer::TagsTransformer},
};

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_state(AppState::fake())
    }

    /// Serves a state whose repositories a test has swapped out.
    pub fn with_state(state: AppState) -> Self {
        Self {
            router: build_app(state.clone()),
            state,
        }
    }

    /// Registers a `ROLE_USER` account and signs an access token for it.
    pub async fn user(&self, email: &str) -> (User, String) {
        let user = UserService::from_ref(&self.state)
            .register(email, email, "password123")
            .await
            .expect("register test user");
        let token = JwtKeys::from_ref(&self.state)
            .sign_access(user.id)
            .expect("sign token");
        (user, token)
    }

    pub async fn admin(&self, email: &str) -> (User, String) {
        let (mut user, token) = self.user(email).await;
        UserService::from_ref(&self.state)
            .set_admin(&mut user, true)
            .await
            .expect("promote test user");
        (user, token)
    }

    pub async fn create_category(&self, name: &str) -> Category {
        let category = Category::new(name);
        CategoryService::from_ref(&self.state)
            .save(&category)
            .await
            .expect("save category");
        category
    }

    pub async fn category_named(&self, name: &str) -> Category {
        CategoryService::from_ref(&self.state)
            .find_all()
            .await
            .expect("list categories")
            .into_iter()
            .find(|c| c.name == name)
            .expect("category exists")
    }

    /// An authorless recipe with the given comma separated tags.
    pub async fn create_recipe(&self, title: &str, category_id: Uuid, tags: Option<&str>) -> Recipe {
        let mut recipe = Recipe::new(title, category_id, None);
        let tag_service = TagService::from_ref(&self.state);
        recipe.tags = TagsTransformer::new(&tag_service)
            .reverse_transform(tags.unwrap_or_default())
            .await
            .expect("resolve tags");
        RecipeService::from_ref(&self.state)
            .save(&recipe)
            .await
            .expect("save recipe");
        recipe
    }

    pub async fn create_authored_recipe(&self, title: &str, category_id: Uuid, author_id: Uuid) -> Recipe {
        let recipe = Recipe::new(title, category_id, Some(author_id));
        RecipeService::from_ref(&self.state)
            .save(&recipe)
            .await
            .expect("save recipe");
        recipe
    }

    pub async fn create_comment(&self, recipe_id: Uuid, author_id: Uuid, content: &str) -> Comment {
        let comment = Comment::new(recipe_id, author_id, content);
        CommentService::from_ref(&self.state)
            .save(&comment)
            .await
            .expect("save comment");
        comment
    }

    pub async fn comment_total(&self, recipe_id: Uuid) -> i64 {
        CommentService::from_ref(&self.state)
            .count_by_recipe(recipe_id)
            .await
            .expect("count comments")
    }

    pub fn get(&self, path: &str) -> Request<Body> {
        Request::builder()
            .uri(path)
            .body(Body::empty())
            .expect("request")
    }

    pub fn get_as(&self, path: &str, token: &str) -> Request<Body> {
        Request::builder()
            .uri(path)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .expect("request")
    }
}

pub fn json_request(method: Method, path: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

/// A url-encoded form submission, optionally authenticated.
pub fn form_request(method: Method, path: &str, token: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).expect("request")
}

pub async fn send(router: &Router, req: Request<Body>) -> Response {
    router.clone().oneshot(req).await.expect("infallible")
}

pub async fn body_json(res: Response) -> Value {
    let bytes = res
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}

/// Decoded value of the flash cookie a response sets, if any.
pub fn flash_cookie(res: &Response) -> Option<String> {
    res.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| Cookie::parse_encoded(v.to_string()).ok())
        .find(|c| c.name() == COOKIE_NAME)
        .map(|c| c.value().to_string())
}
