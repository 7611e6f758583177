//! One-shot messages carried from a redirect to the next rendered page.
//!
//! A successful form submission answers `303 See Other` and stores the
//! outcome in the `flash` cookie. The next page reads the cookie, includes
//! the messages in its body and clears it.

use std::convert::Infallible;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;
use tracing::debug;

pub const COOKIE_NAME: &str = "flash";

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Warning,
}

impl FlashLevel {
    fn as_str(self) -> &'static str {
        match self {
            FlashLevel::Success => "success",
            FlashLevel::Warning => "warning",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "success" => Some(FlashLevel::Success),
            "warning" => Some(FlashLevel::Warning),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FlashMessage {
    pub level: FlashLevel,
    pub message: String,
}

impl FlashMessage {
    pub fn new(level: FlashLevel, message: &str) -> Self {
        Self {
            level,
            message: message.to_string(),
        }
    }
}

/// Messages pending for the current request.
#[derive(Debug, Clone, Default)]
pub struct Flash(pub Vec<FlashMessage>);

#[async_trait]
impl<S> FromRequestParts<S> for Flash
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let messages = jar
            .get(COOKIE_NAME)
            .map(|cookie| decode(cookie.value()))
            .unwrap_or_default();
        Ok(Flash(messages))
    }
}

fn flash_cookie(value: String) -> Cookie<'static> {
    Cookie::build((COOKIE_NAME, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Redirects to `to` with `303 See Other`, leaving one flash message behind.
pub fn redirect(to: &str, level: FlashLevel, message: &str) -> Response {
    let cookie = flash_cookie(encode(&[FlashMessage::new(level, message)]));
    debug!(location = %to, level = level.as_str(), message, "redirect with flash");
    (CookieJar::new().add(cookie), Redirect::to(to)).into_response()
}

/// Expires the flash cookie once it has been shown.
pub fn cleared() -> CookieJar {
    let mut cookie = flash_cookie(String::new());
    cookie.make_removal();
    CookieJar::new().add(cookie)
}

fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

fn encode(messages: &[FlashMessage]) -> String {
    messages
        .iter()
        .map(|m| {
            let message: String = m.message.chars().filter(|c| is_token_char(*c)).collect();
            format!("{}:{}", m.level.as_str(), message)
        })
        .collect::<Vec<_>>()
        .join("|")
}

fn decode(value: &str) -> Vec<FlashMessage> {
    value
        .split('|')
        .filter_map(|item| {
            let (level, message) = item.split_once(':')?;
            let level = FlashLevel::parse(level)?;
            if message.is_empty() || !message.chars().all(is_token_char) {
                return None;
            }
            Some(FlashMessage::new(level, message))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, Request, StatusCode};

    #[test]
    fn decode_reads_what_redirect_writes() {
        let messages = vec![
            FlashMessage::new(FlashLevel::Success, "message_added_successfully"),
            FlashMessage::new(FlashLevel::Warning, "message.edited_successfully"),
        ];
        assert_eq!(decode(&encode(&messages)), messages);
    }

    #[test]
    fn decode_drops_garbage() {
        assert!(decode("").is_empty());
        assert!(decode("shout:hello").is_empty());
        assert!(decode("success:<script>").is_empty());
        assert_eq!(decode("nonsense|warning:oops").len(), 1);
        assert!(decode("error:oops").is_empty());
    }

    #[test]
    fn redirect_is_see_other_with_cookie() {
        let res = redirect("/recipe", FlashLevel::Success, "message_added_successfully");
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(res.headers()[header::LOCATION], "/recipe");
        let raw = res.headers()[header::SET_COOKIE].to_str().unwrap();
        let cookie = Cookie::parse_encoded(raw.to_string()).unwrap();
        assert_eq!(cookie.name(), COOKIE_NAME);
        assert_eq!(cookie.value(), "success:message_added_successfully");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
    }

    #[tokio::test]
    async fn extractor_reads_cookie_among_others() {
        let req = Request::builder()
            .header(header::COOKIE, "theme=dark; flash=warning:message_category_contains_recipes")
            .body(())
            .unwrap();
        let (mut parts, _) = req.into_parts();
        let Flash(messages) = Flash::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(
            messages,
            vec![FlashMessage::new(FlashLevel::Warning, "message_category_contains_recipes")]
        );
    }

    #[tokio::test]
    async fn extractor_decodes_what_redirect_sets() {
        let res = redirect("/tag", FlashLevel::Warning, "message_last_admin");
        let set_cookie = res.headers()[header::SET_COOKIE].to_str().unwrap();
        let pair = set_cookie.split(';').next().unwrap();
        let req = Request::builder()
            .header(header::COOKIE, pair)
            .body(())
            .unwrap();
        let (mut parts, _) = req.into_parts();
        let Flash(messages) = Flash::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(
            messages,
            vec![FlashMessage::new(FlashLevel::Warning, "message_last_admin")]
        );
    }
}
