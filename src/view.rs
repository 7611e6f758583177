use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::flash::{cleared, Flash, FlashMessage};

/// A rendered page: the view model plus any flash messages it consumes.
pub struct View<T> {
    status: StatusCode,
    flash: Vec<FlashMessage>,
    body: T,
}

#[derive(Serialize)]
struct Envelope<'a, T> {
    flash: &'a [FlashMessage],
    #[serde(flatten)]
    page: &'a T,
}

impl<T: Serialize> View<T> {
    pub fn new(body: T) -> Self {
        Self {
            status: StatusCode::OK,
            flash: Vec::new(),
            body,
        }
    }

    pub fn with_flash(mut self, Flash(messages): Flash) -> Self {
        self.flash = messages;
        self
    }

    /// A form re-rendered with its validation errors.
    pub fn invalid(body: T) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            flash: Vec::new(),
            body,
        }
    }
}

impl<T: Serialize> IntoResponse for View<T> {
    fn into_response(self) -> Response {
        let envelope = Envelope {
            flash: &self.flash,
            page: &self.body,
        };
        if self.flash.is_empty() {
            (self.status, Json(envelope)).into_response()
        } else {
            (self.status, cleared(), Json(envelope)).into_response()
        }
    }
}
