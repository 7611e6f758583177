use serde::Serialize;

use super::{forms::TagForm, repo_types::Tag};
use crate::{forms::FieldErrors, pagination::Page};

#[derive(Serialize)]
pub struct TagIndex {
    pub pagination: Page<Tag>,
}

#[derive(Serialize)]
pub struct TagFormPage {
    pub tag: Option<Tag>,
    pub form: TagForm,
    pub errors: FieldErrors,
}

#[derive(Serialize)]
pub struct TagDeletePage {
    pub tag: Tag,
}
