use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::forms::{collect, FieldErrors};

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CommentForm {
    #[serde(default)]
    #[validate(length(min = 3, max = 255, message = "Comment must be between 3 and 255 characters"))]
    pub content: String,
}

impl CommentForm {
    pub fn check(&mut self) -> FieldErrors {
        self.content = self.content.trim().to_string();
        match self.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => collect(&e),
        }
    }
}
