use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::forms::{collect, FieldErrors};

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CategoryForm {
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "Name must be between 1 and 255 characters"))]
    pub name: String,
}

impl CategoryForm {
    /// Trims the input and returns the field errors, empty when valid.
    pub fn check(&mut self) -> FieldErrors {
        self.name = self.name.trim().to_string();
        match self.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => collect(&e),
        }
    }
}
