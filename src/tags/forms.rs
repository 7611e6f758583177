use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::forms::{collect, FieldErrors};

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct TagForm {
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "Title must be between 1 and 255 characters"))]
    pub title: String,
}

impl TagForm {
    pub fn check(&mut self) -> FieldErrors {
        self.title = self.title.trim().to_string();
        match self.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => collect(&e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_is_required() {
        let mut form = TagForm::default();
        assert!(form.check().contains_key("title"));
        let mut form = TagForm { title: " vegan ".into() };
        assert!(form.check().is_empty());
        assert_eq!(form.title, "vegan");
    }
}
