use serde::Deserialize;
use validator::Validate;

use crate::forms::{collect, FieldErrors};

/// Password change of the signed-in account.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct EditUserForm {
    #[serde(default)]
    #[validate(length(min = 6, max = 4096, message = "Password must be between 6 and 4096 characters"))]
    pub password: String,
}

impl EditUserForm {
    pub fn check(&self) -> FieldErrors {
        match self.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => collect(&e),
        }
    }
}

/// An unchecked checkbox is simply missing from the submission.
#[derive(Debug, Default, Deserialize)]
pub struct RolesForm {
    #[serde(default)]
    pub admin: Option<String>,
}

impl RolesForm {
    pub fn wants_admin(&self) -> bool {
        matches!(
            self.admin.as_deref().map(str::trim),
            Some("on" | "1" | "true" | "yes")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_length_is_checked() {
        assert!(EditUserForm { password: "12345".into() }.check().contains_key("password"));
        assert!(EditUserForm { password: "123456".into() }.check().is_empty());
    }

    #[test]
    fn admin_checkbox() {
        assert!(RolesForm { admin: Some("on".into()) }.wants_admin());
        assert!(!RolesForm { admin: None }.wants_admin());
        assert!(!RolesForm { admin: Some("".into()) }.wants_admin());
    }
}
