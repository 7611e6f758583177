use super::repo_types::Recipe;
use crate::{
    auth::repo_types::User,
    voter::{Action, Voter},
};

/// Anyone signed in may add a recipe; only its author or an administrator
/// may change or remove it.
pub struct RecipeVoter;

impl Voter for RecipeVoter {
    type Subject = Recipe;

    fn supports(&self, action: Action) -> bool {
        matches!(action, Action::Create | Action::Edit | Action::Delete)
    }

    fn vote(&self, action: Action, subject: Option<&Recipe>, user: &User) -> bool {
        match action {
            Action::Create => true,
            Action::Edit | Action::Delete => {
                user.is_admin() || subject.is_some_and(|r| r.is_authored_by(user.id))
            }
            Action::View => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth::repo_types::UserRole, voter::is_granted};
    use uuid::Uuid;

    fn user(roles: &[UserRole]) -> User {
        User::new("cook@example.com", "cook", String::new(), roles)
    }

    #[test]
    fn author_and_admin_may_edit() {
        let author = user(&[UserRole::User]);
        let stranger = user(&[UserRole::User]);
        let admin = user(&[UserRole::User, UserRole::Admin]);
        let recipe = Recipe::new("Pasta", Uuid::new_v4(), Some(author.id));

        for action in [Action::Edit, Action::Delete] {
            assert!(is_granted(&RecipeVoter, action, Some(&recipe), &author));
            assert!(is_granted(&RecipeVoter, action, Some(&recipe), &admin));
            assert!(!is_granted(&RecipeVoter, action, Some(&recipe), &stranger));
        }
        assert!(is_granted(&RecipeVoter, Action::Create, None, &stranger));
    }

    #[test]
    fn authorless_recipe_is_admin_only() {
        let recipe = Recipe::new("Soup", Uuid::new_v4(), None);
        assert!(!is_granted(&RecipeVoter, Action::Edit, Some(&recipe), &user(&[UserRole::User])));
    }
}
