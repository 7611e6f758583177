use super::repo_types::Comment;
use crate::{
    auth::repo_types::User,
    voter::{Action, Voter},
};

pub struct CommentVoter;

impl Voter for CommentVoter {
    type Subject = Comment;

    fn supports(&self, action: Action) -> bool {
        matches!(action, Action::Create | Action::Delete)
    }

    fn vote(&self, action: Action, subject: Option<&Comment>, user: &User) -> bool {
        match action {
            Action::Create => true,
            Action::Delete => user.is_admin() || subject.is_some_and(|c| c.author_id == user.id),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth::repo_types::UserRole, voter::is_granted};
    use uuid::Uuid;

    #[test]
    fn only_author_or_admin_may_delete() {
        let author = User::new("a@example.com", "author", String::new(), &[UserRole::User]);
        let other = User::new("o@example.com", "other", String::new(), &[UserRole::User]);
        let admin = User::new("x@example.com", "admin", String::new(), &[UserRole::Admin]);
        let comment = Comment::new(Uuid::new_v4(), author.id, "Nice");

        assert!(is_granted(&CommentVoter, Action::Delete, Some(&comment), &author));
        assert!(is_granted(&CommentVoter, Action::Delete, Some(&comment), &admin));
        assert!(!is_granted(&CommentVoter, Action::Delete, Some(&comment), &other));
        assert!(!is_granted(&CommentVoter, Action::Edit, Some(&comment), &admin));
    }
}
