//! Authorization predicates evaluated per action, subject and principal.

use crate::{auth::repo_types::User, error::AppError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    View,
    Create,
    Edit,
    Delete,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::View => "VIEW",
            Action::Create => "CREATE",
            Action::Edit => "EDIT",
            Action::Delete => "DELETE",
        }
    }
}

pub trait Voter {
    type Subject;

    fn supports(&self, action: Action) -> bool;

    /// `subject` is `None` for actions on a not-yet-existing entity.
    fn vote(&self, action: Action, subject: Option<&Self::Subject>, user: &User) -> bool;
}

pub fn is_granted<V: Voter>(
    voter: &V,
    action: Action,
    subject: Option<&V::Subject>,
    user: &User,
) -> bool {
    voter.supports(action) && voter.vote(action, subject, user)
}

pub fn deny_unless_granted<V: Voter>(
    voter: &V,
    action: Action,
    subject: Option<&V::Subject>,
    user: &User,
) -> Result<(), AppError> {
    if is_granted(voter, action, subject, user) {
        Ok(())
    } else {
        tracing::warn!(user_id = %user.id, action = action.as_str(), "vote denied");
        Err(AppError::Forbidden)
    }
}

/// Grants the supported actions to administrators only.
pub struct AdminOnlyVoter<T> {
    actions: &'static [Action],
    _subject: std::marker::PhantomData<fn(&T)>,
}

impl<T> AdminOnlyVoter<T> {
    pub const fn new(actions: &'static [Action]) -> Self {
        Self {
            actions,
            _subject: std::marker::PhantomData,
        }
    }
}

impl<T> Voter for AdminOnlyVoter<T> {
    type Subject = T;

    fn supports(&self, action: Action) -> bool {
        self.actions.contains(&action)
    }

    fn vote(&self, _action: Action, _subject: Option<&T>, user: &User) -> bool {
        user.is_admin()
    }
}
