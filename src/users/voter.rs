use crate::{
    auth::repo_types::User,
    voter::{Action, AdminOnlyVoter},
};

/// Listing accounts and changing their roles.
pub type UserVoter = AdminOnlyVoter<User>;

pub const USER_VOTER: UserVoter = AdminOnlyVoter::new(&[Action::View, Action::Edit]);
