use super::repo_types::Tag;
use crate::voter::{Action, AdminOnlyVoter};

pub type TagVoter = AdminOnlyVoter<Tag>;

pub const TAG_VOTER: TagVoter = AdminOnlyVoter::new(&[Action::Create, Action::Edit, Action::Delete]);
