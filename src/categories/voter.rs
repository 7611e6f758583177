use super::repo_types::Category;
use crate::voter::{Action, AdminOnlyVoter};

pub type CategoryVoter = AdminOnlyVoter<Category>;

pub const CATEGORY_VOTER: CategoryVoter =
    AdminOnlyVoter::new(&[Action::Create, Action::Edit, Action::Delete]);
