use serde::Serialize;

use super::repo_types::Comment;

#[derive(Serialize)]
pub struct CommentDeletePage {
    pub comment: Comment,
}
