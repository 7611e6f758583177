//! Converts between a recipe's tags and the comma separated text field
//! used to edit them.

use tracing::debug;

use super::{repo_types::Tag, services::TagService};

pub struct TagsTransformer<'a> {
    tags: &'a TagService,
}

impl<'a> TagsTransformer<'a> {
    pub fn new(tags: &'a TagService) -> Self {
        Self { tags }
    }

    pub fn transform(tags: &[Tag]) -> String {
        tags.iter()
            .map(|t| t.title.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Trimmed, non-empty titles in input order, without duplicates.
    pub fn split(input: &str) -> Vec<String> {
        let mut titles: Vec<String> = Vec::new();
        for title in input.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            if !titles.iter().any(|t| t == title) {
                titles.push(title.to_string());
            }
        }
        titles
    }

    /// Resolves each title to an existing tag. Unknown titles become new,
    /// unsaved tags; the recipe repository stores them together with the
    /// recipe.
    pub async fn reverse_transform(&self, input: &str) -> anyhow::Result<Vec<Tag>> {
        let mut out = Vec::new();
        for title in Self::split(input) {
            let tag = match self.tags.find_one_by_title(&title).await? {
                Some(tag) => tag,
                None => {
                    debug!(title = %title, "new tag from recipe form");
                    Tag::new(&title)
                }
            };
            out.push(tag);
        }
        Ok(out)
    }
}
