use serde::{Serialize, Serializer};
use sqlx::FromRow;
use time::{OffsetDateTime, Time};
use uuid::Uuid;

use crate::{forms::format_time, tags::repo_types::Tag};

#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
pub struct Recipe {
    pub id: Uuid,
    pub title: String,
    pub category_id: Uuid,
    pub author_id: Option<Uuid>,
    /// Preparation time.
    #[serde(serialize_with = "serialize_hhmm")]
    pub time: Option<Time>,
    pub difficulty: Option<String>,
    pub portion: Option<i32>,
    pub calories: Option<i32>,
    pub content: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    #[sqlx(skip)]
    pub tags: Vec<Tag>,
}

impl Recipe {
    pub fn new(title: &str, category_id: Uuid, author_id: Option<Uuid>) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: Uuid::new_v4(),
            title: title.to_string(),
            category_id,
            author_id,
            time: None,
            difficulty: None,
            portion: None,
            calories: None,
            content: None,
            created_at: now,
            updated_at: now,
            tags: Vec::new(),
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = OffsetDateTime::now_utc();
    }

    pub fn is_authored_by(&self, user_id: Uuid) -> bool {
        self.author_id == Some(user_id)
    }
}

fn serialize_hhmm<S: Serializer>(time: &Option<Time>, s: S) -> Result<S::Ok, S::Error> {
    match time {
        Some(t) => s.serialize_some(&format_time(*t)),
        None => s.serialize_none(),
    }
}

/// Exact-match filter over the recipe relations. Empty matches everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecipeCriteria {
    pub category_id: Option<Uuid>,
    pub tag_id: Option<Uuid>,
    pub author_id: Option<Uuid>,
}

impl RecipeCriteria {
    pub fn by_category(category_id: Uuid) -> Self {
        Self {
            category_id: Some(category_id),
            ..Self::default()
        }
    }

    pub fn matches(&self, recipe: &Recipe) -> bool {
        self.category_id.map_or(true, |c| recipe.category_id == c)
            && self.author_id.map_or(true, |a| recipe.author_id == Some(a))
            && self
                .tag_id
                .map_or(true, |t| recipe.tags.iter().any(|tag| tag.id == t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_serializes_as_hours_and_minutes() {
        let mut recipe = Recipe::new("Pasta", Uuid::new_v4(), None);
        recipe.time = Some(Time::from_hms(0, 45, 0).unwrap());
        let json = serde_json::to_value(&recipe).unwrap();
        assert_eq!(json["time"], "00:45");
        assert!(json["created_at"].as_str().is_some());
    }

    #[test]
    fn criteria_match_every_given_relation() {
        let category = Uuid::new_v4();
        let author = Uuid::new_v4();
        let mut recipe = Recipe::new("Pasta", category, Some(author));
        let tag = Tag::new("quick");
        recipe.tags.push(tag.clone());

        assert!(RecipeCriteria::default().matches(&recipe));
        assert!(RecipeCriteria::by_category(category).matches(&recipe));
        assert!(!RecipeCriteria::by_category(Uuid::new_v4()).matches(&recipe));
        let both = RecipeCriteria {
            tag_id: Some(tag.id),
            author_id: Some(author),
            ..RecipeCriteria::default()
        };
        assert!(both.matches(&recipe));
        let other_author = RecipeCriteria {
            author_id: Some(Uuid::new_v4()),
            ..RecipeCriteria::default()
        };
        assert!(!other_author.matches(&recipe));
    }
}
