use serde::{Deserialize, Serialize};
use time::Time;
use uuid::Uuid;
use validator::Validate;

use super::repo_types::Recipe;
use crate::{
    forms::{collect, format_time, optional, parse_id, parse_non_negative, parse_time, FieldErrors},
    tags::{repo_types::Tag, transformer::TagsTransformer},
};

/// Raw recipe input as submitted. Every field arrives as text.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct RecipeForm {
    #[serde(default)]
    #[validate(length(min = 3, max = 64, message = "Title must be between 3 and 64 characters"))]
    pub title: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    #[validate(length(max = 64, message = "Difficulty must be at most 64 characters"))]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub calories: Option<String>,
    #[serde(default)]
    pub portion: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    #[validate(length(max = 128, message = "Tags must be at most 128 characters"))]
    pub tags: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

/// Typed recipe values. `tags` is still the free-text list.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeData {
    pub title: String,
    pub category_id: Uuid,
    pub difficulty: Option<String>,
    pub calories: Option<i32>,
    pub portion: Option<i32>,
    pub time: Option<Time>,
    pub tags: String,
    pub content: Option<String>,
}

impl RecipeForm {
    pub fn from_recipe(recipe: &Recipe) -> Self {
        Self {
            title: recipe.title.clone(),
            category: recipe.category_id.to_string(),
            difficulty: recipe.difficulty.clone(),
            calories: recipe.calories.map(|n| n.to_string()),
            portion: recipe.portion.map(|n| n.to_string()),
            time: recipe.time.map(format_time),
            tags: Some(TagsTransformer::transform(&recipe.tags)),
            content: recipe.content.clone(),
        }
    }

    /// Normalizes the input and converts it, collecting every field error.
    pub fn bind(&mut self) -> Result<RecipeData, FieldErrors> {
        self.title = self.title.trim().to_string();
        self.difficulty = optional(&self.difficulty);
        self.tags = optional(&self.tags);
        self.content = optional(&self.content);

        let mut errors = match self.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => collect(&e),
        };
        let category_id = parse_id(&mut errors, "category", &self.category);
        let calories = parse_non_negative(&mut errors, "calories", &self.calories);
        let portion = parse_non_negative(&mut errors, "portion", &self.portion);
        let time = parse_time(&mut errors, "time", &self.time);

        match category_id {
            Some(category_id) if errors.is_empty() => Ok(RecipeData {
                title: self.title.clone(),
                category_id,
                difficulty: self.difficulty.clone(),
                calories,
                portion,
                time,
                tags: self.tags.clone().unwrap_or_default(),
                content: self.content.clone(),
            }),
            _ => Err(errors),
        }
    }
}

impl RecipeData {
    pub fn apply(self, recipe: &mut Recipe, tags: Vec<Tag>) {
        recipe.title = self.title;
        recipe.category_id = self.category_id;
        recipe.difficulty = self.difficulty;
        recipe.calories = self.calories;
        recipe.portion = self.portion;
        recipe.time = self.time;
        recipe.content = self.content;
        recipe.tags = tags;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> RecipeForm {
        RecipeForm {
            title: " Pasta ".into(),
            category: Uuid::new_v4().to_string(),
            difficulty: Some("".into()),
            calories: Some("450".into()),
            portion: Some("2".into()),
            time: Some("00:30".into()),
            tags: Some("quick,easy".into()),
            content: Some("Boil water.".into()),
        }
    }

    #[test]
    fn binds_valid_input() {
        let mut form = valid();
        let data = form.bind().unwrap();
        assert_eq!(data.title, "Pasta");
        assert_eq!(data.difficulty, None);
        assert_eq!(data.calories, Some(450));
        assert_eq!(data.portion, Some(2));
        assert_eq!(data.time.map(format_time).as_deref(), Some("00:30"));
        assert_eq!(data.tags, "quick,easy");
    }

    #[test]
    fn reports_every_invalid_field() {
        let mut form = RecipeForm {
            title: "Pa".into(),
            category: "".into(),
            calories: Some("-5".into()),
            time: Some("soon".into()),
            tags: Some("x".repeat(129)),
            ..RecipeForm::default()
        };
        let errors = form.bind().unwrap_err();
        for field in ["title", "category", "calories", "time", "tags"] {
            assert!(errors.contains_key(field), "missing error for {field}");
        }
        assert!(!errors.contains_key("portion"));
    }

    #[test]
    fn populated_form_shows_the_recipe() {
        let mut recipe = Recipe::new("Pasta", Uuid::new_v4(), None);
        recipe.calories = Some(300);
        recipe.tags = vec![Tag::new("easy"), Tag::new("quick")];
        let form = RecipeForm::from_recipe(&recipe);
        assert_eq!(form.calories.as_deref(), Some("300"));
        assert_eq!(form.tags.as_deref(), Some("easy, quick"));
        assert_eq!(form.category, recipe.category_id.to_string());
    }
}
