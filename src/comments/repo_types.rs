use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
pub struct Comment {
    pub id: Uuid,
    pub recipe_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Comment {
    pub fn new(recipe_id: Uuid, author_id: Uuid, content: &str) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: Uuid::new_v4(),
            recipe_id,
            author_id,
            content: content.to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}
