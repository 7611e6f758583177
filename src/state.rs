use std::sync::Arc;

use sqlx::PgPool;
use tracing::warn;

use crate::{
    auth::repo::{PgUserRepository, UserRepository},
    categories::repo::{CategoryRepository, PgCategoryRepository},
    comments::repo::{CommentRepository, PgCommentRepository},
    config::AppConfig,
    db::{self, memory::MemoryStore},
    recipes::repo::{PgRecipeRepository, RecipeRepository},
    tags::repo::{PgTagRepository, TagRepository},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub tags: Arc<dyn TagRepository>,
    pub recipes: Arc<dyn RecipeRepository>,
    pub comments: Arc<dyn CommentRepository>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        match config.database_url.clone() {
            Some(url) => {
                let db = db::connect(&url).await?;
                db::migrate(&db).await?;
                Ok(Self::from_pool(db, config))
            }
            None => {
                warn!("DATABASE_URL not set; data lives in memory and is lost on exit");
                Ok(Self::in_memory(config))
            }
        }
    }

    pub fn from_pool(db: PgPool, config: Arc<AppConfig>) -> Self {
        Self {
            config,
            users: Arc::new(PgUserRepository::new(db.clone())),
            categories: Arc::new(PgCategoryRepository::new(db.clone())),
            tags: Arc::new(PgTagRepository::new(db.clone())),
            recipes: Arc::new(PgRecipeRepository::new(db.clone())),
            comments: Arc::new(PgCommentRepository::new(db)),
        }
    }

    pub fn in_memory(config: Arc<AppConfig>) -> Self {
        let store = MemoryStore::default();
        Self {
            config,
            users: Arc::new(store.clone()),
            categories: Arc::new(store.clone()),
            tags: Arc::new(store.clone()),
            recipes: Arc::new(store.clone()),
            comments: Arc::new(store),
        }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        let config = Arc::new(AppConfig {
            database_url: None,
            jwt: crate::config::JwtConfig {
                secret: "test".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 5,
                refresh_ttl_minutes: 60,
            },
            host: "127.0.0.1".into(),
            port: 0,
            admin: None,
        });
        Self::in_memory(config)
    }
}
