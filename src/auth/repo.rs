use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{User, UserRole};
use crate::{
    db::write_error,
    pagination::{Page, PageRequest},
};

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// All accounts, newest first.
    async fn query_all(&self, page: PageRequest) -> anyhow::Result<Page<User>>;
    async fn find_one_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    async fn find_one_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn count_by_role(&self, role: UserRole) -> anyhow::Result<i64>;
    /// Takes `role` away from the account unless it is the last holder.
    /// Returns `false` when refused. Count and update happen atomically.
    async fn revoke_role_unless_last(&self, id: Uuid, role: UserRole) -> anyhow::Result<bool>;
    /// Inserts or updates the account. Emails are unique.
    async fn save(&self, user: &User) -> anyhow::Result<()>;
    async fn upgrade_password(&self, id: Uuid, password_hash: &str) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct PgUserRepository {
    db: PgPool,
}

impl PgUserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn query_all(&self, page: PageRequest) -> anyhow::Result<Page<User>> {
        let rows = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, username, password_hash, roles, created_at
            FROM users
            ORDER BY created_at DESC, id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.db)
        .await
        .context("list users")?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.db)
            .await
            .context("count users")?;

        Ok(Page::new(rows, page, total))
    }

    async fn find_one_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, username, password_hash, roles, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    async fn find_one_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, username, password_hash, roles, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    async fn count_by_role(&self, role: UserRole) -> anyhow::Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE $1 = ANY(roles)")
            .bind(role.as_str())
            .fetch_one(&self.db)
            .await
            .context("count users by role")?;
        Ok(count)
    }

    async fn revoke_role_unless_last(&self, id: Uuid, role: UserRole) -> anyhow::Result<bool> {
        let mut tx = self.db.begin().await.context("begin tx")?;
        // Row locks serialize concurrent revocations of the same role.
        let holders: Vec<Uuid> = sqlx::query_scalar(
            "SELECT id FROM users WHERE $1 = ANY(roles) ORDER BY id FOR UPDATE",
        )
        .bind(role.as_str())
        .fetch_all(&mut *tx)
        .await
        .context("lock role holders")?;

        if !holders.contains(&id) {
            tx.commit().await.context("commit tx")?;
            return Ok(true);
        }
        if holders.len() <= 1 {
            tx.rollback().await.context("rollback tx")?;
            return Ok(false);
        }

        sqlx::query("UPDATE users SET roles = array_remove(roles, $2) WHERE id = $1")
            .bind(id)
            .bind(role.as_str())
            .execute(&mut *tx)
            .await
            .context("revoke role")?;
        tx.commit().await.context("commit tx")?;
        Ok(true)
    }

    async fn save(&self, user: &User) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, username, password_hash, roles, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE
               SET email = EXCLUDED.email,
                   username = EXCLUDED.username,
                   password_hash = EXCLUDED.password_hash,
                   roles = EXCLUDED.roles
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.roles)
        .bind(user.created_at)
        .execute(&self.db)
        .await
        .map_err(|e| write_error(e, "save user"))?;
        Ok(())
    }

    async fn upgrade_password(&self, id: Uuid, password_hash: &str) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.db)
            .await
            .context("upgrade password")?;
        Ok(())
    }
}
