use std::sync::Arc;

use axum::extract::FromRef;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    password::{hash_password, verify_password},
    repo::UserRepository,
    repo_types::{User, UserRole},
};
use crate::{
    config::AdminSeed,
    db::is_unique_violation,
    error::AppError,
    pagination::{Page, PageRequest, PAGINATOR_ITEMS_PER_PAGE},
    state::AppState,
};

pub const MIN_PASSWORD_LEN: usize = 8;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex =
            Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex is valid");
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Outcome of a role change request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleChange {
    Applied,
    /// Refused: the account is the only administrator left.
    LastAdmin,
}

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
}

impl FromRef<AppState> for UserService {
    fn from_ref(state: &AppState) -> Self {
        Self {
            users: state.users.clone(),
        }
    }
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    pub async fn paginated_list(&self, page: i64) -> anyhow::Result<Page<User>> {
        self.users
            .query_all(PageRequest::new(page, PAGINATOR_ITEMS_PER_PAGE))
            .await
    }

    pub async fn find_one_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        self.users.find_one_by_id(id).await
    }

    /// Creates a `ROLE_USER` account. Signup never grants anything else.
    pub async fn register(
        &self,
        email: &str,
        username: &str,
        password: &str,
    ) -> Result<User, AppError> {
        let email = normalize_email(email);
        let username = username.trim();

        if !is_valid_email(&email) {
            warn!(email = %email, "invalid email");
            return Err(AppError::BadRequest("Invalid email".into()));
        }
        let username_len = username.chars().count();
        if !(3..=64).contains(&username_len) {
            return Err(AppError::BadRequest(
                "Username must be between 3 and 64 characters".into(),
            ));
        }
        if password.len() < MIN_PASSWORD_LEN {
            warn!("password too short");
            return Err(AppError::BadRequest("Password too short".into()));
        }

        if self.users.find_one_by_email(&email).await?.is_some() {
            warn!(email = %email, "email already registered");
            return Err(AppError::Conflict("Email already registered".into()));
        }

        let hash = hash_password(password)?;
        let user = User::new(&email, username, hash, &[UserRole::User]);
        if let Err(err) = self.users.save(&user).await {
            if !is_unique_violation(&err) {
                return Err(err.into());
            }
            warn!(email = %email, "email registered concurrently");
            return Err(AppError::Conflict("Email already registered".into()));
        }

        info!(user_id = %user.id, email = %user.email, "user registered");
        Ok(user)
    }

    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, AppError> {
        let email = normalize_email(email);
        if !is_valid_email(&email) {
            warn!(email = %email, "invalid email");
            return Err(AppError::BadRequest("Invalid email".into()));
        }

        let Some(user) = self.users.find_one_by_email(&email).await? else {
            warn!(email = %email, "login unknown email");
            return Err(AppError::Unauthorized("Invalid credentials".into()));
        };

        if !verify_password(password, &user.password_hash)? {
            warn!(email = %email, user_id = %user.id, "login invalid password");
            return Err(AppError::Unauthorized("Invalid credentials".into()));
        }

        info!(user_id = %user.id, "user logged in");
        Ok(user)
    }

    pub async fn change_password(&self, user: &User, password: &str) -> anyhow::Result<()> {
        let hash = hash_password(password)?;
        self.users.upgrade_password(user.id, &hash).await?;
        info!(user_id = %user.id, "password changed");
        Ok(())
    }

    /// Grants or revokes `ROLE_ADMIN`. The last administrator keeps the role.
    pub async fn set_admin(&self, user: &mut User, admin: bool) -> anyhow::Result<RoleChange> {
        if admin {
            user.grant(UserRole::Admin);
            self.users.save(user).await?;
        } else {
            if !self
                .users
                .revoke_role_unless_last(user.id, UserRole::Admin)
                .await?
            {
                warn!(user_id = %user.id, "refusing to demote the last administrator");
                return Ok(RoleChange::LastAdmin);
            }
            user.revoke(UserRole::Admin);
        }
        info!(user_id = %user.id, roles = ?user.roles, "roles updated");
        Ok(RoleChange::Applied)
    }

    /// Makes sure at least one administrator exists, creating or promoting
    /// the seeded account when none does.
    pub async fn ensure_admin(&self, seed: &AdminSeed) -> anyhow::Result<()> {
        if self.users.count_by_role(UserRole::Admin).await? > 0 {
            return Ok(());
        }

        let email = normalize_email(&seed.email);
        anyhow::ensure!(is_valid_email(&email), "ADMIN_EMAIL is not a valid email");

        let mut user = match self.users.find_one_by_email(&email).await? {
            Some(user) => user,
            None => {
                anyhow::ensure!(
                    seed.password.len() >= MIN_PASSWORD_LEN,
                    "ADMIN_PASSWORD is too short"
                );
                let hash = hash_password(&seed.password)?;
                User::new(&email, &seed.username, hash, &[UserRole::User])
            }
        };
        user.grant(UserRole::Admin);
        self.users.save(&user).await?;
        info!(user_id = %user.id, email = %user.email, "administrator bootstrapped");
        Ok(())
    }
}
