use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum UserRole {
    #[serde(rename = "ROLE_USER")]
    User,
    #[serde(rename = "ROLE_ADMIN")]
    Admin,
}

impl UserRole {
    pub fn as_str(self) -> &'static str {
        match self {
            UserRole::User => "ROLE_USER",
            UserRole::Admin => "ROLE_ADMIN",
        }
    }

    /// Translation key shown next to the role.
    pub fn label(self) -> &'static str {
        match self {
            UserRole::User => "label.role_user",
            UserRole::Admin => "label.role_admin",
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ROLE_USER" => Ok(UserRole::User),
            "ROLE_ADMIN" => Ok(UserRole::Admin),
            other => anyhow::bail!("unknown role {other}"),
        }
    }
}

/// User record in the database.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 hash, not exposed in JSON
    pub roles: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl User {
    pub fn new(email: &str, username: &str, password_hash: String, roles: &[UserRole]) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.to_string(),
            username: username.to_string(),
            password_hash,
            roles: roles.iter().map(|r| r.as_str().to_string()).collect(),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    pub fn has_role(&self, role: UserRole) -> bool {
        self.roles.iter().any(|r| r == role.as_str())
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(UserRole::Admin)
    }

    pub fn grant(&mut self, role: UserRole) {
        if !self.has_role(role) {
            self.roles.push(role.as_str().to_string());
        }
    }

    pub fn revoke(&mut self, role: UserRole) {
        self.roles.retain(|r| r != role.as_str());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_string_form_round_trips_through_from_str() {
        assert_eq!("ROLE_ADMIN".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert!("ROLE_SUPER_ADMIN".parse::<UserRole>().is_err());
        assert_eq!(UserRole::User.label(), "label.role_user");
    }

    #[test]
    fn grant_and_revoke_keep_roles_unique() {
        let mut user = User::new("a@example.com", "alice", String::new(), &[UserRole::User]);
        user.grant(UserRole::Admin);
        user.grant(UserRole::Admin);
        assert_eq!(user.roles, vec!["ROLE_USER", "ROLE_ADMIN"]);
        assert!(user.is_admin());
        user.revoke(UserRole::Admin);
        assert!(!user.is_admin());
        assert!(user.has_role(UserRole::User));
    }

    #[test]
    fn password_hash_is_not_serialized() {
        let user = User::new("a@example.com", "alice", "secret-hash".into(), &[UserRole::User]);
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret-hash"));
        assert!(json.contains("ROLE_USER"));
    }
}
