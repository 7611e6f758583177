use serde::Serialize;

use crate::{
    auth::{
        dto::PublicUser,
        repo_types::{User, UserRole},
    },
    forms::FieldErrors,
    pagination::Page,
};

#[derive(Serialize)]
pub struct UserEditPage {
    pub user: PublicUser,
    pub errors: FieldErrors,
}

#[derive(Serialize)]
pub struct UserIndex {
    pub pagination: Page<PublicUser>,
}

#[derive(Serialize)]
pub struct RoleChoice {
    pub role: UserRole,
    pub label: &'static str,
    pub granted: bool,
}

#[derive(Serialize)]
pub struct RolesPage {
    pub user: PublicUser,
    pub roles: Vec<RoleChoice>,
}

impl RolesPage {
    pub fn new(user: &User) -> Self {
        let roles = [UserRole::User, UserRole::Admin]
            .into_iter()
            .map(|role| RoleChoice {
                role,
                label: role.label(),
                granted: user.has_role(role),
            })
            .collect();
        Self {
            user: PublicUser::from(user),
            roles,
        }
    }
}
