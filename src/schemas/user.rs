use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::User;
use crate::db::types::UserRole;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct UserCreate {
    #[validate(length(min = 1, max = 200, message = "name must be 1-200 characters"))]
    pub(crate) name: String,
    #[validate(email(message = "email must be a valid address"))]
    pub(crate) email: String,
    #[serde(default = "default_user_role")]
    pub(crate) role: UserRole,
}

#[derive(Debug, Serialize)]
pub(crate) struct UserResponse {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) role: UserRole,
    pub(crate) created_at: String,
}

impl UserResponse {
    pub(crate) fn from_db(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            created_at: format_primitive(user.created_at),
        }
    }
}

fn default_user_role() -> UserRole {
    UserRole::Student
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn registration_requires_valid_email() {
        let payload: UserCreate =
            serde_json::from_value(json!({"name": "Kai", "email": "not-an-email"}))
                .expect("deserialize");
        assert!(payload.validate().is_err());

        let payload: UserCreate =
            serde_json::from_value(json!({"name": "Kai", "email": "kai@example.com"}))
                .expect("deserialize");
        assert!(payload.validate().is_ok());
        assert_eq!(payload.role, UserRole::Student);
    }
}
