use sqlx::SqlitePool;
use uuid::Uuid;

use crate::core::config::ImportSettings;
use crate::core::time::primitive_now_utc;
use crate::db::models::User;
use crate::db::types::UserRole;
use crate::repositories::{self, StoreError};

/// Looks up the configured default user by email and creates it when missing.
/// Headless imports attach their documents to this user.
pub(crate) async fn ensure_default_user(
    pool: &SqlitePool,
    settings: &ImportSettings,
) -> anyhow::Result<User> {
    let email = &settings.default_user_email;
    if let Some(user) = repositories::users::find_by_email(pool, email).await? {
        tracing::debug!(user_id = %user.id, "Default user already present");
        return Ok(user);
    }

    let created = repositories::users::create(
        pool,
        repositories::users::CreateUser {
            id: &Uuid::new_v4().to_string(),
            name: &settings.default_user_name,
            email,
            role: UserRole::Student,
            created_at: primitive_now_utc(),
        },
    )
    .await;

    match created {
        Ok(user) => {
            tracing::info!(user_id = %user.id, email = %user.email, "Created default user");
            Ok(user)
        }
        // Another process created it between the lookup and the insert.
        Err(StoreError::DuplicateEmail(_)) => repositories::users::find_by_email(pool, email)
            .await?
            .ok_or_else(|| anyhow::anyhow!("default user {email} vanished after creation")),
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Settings;
    use crate::test_support;

    #[tokio::test]
    async fn default_user_is_created_once() {
        let pool = test_support::memory_pool().await;
        let settings = Settings::for_tests("sqlite::memory:");

        let first = ensure_default_user(&pool, settings.import()).await.expect("first");
        let second = ensure_default_user(&pool, settings.import()).await.expect("second");

        assert_eq!(first.id, second.id);
        assert_eq!(first.email, settings.import().default_user_email);
        assert_eq!(repositories::users::list(&pool).await.expect("list").len(), 1);
    }
}
