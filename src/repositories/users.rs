use sqlx::SqlitePool;
use time::PrimitiveDateTime;

use crate::db::models::User;
use crate::db::types::UserRole;
use crate::repositories::StoreError;

const COLUMNS: &str = "id, name, email, role, created_at";

pub(crate) async fn find_by_id(
    executor: impl sqlx::SqliteExecutor<'_>,
    id: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub(crate) async fn find_by_email(
    executor: impl sqlx::SqliteExecutor<'_>,
    email: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE email = $1"))
        .bind(email)
        .fetch_optional(executor)
        .await
}

pub(crate) async fn list(pool: &SqlitePool) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users ORDER BY created_at, id"))
        .fetch_all(pool)
        .await
}

pub(crate) struct CreateUser<'a> {
    pub(crate) id: &'a str,
    pub(crate) name: &'a str,
    pub(crate) email: &'a str,
    pub(crate) role: UserRole,
    pub(crate) created_at: PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::SqliteExecutor<'_>,
    params: CreateUser<'_>,
) -> Result<User, StoreError> {
    sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (id, name, email, role, created_at)
         VALUES ($1,$2,$3,$4,$5)
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.name)
    .bind(params.email)
    .bind(params.role)
    .bind(params.created_at)
    .fetch_one(executor)
    .await
    .map_err(|err| match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            StoreError::DuplicateEmail(params.email.to_string())
        }
        _ => StoreError::Database(err),
    })
}

pub(crate) async fn delete(pool: &SqlitePool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::primitive_now_utc;
    use crate::test_support;

    #[tokio::test]
    async fn duplicate_email_is_a_typed_failure() {
        let pool = test_support::memory_pool().await;
        test_support::insert_user(&pool, "Ada", "ada@example.com").await;

        let err = create(
            &pool,
            CreateUser {
                id: "second",
                name: "Ada Again",
                email: "ada@example.com",
                role: UserRole::Teacher,
                created_at: primitive_now_utc(),
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, StoreError::DuplicateEmail(ref email) if email == "ada@example.com"));
        assert_eq!(list(&pool).await.expect("list users").len(), 1);
    }

    #[tokio::test]
    async fn deleting_user_cascades_to_documents() {
        let pool = test_support::memory_pool().await;
        let user = test_support::insert_user(&pool, "Grace", "grace@example.com").await;
        let document = test_support::insert_document(&pool, &user.id).await;

        assert!(delete(&pool, &user.id).await.expect("delete user"));
        let found = crate::repositories::documents::find_by_id(&pool, &document.id)
            .await
            .expect("find document");
        assert!(found.is_none());
    }
}
