use sqlx::{SqliteConnection, SqlitePool};
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::db::models::RevisionQueueEntry;

const COLUMNS: &str = "id, user_id, question_id, fail_count, last_failed_at, next_review_at";

/// Adds a failed question to the user's queue, or bumps `fail_count` when the
/// same question has failed before. `next_review_at` is never computed here.
pub(crate) async fn record_failure(
    conn: &mut SqliteConnection,
    user_id: &str,
    question_id: &str,
    failed_at: PrimitiveDateTime,
) -> Result<RevisionQueueEntry, sqlx::Error> {
    let existing = sqlx::query_scalar::<_, String>(
        "SELECT id FROM revision_queue WHERE user_id = $1 AND question_id = $2 LIMIT 1",
    )
    .bind(user_id)
    .bind(question_id)
    .fetch_optional(&mut *conn)
    .await?;

    match existing {
        Some(entry_id) => {
            sqlx::query_as::<_, RevisionQueueEntry>(&format!(
                "UPDATE revision_queue
                 SET fail_count = fail_count + 1,
                     last_failed_at = $1
                 WHERE id = $2
                 RETURNING {COLUMNS}"
            ))
            .bind(failed_at)
            .bind(entry_id)
            .fetch_one(&mut *conn)
            .await
        }
        None => {
            sqlx::query_as::<_, RevisionQueueEntry>(&format!(
                "INSERT INTO revision_queue (id, user_id, question_id, fail_count, last_failed_at)
                 VALUES ($1,$2,$3,1,$4)
                 RETURNING {COLUMNS}"
            ))
            .bind(Uuid::new_v4().to_string())
            .bind(user_id)
            .bind(question_id)
            .bind(failed_at)
            .fetch_one(&mut *conn)
            .await
        }
    }
}

pub(crate) async fn list_for_user(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Vec<RevisionQueueEntry>, sqlx::Error> {
    sqlx::query_as::<_, RevisionQueueEntry>(&format!(
        "SELECT {COLUMNS}
         FROM revision_queue
         WHERE user_id = $1
         ORDER BY fail_count DESC, last_failed_at DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}
