use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::{
    error::Error,
    model::{HistoryRow, UserId},
};

use super::error::DatabaseError;

#[tracing::instrument(name = "upsert history", skip(pool))]
pub async fn upsert_history(
    pool: &PgPool,
    user_id: UserId,
    movie_id: &str,
    clicked_at: DateTime<Utc>,
) -> Result<(), Error> {
    sqlx::query(
        r#"
        INSERT INTO history
            (user_id, movie_id, clicked_at)
        VALUES
            ($1, $2, $3)
        ON CONFLICT (user_id, movie_id)
        DO UPDATE SET
            clicked_at = EXCLUDED.clicked_at;
    "#,
    )
    .bind(user_id)
    .bind(movie_id)
    .bind(clicked_at)
    .execute(pool)
    .await
    .map_err(DatabaseError::DatabaseError)?;

    Ok(())
}

#[tracing::instrument(name = "get user history", skip(pool))]
pub async fn get_user_history(
    pool: &PgPool,
    user_id: UserId,
    limit: i64,
) -> Result<Vec<HistoryRow>, Error> {
    let history = sqlx::query_as::<_, HistoryRow>(
        r#"
        SELECT
            user_id, movie_id::text AS movie_id, clicked_at
        FROM
            history
        WHERE
            user_id = $1
        ORDER BY clicked_at DESC
        LIMIT $2
    "#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await
    .map_err(DatabaseError::DatabaseError)?;

    Ok(history)
}
