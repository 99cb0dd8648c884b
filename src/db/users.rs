use sqlx::PgPool;

use crate::{
    error::Error,
    model::{ProfileUpdate, ProfileVisibilityRow, UserId, UserRow, UserSeriesRow},
};

use super::error::DatabaseError;

#[tracing::instrument(name = "get users", skip_all, fields(count = user_ids.len()))]
pub async fn get_users(pool: &PgPool, user_ids: &[UserId]) -> Result<Vec<UserRow>, Error> {
    if user_ids.is_empty() {
        return Ok(Vec::new());
    }

    let users = sqlx::query_as::<_, UserRow>(
        r#"
        SELECT
            user_id, name, icon_url,
            x_url, x_label,
            youtube_url, youtube_label,
            other_url, other_label
        FROM
            users
        WHERE
            user_id = ANY($1)
    "#,
    )
    .bind(user_ids)
    .fetch_all(pool)
    .await
    .map_err(DatabaseError::DatabaseError)?;

    Ok(users)
}

#[tracing::instrument(name = "update user profile", skip(pool, update))]
pub async fn update_user_profile(
    pool: &PgPool,
    user_id: UserId,
    update: &ProfileUpdate,
) -> Result<UserRow, Error> {
    let mut tx = pool.begin().await.map_err(DatabaseError::DatabaseError)?;

    let mut user = sqlx::query_as::<_, UserRow>(
        r#"
        SELECT
            user_id, name, icon_url,
            x_url, x_label,
            youtube_url, youtube_label,
            other_url, other_label
        FROM
            users
        WHERE
            user_id = $1
        FOR UPDATE
    "#,
    )
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await
    .map_err(DatabaseError::DatabaseError)?
    .ok_or(DatabaseError::NotFound)?;

    update.apply_to(&mut user);

    sqlx::query(
        r#"
        UPDATE users
        SET
            name = $2,
            icon_url = $3,
            x_url = $4,
            x_label = $5,
            youtube_url = $6,
            youtube_label = $7,
            other_url = $8,
            other_label = $9
        WHERE
            user_id = $1
    "#,
    )
    .bind(user.user_id)
    .bind(&user.name)
    .bind(&user.icon_url)
    .bind(&user.x_url)
    .bind(&user.x_label)
    .bind(&user.youtube_url)
    .bind(&user.youtube_label)
    .bind(&user.other_url)
    .bind(&user.other_label)
    .execute(&mut *tx)
    .await
    .map_err(DatabaseError::DatabaseError)?;

    tx.commit().await.map_err(DatabaseError::DatabaseError)?;

    Ok(user)
}

#[tracing::instrument(name = "get profile visibility", skip(pool))]
pub async fn get_profile_visibility(
    pool: &PgPool,
    user_id: UserId,
) -> Result<Option<ProfileVisibilityRow>, Error> {
    let row = sqlx::query_as::<_, ProfileVisibilityRow>(
        r#"
        SELECT
            user_id, oshi_list_visibility, oshi_series_visibility
        FROM
            profile_visibility
        WHERE
            user_id = $1
    "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .map_err(DatabaseError::DatabaseError)?;

    Ok(row)
}

#[tracing::instrument(name = "upsert profile visibility", skip_all, fields(user_id = %row.user_id))]
pub async fn upsert_profile_visibility(
    pool: &PgPool,
    row: &ProfileVisibilityRow,
) -> Result<(), Error> {
    sqlx::query(
        r#"
        INSERT INTO profile_visibility
            (user_id, oshi_list_visibility, oshi_series_visibility)
        VALUES
            ($1, $2, $3)
        ON CONFLICT (user_id)
        DO UPDATE SET
            oshi_list_visibility = EXCLUDED.oshi_list_visibility,
            oshi_series_visibility = EXCLUDED.oshi_series_visibility;
    "#,
    )
    .bind(row.user_id)
    .bind(row.oshi_list_visibility)
    .bind(row.oshi_series_visibility)
    .execute(pool)
    .await
    .map_err(DatabaseError::DatabaseError)?;

    Ok(())
}

#[tracing::instrument(name = "get user series", skip(pool))]
pub async fn get_user_series(pool: &PgPool, user_id: UserId) -> Result<Vec<UserSeriesRow>, Error> {
    let rows = sqlx::query_as::<_, UserSeriesRow>(
        r#"
        SELECT
            user_id, series_id::text AS series_id, can_display
        FROM
            user_series
        WHERE
            user_id = $1
    "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(DatabaseError::DatabaseError)?;

    Ok(rows)
}

#[tracing::instrument(name = "update user series visibility", skip(pool))]
pub async fn update_user_series_visibility(
    pool: &PgPool,
    user_id: UserId,
    series_id: &str,
    can_display: bool,
) -> Result<(), Error> {
    let result = sqlx::query(
        r#"
        UPDATE user_series
        SET
            can_display = $3
        WHERE
            user_id = $1 AND series_id::text = $2
    "#,
    )
    .bind(user_id)
    .bind(series_id)
    .bind(can_display)
    .execute(pool)
    .await
    .map_err(DatabaseError::DatabaseError)?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound.into());
    }

    Ok(())
}
