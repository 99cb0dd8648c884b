use sqlx::PgPool;

use crate::{
    error::Error,
    model::{ListId, ListMovieRow, ListRow, UserId},
};

use super::error::DatabaseError;

#[tracing::instrument(name = "get primary list id", skip(pool))]
pub async fn get_primary_list_id(pool: &PgPool, user_id: UserId) -> Result<Option<ListId>, Error> {
    let list_id = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT
            list_id::bigint
        FROM
            list
        WHERE
            user_id = $1
        ORDER BY list_id ASC
        LIMIT 1
    "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .map_err(DatabaseError::DatabaseError)?;

    Ok(list_id)
}

#[tracing::instrument(name = "get lists", skip_all)]
pub async fn get_lists(pool: &PgPool) -> Result<Vec<ListRow>, Error> {
    let lists = sqlx::query_as::<_, ListRow>(
        r#"
        SELECT
            list_id::bigint AS list_id, user_id, can_display,
            favorite_count::bigint AS favorite_count
        FROM
            list
        ORDER BY list_id
    "#,
    )
    .fetch_all(pool)
    .await
    .map_err(DatabaseError::DatabaseError)?;

    Ok(lists)
}

#[tracing::instrument(name = "get lists by ids", skip_all, fields(count = list_ids.len()))]
pub async fn get_lists_by_ids(pool: &PgPool, list_ids: &[ListId]) -> Result<Vec<ListRow>, Error> {
    if list_ids.is_empty() {
        return Ok(Vec::new());
    }

    let lists = sqlx::query_as::<_, ListRow>(
        r#"
        SELECT
            list_id::bigint AS list_id, user_id, can_display,
            favorite_count::bigint AS favorite_count
        FROM
            list
        WHERE
            list_id = ANY($1)
        ORDER BY list_id
    "#,
    )
    .bind(list_ids)
    .fetch_all(pool)
    .await
    .map_err(DatabaseError::DatabaseError)?;

    Ok(lists)
}

#[tracing::instrument(name = "update list visibility", skip(pool))]
pub async fn update_list_visibility(
    pool: &PgPool,
    list_id: ListId,
    can_display: bool,
) -> Result<(), Error> {
    let result = sqlx::query(
        r#"
        UPDATE list
        SET
            can_display = $2
        WHERE
            list_id = $1
    "#,
    )
    .bind(list_id)
    .bind(can_display)
    .execute(pool)
    .await
    .map_err(DatabaseError::DatabaseError)?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound.into());
    }

    Ok(())
}

#[tracing::instrument(name = "get list movies", skip_all, fields(count = list_ids.len()))]
pub async fn get_list_movies(
    pool: &PgPool,
    list_ids: &[ListId],
) -> Result<Vec<ListMovieRow>, Error> {
    if list_ids.is_empty() {
        return Ok(Vec::new());
    }

    let rows = sqlx::query_as::<_, ListMovieRow>(
        r#"
        SELECT
            list_id::bigint AS list_id, movie_id::text AS movie_id
        FROM
            list_movie
        WHERE
            list_id = ANY($1)
    "#,
    )
    .bind(list_ids)
    .fetch_all(pool)
    .await
    .map_err(DatabaseError::DatabaseError)?;

    Ok(rows)
}

#[tracing::instrument(name = "get favorited list ids", skip(pool))]
pub async fn get_favorited_list_ids(pool: &PgPool, user_id: UserId) -> Result<Vec<ListId>, Error> {
    let list_ids = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT
            list_id::bigint
        FROM
            user_list
        WHERE
            user_id = $1
    "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(DatabaseError::DatabaseError)?;

    Ok(list_ids)
}
