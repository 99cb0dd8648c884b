use sqlx::{PgPool, Postgres, Row, postgres::PgArguments, query::Query};

use crate::{
    error::{Error, RawFailure},
    store::{Edge, ToggleState},
};

use super::error::DatabaseError;

type PgQuery<'q> = Query<'q, Postgres, PgArguments>;

fn bind_edge<'q>(query: PgQuery<'q>, edge: &'q Edge) -> PgQuery<'q> {
    match edge {
        Edge::ListMovie { list_id, movie_id } => query.bind(*list_id).bind(movie_id.as_str()),
        Edge::UserList { user_id, list_id } => query.bind(*user_id).bind(*list_id),
        Edge::UserSeries { user_id, series_id } => {
            query.bind(*user_id).bind(series_id.as_str())
        }
    }
}

#[tracing::instrument(name = "membership exists", skip_all, fields(table = edge.table()))]
pub async fn membership_exists(pool: &PgPool, edge: &Edge) -> Result<bool, Error> {
    let sql = format!(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM {table} WHERE {owner} = $1 AND {target} = $2 LIMIT 1
        )
    "#,
        table = edge.table(),
        owner = edge.owner_column(),
        target = edge.target_column(),
    );

    let row = bind_edge(sqlx::query(&sql), edge)
        .fetch_one(pool)
        .await
        .map_err(DatabaseError::DatabaseError)?;

    Ok(row.try_get::<bool, _>(0).map_err(DatabaseError::DatabaseError)?)
}

#[tracing::instrument(name = "insert membership", skip_all, fields(table = edge.table()))]
pub async fn insert_membership(pool: &PgPool, edge: &Edge) -> Result<(), Error> {
    let sql = format!(
        r#"
        INSERT INTO {table}
            ({owner}, {target})
        VALUES
            ($1, $2)
    "#,
        table = edge.table(),
        owner = edge.owner_column(),
        target = edge.target_column(),
    );

    bind_edge(sqlx::query(&sql), edge)
        .execute(pool)
        .await
        .map_err(DatabaseError::DatabaseError)?;

    Ok(())
}

#[tracing::instrument(name = "delete membership", skip_all, fields(table = edge.table()))]
pub async fn delete_membership(pool: &PgPool, edge: &Edge) -> Result<u64, Error> {
    let sql = format!(
        r#"
        DELETE FROM {table}
        WHERE
            {owner} = $1 AND {target} = $2
    "#,
        table = edge.table(),
        owner = edge.owner_column(),
        target = edge.target_column(),
    );

    let result = bind_edge(sqlx::query(&sql), edge)
        .execute(pool)
        .await
        .map_err(DatabaseError::DatabaseError)?;

    Ok(result.rows_affected())
}

/// Deletes the edge if present, inserts it otherwise, in one statement.
///
/// When neither branch touched a row, another session inserted the same
/// edge between our snapshot and the insert; that surfaces as a conflict.
#[tracing::instrument(name = "toggle membership", skip_all, fields(table = edge.table()))]
pub async fn toggle_membership(pool: &PgPool, edge: &Edge) -> Result<ToggleState, Error> {
    let sql = format!(
        r#"
        WITH removed AS (
            DELETE FROM {table}
            WHERE {owner} = $1 AND {target} = $2
            RETURNING 1
        ), added AS (
            INSERT INTO {table} ({owner}, {target})
            SELECT $1, $2
            WHERE NOT EXISTS (SELECT 1 FROM removed)
            ON CONFLICT DO NOTHING
            RETURNING 1
        )
        SELECT
            (SELECT count(*) FROM removed) AS removed,
            (SELECT count(*) FROM added) AS added
    "#,
        table = edge.table(),
        owner = edge.owner_column(),
        target = edge.target_column(),
    );

    let row = bind_edge(sqlx::query(&sql), edge)
        .fetch_one(pool)
        .await
        .map_err(DatabaseError::DatabaseError)?;

    let removed: i64 = row.try_get("removed").map_err(DatabaseError::DatabaseError)?;
    let added: i64 = row.try_get("added").map_err(DatabaseError::DatabaseError)?;

    match (removed, added) {
        (r, _) if r > 0 => Ok(ToggleState::Off),
        (_, a) if a > 0 => Ok(ToggleState::On),
        _ => Err(DatabaseError::Rejected(
            RawFailure::new(format!(
                "duplicate key value violates unique constraint on {}",
                edge.table()
            ))
            .with_code("23505"),
        )
        .into()),
    }
}
