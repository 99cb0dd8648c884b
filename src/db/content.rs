use futures::TryStreamExt;
use sqlx::PgPool;

use crate::{
    error::Error,
    model::{MovieId, MovieRow, SearchDocument, SeriesId, SeriesRow},
};

use super::error::DatabaseError;

#[tracing::instrument(name = "get movies", skip_all, fields(count = movie_ids.len()))]
pub async fn get_movies(pool: &PgPool, movie_ids: &[MovieId]) -> Result<Vec<MovieRow>, Error> {
    if movie_ids.is_empty() {
        return Ok(Vec::new());
    }

    let movies = sqlx::query_as::<_, MovieRow>(
        r#"
        SELECT
            movie_id::text AS movie_id, series_id::text AS series_id,
            movie_title, url, thumbnail_url,
            "update", favorite_count::bigint AS favorite_count, weekday
        FROM
            movie
        WHERE
            movie_id::text = ANY($1)
    "#,
    )
    .bind(movie_ids)
    .fetch_all(pool)
    .await
    .map_err(DatabaseError::DatabaseError)?;

    Ok(movies)
}

#[tracing::instrument(name = "get movies in series", skip(pool))]
pub async fn get_movies_in_series(pool: &PgPool, series_id: &str) -> Result<Vec<MovieRow>, Error> {
    let movies = sqlx::query_as::<_, MovieRow>(
        r#"
        SELECT
            movie_id::text AS movie_id, series_id::text AS series_id,
            movie_title, url, thumbnail_url,
            "update", favorite_count::bigint AS favorite_count, weekday
        FROM
            movie
        WHERE
            series_id::text = $1
    "#,
    )
    .bind(series_id)
    .fetch_all(pool)
    .await
    .map_err(DatabaseError::DatabaseError)?;

    Ok(movies)
}

#[tracing::instrument(name = "get series", skip_all, fields(count = series_ids.len()))]
pub async fn get_series(pool: &PgPool, series_ids: &[SeriesId]) -> Result<Vec<SeriesRow>, Error> {
    if series_ids.is_empty() {
        return Ok(Vec::new());
    }

    let series = sqlx::query_as::<_, SeriesRow>(
        r#"
        SELECT
            series_id::text AS series_id, title,
            favorite_count::bigint AS favorite_count
        FROM
            series
        WHERE
            series_id::text = ANY($1)
    "#,
    )
    .bind(series_ids)
    .fetch_all(pool)
    .await
    .map_err(DatabaseError::DatabaseError)?;

    Ok(series)
}

#[tracing::instrument(name = "get search corpus", skip_all)]
pub async fn get_search_corpus(pool: &PgPool) -> Result<Vec<SearchDocument>, Error> {
    let mut corpus_stream = sqlx::query_as::<_, SearchDocument>(
        r#"
        SELECT
            movie_id::text AS id, movie_title AS title, thumbnail_url
        FROM
            movie
        ORDER BY movie_title
    "#,
    )
    .fetch(pool);

    let mut corpus = Vec::new();
    while let Some(document) = corpus_stream
        .try_next()
        .await
        .map_err(DatabaseError::DatabaseError)?
    {
        corpus.push(document);
    }

    Ok(corpus)
}
