use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{
    configuration::Database,
    error::Error,
    model::{
        HistoryRow, ListId, ListMovieRow, ListRow, MovieId, MovieRow, ProfileUpdate,
        ProfileVisibilityRow, SearchDocument, SeriesId, SeriesRow, UserId, UserRow,
        UserSeriesRow,
    },
    store::{Edge, Store, ToggleState},
};

pub mod content;
pub mod error;
pub mod history;
pub mod lists;
pub mod membership;
pub mod users;

pub fn get_connection_pool(database: &Database) -> PgPool {
    PgPoolOptions::new()
        .min_connections(1)
        .max_connections(10)
        .connect_lazy_with(database.with_db())
}

/// [`Store`] backed by the PostgreSQL schema.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn membership_exists(&self, edge: &Edge) -> Result<bool, Error> {
        membership::membership_exists(&self.pool, edge).await
    }

    async fn insert_membership(&self, edge: &Edge) -> Result<(), Error> {
        membership::insert_membership(&self.pool, edge).await
    }

    async fn delete_membership(&self, edge: &Edge) -> Result<u64, Error> {
        membership::delete_membership(&self.pool, edge).await
    }

    async fn toggle_membership(&self, edge: &Edge) -> Result<ToggleState, Error> {
        membership::toggle_membership(&self.pool, edge).await
    }

    async fn primary_list_id(&self, user_id: UserId) -> Result<Option<ListId>, Error> {
        lists::get_primary_list_id(&self.pool, user_id).await
    }

    async fn lists(&self) -> Result<Vec<ListRow>, Error> {
        lists::get_lists(&self.pool).await
    }

    async fn lists_by_ids(&self, list_ids: &[ListId]) -> Result<Vec<ListRow>, Error> {
        lists::get_lists_by_ids(&self.pool, list_ids).await
    }

    async fn set_list_visibility(&self, list_id: ListId, can_display: bool) -> Result<(), Error> {
        lists::update_list_visibility(&self.pool, list_id, can_display).await
    }

    async fn list_movies(&self, list_ids: &[ListId]) -> Result<Vec<ListMovieRow>, Error> {
        lists::get_list_movies(&self.pool, list_ids).await
    }

    async fn favorited_list_ids(&self, user_id: UserId) -> Result<Vec<ListId>, Error> {
        lists::get_favorited_list_ids(&self.pool, user_id).await
    }

    async fn movies(&self, movie_ids: &[MovieId]) -> Result<Vec<MovieRow>, Error> {
        content::get_movies(&self.pool, movie_ids).await
    }

    async fn movies_in_series(&self, series_id: &str) -> Result<Vec<MovieRow>, Error> {
        content::get_movies_in_series(&self.pool, series_id).await
    }

    async fn series(&self, series_ids: &[SeriesId]) -> Result<Vec<SeriesRow>, Error> {
        content::get_series(&self.pool, series_ids).await
    }

    async fn search_corpus(&self) -> Result<Vec<SearchDocument>, Error> {
        content::get_search_corpus(&self.pool).await
    }

    async fn users(&self, user_ids: &[UserId]) -> Result<Vec<UserRow>, Error> {
        users::get_users(&self.pool, user_ids).await
    }

    async fn update_user_profile(
        &self,
        user_id: UserId,
        update: &ProfileUpdate,
    ) -> Result<UserRow, Error> {
        users::update_user_profile(&self.pool, user_id, update).await
    }

    async fn profile_visibility(
        &self,
        user_id: UserId,
    ) -> Result<Option<ProfileVisibilityRow>, Error> {
        users::get_profile_visibility(&self.pool, user_id).await
    }

    async fn upsert_profile_visibility(&self, row: &ProfileVisibilityRow) -> Result<(), Error> {
        users::upsert_profile_visibility(&self.pool, row).await
    }

    async fn user_series(&self, user_id: UserId) -> Result<Vec<UserSeriesRow>, Error> {
        users::get_user_series(&self.pool, user_id).await
    }

    async fn set_user_series_visibility(
        &self,
        user_id: UserId,
        series_id: &str,
        can_display: bool,
    ) -> Result<(), Error> {
        users::update_user_series_visibility(&self.pool, user_id, series_id, can_display).await
    }

    async fn upsert_history(
        &self,
        user_id: UserId,
        movie_id: &str,
        clicked_at: DateTime<Utc>,
    ) -> Result<(), Error> {
        history::upsert_history(&self.pool, user_id, movie_id, clicked_at).await
    }

    async fn history(&self, user_id: UserId, limit: i64) -> Result<Vec<HistoryRow>, Error> {
        history::get_user_history(&self.pool, user_id, limit).await
    }
}
