//! The remote relational store as this layer consumes it.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::Error,
    model::{
        HistoryRow, ListId, ListMovieRow, ListRow, MovieId, MovieRow, ProfileUpdate,
        ProfileVisibilityRow, SearchDocument, SeriesId, SeriesRow, UserId, UserRow,
        UserSeriesRow,
    },
};

pub use memory::MemoryStore;

/// A membership edge. Each pair occurs at most once in its relation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "relation", rename_all = "snake_case")]
pub enum Edge {
    /// The list contains the movie (`list_movie`).
    ListMovie { list_id: ListId, movie_id: MovieId },
    /// The user favorited the list (`user_list`).
    UserList { user_id: UserId, list_id: ListId },
    /// The user favorited the series (`user_series`).
    UserSeries { user_id: UserId, series_id: SeriesId },
}

impl Edge {
    pub fn table(&self) -> &'static str {
        match self {
            Edge::ListMovie { .. } => "list_movie",
            Edge::UserList { .. } => "user_list",
            Edge::UserSeries { .. } => "user_series",
        }
    }

    pub fn owner_column(&self) -> &'static str {
        match self {
            Edge::ListMovie { .. } => "list_id",
            Edge::UserList { .. } | Edge::UserSeries { .. } => "user_id",
        }
    }

    pub fn target_column(&self) -> &'static str {
        match self {
            Edge::ListMovie { .. } => "movie_id",
            Edge::UserList { .. } => "list_id",
            Edge::UserSeries { .. } => "series_id",
        }
    }

    pub fn owner_key(&self) -> String {
        match self {
            Edge::ListMovie { list_id, .. } => list_id.to_string(),
            Edge::UserList { user_id, .. } | Edge::UserSeries { user_id, .. } => {
                user_id.to_string()
            }
        }
    }

    pub fn target_key(&self) -> String {
        match self {
            Edge::ListMovie { movie_id, .. } => movie_id.clone(),
            Edge::UserList { list_id, .. } => list_id.to_string(),
            Edge::UserSeries { series_id, .. } => series_id.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleState {
    On,
    Off,
}

impl ToggleState {
    pub fn is_on(&self) -> bool {
        matches!(self, ToggleState::On)
    }
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn membership_exists(&self, edge: &Edge) -> Result<bool, Error>;

    /// Fails with a uniqueness conflict if the edge already exists.
    async fn insert_membership(&self, edge: &Edge) -> Result<(), Error>;

    /// Removes every row matching the edge and returns how many went.
    async fn delete_membership(&self, edge: &Edge) -> Result<u64, Error>;

    /// Flips the edge and reports the resulting state.
    ///
    /// The default is check-then-act over the three primitives above and is
    /// not atomic. Backends that can branch server-side should override it.
    async fn toggle_membership(&self, edge: &Edge) -> Result<ToggleState, Error> {
        if self.membership_exists(edge).await? {
            self.delete_membership(edge).await?;
            return Ok(ToggleState::Off);
        }

        self.insert_membership(edge).await?;
        Ok(ToggleState::On)
    }

    /// The user's primary list: the one with the lowest id.
    async fn primary_list_id(&self, user_id: UserId) -> Result<Option<ListId>, Error>;

    async fn lists(&self) -> Result<Vec<ListRow>, Error>;

    async fn lists_by_ids(&self, list_ids: &[ListId]) -> Result<Vec<ListRow>, Error>;

    async fn set_list_visibility(&self, list_id: ListId, can_display: bool) -> Result<(), Error>;

    async fn list_movies(&self, list_ids: &[ListId]) -> Result<Vec<ListMovieRow>, Error>;

    async fn favorited_list_ids(&self, user_id: UserId) -> Result<Vec<ListId>, Error>;

    async fn movies(&self, movie_ids: &[MovieId]) -> Result<Vec<MovieRow>, Error>;

    async fn movies_in_series(&self, series_id: &str) -> Result<Vec<MovieRow>, Error>;

    async fn series(&self, series_ids: &[SeriesId]) -> Result<Vec<SeriesRow>, Error>;

    async fn search_corpus(&self) -> Result<Vec<SearchDocument>, Error>;

    async fn users(&self, user_ids: &[UserId]) -> Result<Vec<UserRow>, Error>;

    async fn update_user_profile(
        &self,
        user_id: UserId,
        update: &ProfileUpdate,
    ) -> Result<UserRow, Error>;

    async fn profile_visibility(
        &self,
        user_id: UserId,
    ) -> Result<Option<ProfileVisibilityRow>, Error>;

    async fn upsert_profile_visibility(&self, row: &ProfileVisibilityRow) -> Result<(), Error>;

    async fn user_series(&self, user_id: UserId) -> Result<Vec<UserSeriesRow>, Error>;

    async fn set_user_series_visibility(
        &self,
        user_id: UserId,
        series_id: &str,
        can_display: bool,
    ) -> Result<(), Error>;

    /// Writes one entry per (user, movie); a repeat overwrites `clicked_at`.
    async fn upsert_history(
        &self,
        user_id: UserId,
        movie_id: &str,
        clicked_at: DateTime<Utc>,
    ) -> Result<(), Error>;

    async fn history(&self, user_id: UserId, limit: i64) -> Result<Vec<HistoryRow>, Error>;
}
