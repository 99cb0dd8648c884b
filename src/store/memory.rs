//! In-process [`Store`] for tests and offline hosts.
//!
//! Enforces the same uniqueness rules as the real schema, but runs no
//! triggers: favorite counts stay whatever they were seeded with.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    sync::{
        Mutex, MutexGuard, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    db::error::DatabaseError,
    error::{Error, RawFailure},
    model::{
        HistoryRow, ListId, ListMovieRow, ListRow, MovieId, MovieRow, ProfileUpdate,
        ProfileVisibilityRow, SearchDocument, SeriesId, SeriesRow, UserId, UserRow,
        UserSeriesRow,
    },
};

use super::{Edge, Store};

#[derive(Default)]
struct State {
    users: BTreeMap<UserId, UserRow>,
    lists: BTreeMap<ListId, ListRow>,
    movies: BTreeMap<MovieId, MovieRow>,
    series: BTreeMap<SeriesId, SeriesRow>,
    edges: Vec<Edge>,
    user_series_display: HashMap<(UserId, SeriesId), Option<bool>>,
    profile_visibility: HashMap<UserId, ProfileVisibilityRow>,
    history: HashMap<(UserId, MovieId), DateTime<Utc>>,
    interleave: Option<Edge>,
    fail_next: Option<RawFailure>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    writes: AtomicUsize,
    corpus_fetches: AtomicUsize,
}

fn duplicate(edge: &Edge) -> Error {
    Error::Database(DatabaseError::Rejected(
        RawFailure::new(format!(
            "duplicate key value violates unique constraint \"{}_pkey\"",
            edge.table()
        ))
        .with_code("23505"),
    ))
}

/// Rows for the distinct `keys` present in `table`, in key order.
fn pick<K: Ord, V: Clone>(table: &BTreeMap<K, V>, keys: &[K]) -> Vec<V> {
    keys.iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .filter_map(|key| table.get(key).cloned())
        .collect()
}

impl State {
    fn push_edge(&mut self, edge: Edge) {
        if !self.edges.contains(&edge) {
            self.edges.push(edge);
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn take_failure(&self, state: &mut State) -> Result<(), Error> {
        match state.fail_next.take() {
            Some(failure) => Err(Error::Database(DatabaseError::Rejected(failure))),
            None => Ok(()),
        }
    }

    fn read(&self) -> Result<MutexGuard<'_, State>, Error> {
        let mut state = self.state();
        self.take_failure(&mut state)?;
        Ok(state)
    }

    fn write(&self) -> Result<MutexGuard<'_, State>, Error> {
        let state = self.read()?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(state)
    }

    /// Number of mutating calls that reached the store.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of times the search corpus was fetched.
    pub fn corpus_fetch_count(&self) -> usize {
        self.corpus_fetches.load(Ordering::SeqCst)
    }

    /// Makes the next store call fail with `failure`.
    pub fn fail_next(&self, failure: RawFailure) {
        self.state().fail_next = Some(failure);
    }

    /// Inserts `edge` right after the next membership check, as a second
    /// session racing the caller would.
    pub fn interleave_after_next_check(&self, edge: Edge) {
        self.state().interleave = Some(edge);
    }

    pub fn seed_user(&self, user: UserRow) {
        self.state().users.insert(user.user_id, user);
    }

    pub fn seed_list(&self, list: ListRow) {
        self.state().lists.insert(list.list_id, list);
    }

    pub fn seed_movie(&self, movie: MovieRow) {
        self.state().movies.insert(movie.movie_id.clone(), movie);
    }

    pub fn seed_series(&self, series: SeriesRow) {
        self.state().series.insert(series.series_id.clone(), series);
    }

    pub fn seed_edge(&self, edge: Edge) {
        self.state().push_edge(edge);
    }

    pub fn seed_user_series(&self, row: UserSeriesRow) {
        let mut state = self.state();
        state.push_edge(Edge::UserSeries {
            user_id: row.user_id,
            series_id: row.series_id.clone(),
        });
        state
            .user_series_display
            .insert((row.user_id, row.series_id), row.can_display);
    }

    pub fn seed_profile_visibility(&self, row: ProfileVisibilityRow) {
        self.state().profile_visibility.insert(row.user_id, row);
    }

    pub fn edge_count(&self, edge: &Edge) -> usize {
        self.state().edges.iter().filter(|e| *e == edge).count()
    }

    pub fn list_row(&self, list_id: ListId) -> Option<ListRow> {
        self.state().lists.get(&list_id).cloned()
    }

    pub fn history_entry(&self, user_id: UserId, movie_id: &str) -> Option<DateTime<Utc>> {
        self.state()
            .history
            .get(&(user_id, movie_id.to_string()))
            .copied()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn membership_exists(&self, edge: &Edge) -> Result<bool, Error> {
        let mut state = self.read()?;
        let exists = state.edges.contains(edge);

        if let Some(racing) = state.interleave.take() {
            state.push_edge(racing);
        }

        Ok(exists)
    }

    async fn insert_membership(&self, edge: &Edge) -> Result<(), Error> {
        let mut state = self.write()?;
        if state.edges.contains(edge) {
            return Err(duplicate(edge));
        }

        if let Edge::UserSeries { user_id, series_id } = edge {
            state
                .user_series_display
                .insert((*user_id, series_id.clone()), None);
        }
        state.edges.push(edge.clone());

        Ok(())
    }

    async fn delete_membership(&self, edge: &Edge) -> Result<u64, Error> {
        let mut state = self.write()?;
        let before = state.edges.len();
        state.edges.retain(|e| e != edge);

        if let Edge::UserSeries { user_id, series_id } = edge {
            state
                .user_series_display
                .remove(&(*user_id, series_id.clone()));
        }

        Ok((before - state.edges.len()) as u64)
    }

    async fn primary_list_id(&self, user_id: UserId) -> Result<Option<ListId>, Error> {
        let state = self.read()?;

        Ok(state
            .lists
            .values()
            .filter(|list| list.user_id == user_id)
            .map(|list| list.list_id)
            .min())
    }

    async fn lists(&self) -> Result<Vec<ListRow>, Error> {
        Ok(self.read()?.lists.values().cloned().collect())
    }

    async fn lists_by_ids(&self, list_ids: &[ListId]) -> Result<Vec<ListRow>, Error> {
        Ok(pick(&self.read()?.lists, list_ids))
    }

    async fn set_list_visibility(&self, list_id: ListId, can_display: bool) -> Result<(), Error> {
        let mut state = self.write()?;
        let list = state
            .lists
            .get_mut(&list_id)
            .ok_or(DatabaseError::NotFound)?;
        list.can_display = Some(can_display);

        Ok(())
    }

    async fn list_movies(&self, list_ids: &[ListId]) -> Result<Vec<ListMovieRow>, Error> {
        let state = self.read()?;

        Ok(state
            .edges
            .iter()
            .filter_map(|edge| match edge {
                Edge::ListMovie { list_id, movie_id } if list_ids.contains(list_id) => {
                    Some(ListMovieRow {
                        list_id: *list_id,
                        movie_id: movie_id.clone(),
                    })
                }
                _ => None,
            })
            .collect())
    }

    async fn favorited_list_ids(&self, user_id: UserId) -> Result<Vec<ListId>, Error> {
        let state = self.read()?;

        Ok(state
            .edges
            .iter()
            .filter_map(|edge| match edge {
                Edge::UserList {
                    user_id: owner,
                    list_id,
                } if *owner == user_id => Some(*list_id),
                _ => None,
            })
            .collect())
    }

    async fn movies(&self, movie_ids: &[MovieId]) -> Result<Vec<MovieRow>, Error> {
        Ok(pick(&self.read()?.movies, movie_ids))
    }

    async fn movies_in_series(&self, series_id: &str) -> Result<Vec<MovieRow>, Error> {
        let state = self.read()?;

        Ok(state
            .movies
            .values()
            .filter(|movie| movie.series_id.as_deref() == Some(series_id))
            .cloned()
            .collect())
    }

    async fn series(&self, series_ids: &[SeriesId]) -> Result<Vec<SeriesRow>, Error> {
        Ok(pick(&self.read()?.series, series_ids))
    }

    async fn search_corpus(&self) -> Result<Vec<SearchDocument>, Error> {
        let state = self.read()?;
        self.corpus_fetches.fetch_add(1, Ordering::SeqCst);

        Ok(state
            .movies
            .values()
            .map(|movie| SearchDocument {
                id: movie.movie_id.clone(),
                title: movie.movie_title.clone(),
                thumbnail_url: movie.thumbnail_url.clone(),
            })
            .collect())
    }

    async fn users(&self, user_ids: &[UserId]) -> Result<Vec<UserRow>, Error> {
        Ok(pick(&self.read()?.users, user_ids))
    }

    async fn update_user_profile(
        &self,
        user_id: UserId,
        update: &ProfileUpdate,
    ) -> Result<UserRow, Error> {
        let mut state = self.write()?;
        let user = state
            .users
            .get_mut(&user_id)
            .ok_or(DatabaseError::NotFound)?;
        update.apply_to(user);

        Ok(user.clone())
    }

    async fn profile_visibility(
        &self,
        user_id: UserId,
    ) -> Result<Option<ProfileVisibilityRow>, Error> {
        Ok(self.read()?.profile_visibility.get(&user_id).cloned())
    }

    async fn upsert_profile_visibility(&self, row: &ProfileVisibilityRow) -> Result<(), Error> {
        self.write()?
            .profile_visibility
            .insert(row.user_id, row.clone());

        Ok(())
    }

    async fn user_series(&self, user_id: UserId) -> Result<Vec<UserSeriesRow>, Error> {
        let state = self.read()?;

        Ok(state
            .edges
            .iter()
            .filter_map(|edge| match edge {
                Edge::UserSeries {
                    user_id: owner,
                    series_id,
                } if *owner == user_id => Some(UserSeriesRow {
                    user_id,
                    series_id: series_id.clone(),
                    can_display: state
                        .user_series_display
                        .get(&(user_id, series_id.clone()))
                        .copied()
                        .flatten(),
                }),
                _ => None,
            })
            .collect())
    }

    async fn set_user_series_visibility(
        &self,
        user_id: UserId,
        series_id: &str,
        can_display: bool,
    ) -> Result<(), Error> {
        let mut state = self.write()?;
        let display = state
            .user_series_display
            .get_mut(&(user_id, series_id.to_string()))
            .ok_or(DatabaseError::NotFound)?;
        *display = Some(can_display);

        Ok(())
    }

    async fn upsert_history(
        &self,
        user_id: UserId,
        movie_id: &str,
        clicked_at: DateTime<Utc>,
    ) -> Result<(), Error> {
        self.write()?
            .history
            .insert((user_id, movie_id.to_string()), clicked_at);

        Ok(())
    }

    async fn history(&self, user_id: UserId, limit: i64) -> Result<Vec<HistoryRow>, Error> {
        let state = self.read()?;
        let mut rows: Vec<HistoryRow> = state
            .history
            .iter()
            .filter(|((owner, _), _)| *owner == user_id)
            .map(|((owner, movie_id), clicked_at)| HistoryRow {
                user_id: *owner,
                movie_id: movie_id.clone(),
                clicked_at: *clicked_at,
            })
            .collect();
        rows.sort_by(|a, b| b.clicked_at.cmp(&a.clicked_at));
        rows.truncate(limit.max(0) as usize);

        Ok(rows)
    }
}
