//! Providers translate view intents into store operations.
//!
//! Every public method is total: it returns [`ProviderResult`] and routes
//! every failure through [`ErrorKind::from`], which classifies and logs it.
//!
//! [`ProviderResult`]: crate::error::ProviderResult
//! [`ErrorKind::from`]: crate::error::ErrorKind

pub mod favorites;
pub mod history;
pub mod list;
pub mod profile;
pub mod toggle;

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use tokio::sync::Mutex;

use crate::{
    auth::{Session, SessionResolver},
    error::Error,
    events::EventBus,
    model::{ListId, MovieId, MovieItem, UserId},
    store::Store,
};

pub use favorites::FavoritesProvider;
pub use history::HistoryRecorder;
pub use list::OshiListProvider;
pub use profile::ProfileProvider;
pub use toggle::toggle;

/// Collaborators shared by every provider. Clones share the same store,
/// resolver and bus.
#[derive(Clone, Default)]
pub struct ProviderContext {
    store: Option<Arc<dyn Store>>,
    sessions: Option<Arc<dyn SessionResolver>>,
    events: EventBus,
}

impl ProviderContext {
    pub fn new(
        store: Option<Arc<dyn Store>>,
        sessions: Option<Arc<dyn SessionResolver>>,
        events: EventBus,
    ) -> Self {
        Self {
            store,
            sessions,
            events,
        }
    }

    pub fn store(&self) -> Result<&dyn Store, Error> {
        self.store.as_deref().ok_or(Error::NotConfigured)
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// The signed-in viewer. Mutations call this once per action.
    pub async fn session(&self) -> Result<Session, Error> {
        let sessions = self.sessions.as_ref().ok_or(Error::NotConfigured)?;
        sessions.require_session().await
    }

    /// The viewer for anonymous-safe reads.
    ///
    /// An unusable session (expired or foreign token) reads as anonymous
    /// rather than failing a public read.
    pub async fn viewer(&self) -> Result<Option<UserId>, Error> {
        let Some(sessions) = self.sessions.as_ref() else {
            return Ok(None);
        };

        match sessions.current_session().await {
            Ok(session) => Ok(session.map(|session| session.user_id)),
            Err(Error::Auth(error)) => {
                tracing::warn!(err.msg = %error, "Session unusable, reading anonymously");
                Ok(None)
            }
            Err(error) => Err(error),
        }
    }
}

impl std::fmt::Debug for ProviderContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderContext")
            .field("store", &self.store.is_some())
            .field("sessions", &self.sessions.is_some())
            .field("events", &self.events)
            .finish()
    }
}

/// The current user's primary list id, remembered for the life of one
/// provider instance. Never invalidated by mutations.
#[derive(Debug, Default)]
pub(crate) struct PrimaryListCache {
    cached: Mutex<Option<(UserId, ListId)>>,
}

impl PrimaryListCache {
    pub(crate) async fn resolve(
        &self,
        store: &dyn Store,
        user_id: UserId,
    ) -> Result<Option<ListId>, Error> {
        let mut cached = self.cached.lock().await;
        if let Some((owner, list_id)) = *cached {
            if owner == user_id {
                return Ok(Some(list_id));
            }
        }

        let list_id = store.primary_list_id(user_id).await?;
        if let Some(list_id) = list_id {
            *cached = Some((user_id, list_id));
        }

        Ok(list_id)
    }

    /// Movies on the viewer's primary list; empty for anonymous viewers.
    pub(crate) async fn oshi_movie_ids(
        &self,
        store: &dyn Store,
        viewer: Option<UserId>,
    ) -> Result<HashSet<MovieId>, Error> {
        let Some(viewer) = viewer else {
            return Ok(HashSet::new());
        };
        let Some(list_id) = self.resolve(store, viewer).await? else {
            return Ok(HashSet::new());
        };

        Ok(store
            .list_movies(&[list_id])
            .await?
            .into_iter()
            .map(|row| row.movie_id)
            .collect())
    }
}

pub(crate) fn parse_list_id(raw: &str) -> Result<ListId, Error> {
    let raw = require_key(raw, "list id")?;

    raw.parse::<ListId>()
        .ok()
        .filter(|list_id| *list_id > 0)
        .ok_or_else(|| Error::InvalidInput(format!("malformed list id `{raw}`")))
}

pub(crate) fn parse_user_id(raw: &str) -> Result<UserId, Error> {
    let raw = require_key(raw, "user id")?;

    UserId::parse_str(&raw).map_err(|_| Error::InvalidInput(format!("malformed user id `{raw}`")))
}

pub(crate) fn require_key(raw: &str, what: &str) -> Result<String, Error> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput(format!("{what} is empty")));
    }

    Ok(trimmed.to_string())
}

/// Loads movies by id and keeps the order of `movie_ids`. Ids the store
/// does not know are dropped.
pub(crate) async fn movie_items(
    store: &dyn Store,
    movie_ids: &[MovieId],
    oshi: &HashSet<MovieId>,
) -> Result<Vec<MovieItem>, Error> {
    let mut rows: HashMap<MovieId, _> = store
        .movies(movie_ids)
        .await?
        .into_iter()
        .map(|row| (row.movie_id.clone(), row))
        .collect();

    Ok(movie_ids
        .iter()
        .filter_map(|movie_id| rows.remove(movie_id))
        .map(|row| {
            let is_oshi = oshi.contains(&row.movie_id);
            MovieItem::from_row(row, is_oshi)
        })
        .collect())
}
