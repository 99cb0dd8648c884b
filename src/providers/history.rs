use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::{
    error::{Error, ProviderResult},
    model::{HistoryItem, HistoryReceipt, MovieId, RecordView, UserId, ViewSource},
};

use super::{PrimaryListCache, ProviderContext, movie_items, require_key};

const MAX_RECENT: i64 = 100;

type SuppressionKey = (UserId, MovieId, ViewSource);

/// Records watched movies, one entry per (user, movie).
#[derive(Debug)]
pub struct HistoryRecorder {
    ctx: ProviderContext,
    window: Duration,
    recent_plays: Mutex<HashMap<SuppressionKey, (Instant, HistoryReceipt)>>,
    primary_list: PrimaryListCache,
}

impl HistoryRecorder {
    /// `window` is how long a repeated play of the same movie is ignored.
    pub fn new(ctx: ProviderContext, window: Duration) -> Self {
        Self {
            ctx,
            window,
            recent_plays: Mutex::new(HashMap::new()),
            primary_list: PrimaryListCache::default(),
        }
    }

    #[tracing::instrument(
        name = "record view",
        skip_all,
        fields(movie_id = %view.movie_id, source = view.source.as_str())
    )]
    pub async fn record_view(&self, view: RecordView) -> ProviderResult<HistoryReceipt> {
        Ok(self.write_view(view).await?)
    }

    /// The viewer's history, newest first.
    #[tracing::instrument(name = "recent history", skip(self))]
    pub async fn recent(&self, limit: i64) -> ProviderResult<Vec<HistoryItem>> {
        Ok(self.load_recent(limit).await?)
    }

    async fn write_view(&self, view: RecordView) -> Result<HistoryReceipt, Error> {
        let movie_id = require_key(&view.movie_id, "movie id")?;
        let clicked_at = parse_clicked_at(&view.clicked_at)?;
        let store = self.ctx.store()?;
        let session = self.ctx.session().await?;

        if !view.source.is_suppressible() {
            store
                .upsert_history(session.user_id, &movie_id, clicked_at)
                .await?;
            return Ok(HistoryReceipt::for_entry(session.user_id, &movie_id));
        }

        // Held across the write so a burst of plays cannot slip past together.
        let mut recent_plays = self.recent_plays.lock().await;
        let now = Instant::now();
        recent_plays.retain(|_, (at, _)| now.duration_since(*at) < self.window);

        let key = (session.user_id, movie_id.clone(), view.source);
        if let Some((_, receipt)) = recent_plays.get(&key) {
            tracing::debug!("Repeated play inside suppression window, skipping write");
            return Ok(receipt.clone());
        }

        store
            .upsert_history(session.user_id, &movie_id, clicked_at)
            .await?;
        let receipt = HistoryReceipt::for_entry(session.user_id, &movie_id);
        recent_plays.insert(key, (now, receipt.clone()));

        Ok(receipt)
    }

    async fn load_recent(&self, limit: i64) -> Result<Vec<HistoryItem>, Error> {
        if !(1..=MAX_RECENT).contains(&limit) {
            return Err(Error::InvalidInput(format!(
                "history limit must be between 1 and {MAX_RECENT}, got {limit}"
            )));
        }
        let store = self.ctx.store()?;
        let session = self.ctx.session().await?;
        let viewer = Some(session.user_id);

        let (rows, oshi) = futures::try_join!(
            store.history(session.user_id, limit),
            self.primary_list.oshi_movie_ids(store, viewer)
        )?;
        let movie_ids: Vec<MovieId> = rows.iter().map(|row| row.movie_id.clone()).collect();
        let mut movies: HashMap<MovieId, _> = movie_items(store, &movie_ids, &oshi)
            .await?
            .into_iter()
            .map(|movie| (movie.movie_id.clone(), movie))
            .collect();

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                movies.remove(&row.movie_id).map(|movie| HistoryItem {
                    movie,
                    clicked_at: row.clicked_at,
                })
            })
            .collect())
    }
}

fn parse_clicked_at(raw: &str) -> Result<DateTime<Utc>, Error> {
    let raw = require_key(raw, "clicked at")?;

    DateTime::parse_from_rfc3339(&raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|error| Error::InvalidInput(format!("malformed clicked at `{raw}`: {error}")))
}
