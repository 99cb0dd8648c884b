use std::collections::{HashMap, HashSet};

use crate::{
    db::error::DatabaseError,
    error::{Error, ProviderResult},
    events::Topic,
    model::{
        CatalogEntry, FavoriteSeries, FavoriteToggled, MovieId, SeriesDetail, SeriesId,
        SeriesSummary, UserId,
    },
    policy::{SortOrder, Visibility},
    store::{Edge, Store},
};

use super::{
    PrimaryListCache, ProviderContext,
    list::{catalog_entries, favorited_list_ids},
    movie_items, require_key, toggle,
};

/// The viewer's favorites page and series favorites.
#[derive(Debug)]
pub struct FavoritesProvider {
    ctx: ProviderContext,
    preview_size: usize,
    primary_list: PrimaryListCache,
}

impl FavoritesProvider {
    pub fn new(ctx: ProviderContext, preview_size: usize) -> Self {
        Self {
            ctx,
            preview_size,
            primary_list: PrimaryListCache::default(),
        }
    }

    /// Lists the viewer favorited. Lists their owners have since hidden are
    /// left out.
    #[tracing::instrument(name = "favorite lists", skip(self), fields(sort = %sort))]
    pub async fn favorite_lists(&self, sort: SortOrder) -> ProviderResult<Vec<CatalogEntry>> {
        Ok(self.load_favorite_lists(sort).await?)
    }

    #[tracing::instrument(name = "favorite series", skip(self))]
    pub async fn favorite_series(&self) -> ProviderResult<Vec<FavoriteSeries>> {
        Ok(self.load_favorite_series().await?)
    }

    #[tracing::instrument(name = "series detail", skip(self), fields(sort = %sort))]
    pub async fn series_detail(
        &self,
        series_id: &str,
        sort: SortOrder,
    ) -> ProviderResult<SeriesDetail> {
        Ok(self.load_series_detail(series_id, sort).await?)
    }

    #[tracing::instrument(name = "toggle series favorite", skip(self))]
    pub async fn toggle_series_favorite(&self, series_id: &str) -> ProviderResult<FavoriteToggled> {
        Ok(self.flip_series_favorite(series_id).await?)
    }

    #[tracing::instrument(name = "set series visibility", skip(self), fields(visibility = visibility.as_str()))]
    pub async fn set_series_visibility(
        &self,
        series_id: &str,
        visibility: Visibility,
    ) -> ProviderResult<Visibility> {
        Ok(self.write_series_visibility(series_id, visibility).await?)
    }

    async fn load_favorite_lists(&self, sort: SortOrder) -> Result<Vec<CatalogEntry>, Error> {
        let store = self.ctx.store()?;
        let session = self.ctx.session().await?;
        let viewer = Some(session.user_id);

        let favorited = favorited_list_ids(store, viewer).await?;
        let list_ids: Vec<_> = favorited.iter().copied().collect();
        let lists = store
            .lists_by_ids(&list_ids)
            .await?
            .into_iter()
            .filter(|list| list.is_readable_by(viewer))
            .collect();

        let mut entries =
            catalog_entries(store, lists, viewer, &favorited, self.preview_size).await?;
        sort.sort(&mut entries);

        Ok(entries)
    }

    async fn load_favorite_series(&self) -> Result<Vec<FavoriteSeries>, Error> {
        let store = self.ctx.store()?;
        let session = self.ctx.session().await?;

        favorite_series_of(store, session.user_id, true).await
    }

    async fn load_series_detail(
        &self,
        raw: &str,
        sort: SortOrder,
    ) -> Result<SeriesDetail, Error> {
        let series_id = require_key(raw, "series id")?;
        let store = self.ctx.store()?;
        let viewer = self.ctx.viewer().await?;

        let series_ids = [series_id.clone()];
        let (series, movies, favorites, oshi) = futures::try_join!(
            store.series(&series_ids),
            store.movies_in_series(&series_id),
            favorited_series_ids(store, viewer),
            self.primary_list.oshi_movie_ids(store, viewer)
        )?;

        let series = series.into_iter().next().ok_or(DatabaseError::NotFound)?;
        let movie_ids: Vec<MovieId> = movies.into_iter().map(|movie| movie.movie_id).collect();
        let mut movies = movie_items(store, &movie_ids, &oshi).await?;
        sort.sort(&mut movies);

        Ok(SeriesDetail {
            summary: SeriesSummary {
                is_favorited: favorites.contains(&series.series_id),
                series_id: series.series_id,
                title: series.title,
                favorite_count: series.favorite_count.unwrap_or_default().max(0),
            },
            movies,
        })
    }

    async fn flip_series_favorite(&self, raw: &str) -> Result<FavoriteToggled, Error> {
        let series_id = require_key(raw, "series id")?;
        let store = self.ctx.store()?;
        let session = self.ctx.session().await?;

        if store.series(&[series_id.clone()]).await?.is_empty() {
            return Err(DatabaseError::NotFound.into());
        }

        let edge = Edge::UserSeries {
            user_id: session.user_id,
            series_id,
        };
        let state = toggle(store, &edge).await?;
        self.ctx.events().publish(Topic::UserSeriesChanged);

        Ok(FavoriteToggled {
            is_favorited: state.is_on(),
        })
    }

    async fn write_series_visibility(
        &self,
        raw: &str,
        visibility: Visibility,
    ) -> Result<Visibility, Error> {
        let series_id = require_key(raw, "series id")?;
        let store = self.ctx.store()?;
        let session = self.ctx.session().await?;

        store
            .set_user_series_visibility(session.user_id, &series_id, visibility.to_flag())
            .await?;
        self.ctx.events().publish(Topic::UserSeriesChanged);

        Ok(visibility)
    }
}

async fn favorited_series_ids(
    store: &dyn Store,
    viewer: Option<UserId>,
) -> Result<HashSet<SeriesId>, Error> {
    let Some(user_id) = viewer else {
        return Ok(HashSet::new());
    };

    Ok(store
        .user_series(user_id)
        .await?
        .into_iter()
        .map(|row| row.series_id)
        .collect())
}

/// The user's favorite series, most favorited first. With
/// `include_private` unset, series the user hid are dropped.
pub(crate) async fn favorite_series_of(
    store: &dyn Store,
    user_id: UserId,
    include_private: bool,
) -> Result<Vec<FavoriteSeries>, Error> {
    let rows = store.user_series(user_id).await?;
    let visibility: HashMap<SeriesId, Visibility> = rows
        .into_iter()
        .map(|row| (row.series_id, Visibility::from_flag(row.can_display)))
        .filter(|(_, visibility)| include_private || visibility.is_public())
        .collect();

    let series_ids: Vec<SeriesId> = visibility.keys().cloned().collect();
    let mut series: Vec<FavoriteSeries> = store
        .series(&series_ids)
        .await?
        .into_iter()
        .map(|series| FavoriteSeries {
            visibility: visibility
                .get(&series.series_id)
                .copied()
                .unwrap_or_default(),
            favorite_count: series.favorite_count.unwrap_or_default().max(0),
            series_id: series.series_id,
            title: series.title,
        })
        .collect();
    series.sort_by(|a, b| {
        b.favorite_count
            .cmp(&a.favorite_count)
            .then_with(|| a.title.cmp(&b.title))
    });

    Ok(series)
}
