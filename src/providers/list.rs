use std::collections::{BTreeSet, HashMap, HashSet};

use crate::{
    db::error::DatabaseError,
    error::{Error, ProviderResult},
    events::Topic,
    model::{
        CatalogEntry, FavoriteToggled, ListDetail, ListId, ListRow, ListSummary, MovieId,
        MovieItem, MoviePreview, MovieRow, MyList, OshiToggled, UserId, UserSummary,
    },
    policy::{SortOrder, Visibility},
    store::{Edge, Store},
};

use super::{
    PrimaryListCache, ProviderContext, movie_items, parse_list_id, require_key, toggle,
};

/// Catalog, list detail and the viewer's own list.
#[derive(Debug)]
pub struct OshiListProvider {
    ctx: ProviderContext,
    preview_size: usize,
    primary_list: PrimaryListCache,
}

impl OshiListProvider {
    pub fn new(ctx: ProviderContext, preview_size: usize) -> Self {
        Self {
            ctx,
            preview_size,
            primary_list: PrimaryListCache::default(),
        }
    }

    /// Every list the viewer may read, enriched and sorted.
    #[tracing::instrument(name = "oshi list catalog", skip(self), fields(sort = %sort))]
    pub async fn catalog(&self, sort: SortOrder) -> ProviderResult<Vec<CatalogEntry>> {
        Ok(self.load_catalog(sort).await?)
    }

    #[tracing::instrument(name = "oshi list detail", skip(self), fields(sort = %sort))]
    pub async fn list_detail(&self, list_id: &str, sort: SortOrder) -> ProviderResult<ListDetail> {
        Ok(self.load_detail(list_id, sort).await?)
    }

    #[tracing::instrument(name = "toggle list favorite", skip(self))]
    pub async fn toggle_favorite(&self, list_id: &str) -> ProviderResult<FavoriteToggled> {
        Ok(self.flip_favorite(list_id).await?)
    }

    /// Adds the movie to the viewer's primary list, or removes it.
    #[tracing::instrument(name = "toggle oshi", skip(self))]
    pub async fn toggle_oshi(&self, movie_id: &str) -> ProviderResult<OshiToggled> {
        Ok(self.flip_oshi(movie_id).await?)
    }

    #[tracing::instrument(name = "set list visibility", skip(self), fields(visibility = visibility.as_str()))]
    pub async fn set_visibility(&self, visibility: Visibility) -> ProviderResult<Visibility> {
        Ok(self.write_visibility(visibility).await?)
    }

    #[tracing::instrument(name = "my oshi list", skip(self), fields(sort = %sort))]
    pub async fn my_list(&self, sort: SortOrder) -> ProviderResult<MyList> {
        Ok(self.load_my_list(sort).await?)
    }

    async fn load_catalog(&self, sort: SortOrder) -> Result<Vec<CatalogEntry>, Error> {
        let store = self.ctx.store()?;
        let viewer = self.ctx.viewer().await?;

        let (lists, favorited) =
            futures::try_join!(store.lists(), favorited_list_ids(store, viewer))?;
        let lists: Vec<ListRow> = lists
            .into_iter()
            .filter(|list| list.is_readable_by(viewer))
            .collect();

        let mut entries =
            catalog_entries(store, lists, viewer, &favorited, self.preview_size).await?;
        sort.sort(&mut entries);

        Ok(entries)
    }

    async fn load_detail(&self, raw: &str, sort: SortOrder) -> Result<ListDetail, Error> {
        let list_id = parse_list_id(raw)?;
        let store = self.ctx.store()?;
        let viewer = self.ctx.viewer().await?;

        let (summary, mut items) = futures::try_join!(
            list_summary(store, list_id, viewer),
            self.list_items(store, list_id, viewer)
        )?;
        sort.sort(&mut items);

        Ok(ListDetail { summary, items })
    }

    async fn flip_favorite(&self, raw: &str) -> Result<FavoriteToggled, Error> {
        let list_id = parse_list_id(raw)?;
        let store = self.ctx.store()?;
        let session = self.ctx.session().await?;

        let list = find_list(store, list_id).await?;
        if !list.is_readable_by(Some(session.user_id)) {
            return Err(DatabaseError::NotFound.into());
        }
        if list.user_id == session.user_id {
            return Err(Error::Forbidden(format!(
                "list {list_id} belongs to the viewer"
            )));
        }

        let edge = Edge::UserList {
            user_id: session.user_id,
            list_id,
        };
        let state = toggle(store, &edge).await?;
        self.ctx.events().publish(Topic::OshiListCatalogChanged);

        Ok(FavoriteToggled {
            is_favorited: state.is_on(),
        })
    }

    async fn flip_oshi(&self, raw: &str) -> Result<OshiToggled, Error> {
        let movie_id = require_key(raw, "movie id")?;
        let store = self.ctx.store()?;
        let session = self.ctx.session().await?;

        let list_id = self
            .primary_list
            .resolve(store, session.user_id)
            .await?
            .ok_or(DatabaseError::NotFound)?;
        if store.movies(&[movie_id.clone()]).await?.is_empty() {
            return Err(DatabaseError::NotFound.into());
        }

        let edge = Edge::ListMovie { list_id, movie_id };
        let state = toggle(store, &edge).await?;
        self.ctx.events().publish(Topic::OshiListCatalogChanged);

        Ok(OshiToggled {
            is_oshi: state.is_on(),
        })
    }

    async fn write_visibility(&self, visibility: Visibility) -> Result<Visibility, Error> {
        let store = self.ctx.store()?;
        let session = self.ctx.session().await?;

        let list_id = self
            .primary_list
            .resolve(store, session.user_id)
            .await?
            .ok_or(DatabaseError::NotFound)?;

        store
            .set_list_visibility(list_id, visibility.to_flag())
            .await?;
        self.ctx.events().publish(Topic::OshiListCatalogChanged);

        Ok(visibility)
    }

    async fn load_my_list(&self, sort: SortOrder) -> Result<MyList, Error> {
        let store = self.ctx.store()?;
        let session = self.ctx.session().await?;
        let viewer = Some(session.user_id);

        let list_id = self
            .primary_list
            .resolve(store, session.user_id)
            .await?
            .ok_or(DatabaseError::NotFound)?;

        let (list, mut items) = futures::try_join!(
            find_list(store, list_id),
            self.list_items(store, list_id, viewer)
        )?;
        sort.sort(&mut items);

        Ok(MyList {
            list_id,
            visibility: list.visibility(),
            favorite_count: list.favorite_count.unwrap_or_default().max(0),
            items,
        })
    }

    async fn list_items(
        &self,
        store: &dyn Store,
        list_id: ListId,
        viewer: Option<UserId>,
    ) -> Result<Vec<MovieItem>, Error> {
        let list_ids = [list_id];
        let (members, oshi) = futures::try_join!(
            store.list_movies(&list_ids),
            self.primary_list.oshi_movie_ids(store, viewer)
        )?;
        let movie_ids: Vec<MovieId> = members.into_iter().map(|row| row.movie_id).collect();

        movie_items(store, &movie_ids, &oshi).await
    }
}

pub(crate) async fn find_list(store: &dyn Store, list_id: ListId) -> Result<ListRow, Error> {
    store
        .lists_by_ids(&[list_id])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| DatabaseError::NotFound.into())
}

pub(crate) async fn favorited_list_ids(
    store: &dyn Store,
    viewer: Option<UserId>,
) -> Result<HashSet<ListId>, Error> {
    match viewer {
        Some(user_id) => Ok(store.favorited_list_ids(user_id).await?.into_iter().collect()),
        None => Ok(HashSet::new()),
    }
}

/// A private list reads as missing to anyone but its owner.
async fn list_summary(
    store: &dyn Store,
    list_id: ListId,
    viewer: Option<UserId>,
) -> Result<ListSummary, Error> {
    let list = find_list(store, list_id).await?;
    if !list.is_readable_by(viewer) {
        return Err(DatabaseError::NotFound.into());
    }

    let owner_ids = [list.user_id];
    let (owners, favorited) = futures::try_join!(
        store.users(&owner_ids),
        favorited_list_ids(store, viewer)
    )?;
    let owner = owners
        .first()
        .map(UserSummary::from)
        .unwrap_or_else(|| UserSummary::unknown(list.user_id));

    Ok(ListSummary {
        list_id,
        owner,
        favorite_count: list.favorite_count.unwrap_or_default().max(0),
        visibility: list.visibility(),
        is_favorited: favorited.contains(&list_id),
        is_owner: viewer == Some(list.user_id),
    })
}

/// Builds catalog entries for `lists` with three batched reads: members
/// and owners together, then the member movies.
pub(crate) async fn catalog_entries(
    store: &dyn Store,
    lists: Vec<ListRow>,
    viewer: Option<UserId>,
    favorited: &HashSet<ListId>,
    preview_size: usize,
) -> Result<Vec<CatalogEntry>, Error> {
    if lists.is_empty() {
        return Ok(Vec::new());
    }

    let list_ids: Vec<ListId> = lists.iter().map(|list| list.list_id).collect();
    let owner_ids: Vec<UserId> = lists
        .iter()
        .map(|list| list.user_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let (members, owners) =
        futures::try_join!(store.list_movies(&list_ids), store.users(&owner_ids))?;

    let movie_ids: Vec<MovieId> = members
        .iter()
        .map(|row| row.movie_id.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let movies: HashMap<MovieId, MovieRow> = store
        .movies(&movie_ids)
        .await?
        .into_iter()
        .map(|movie| (movie.movie_id.clone(), movie))
        .collect();
    let owners: HashMap<UserId, UserSummary> = owners
        .iter()
        .map(|owner| (owner.user_id, UserSummary::from(owner)))
        .collect();

    let mut by_list: HashMap<ListId, Vec<&MovieRow>> = HashMap::new();
    for member in &members {
        if let Some(movie) = movies.get(&member.movie_id) {
            by_list.entry(member.list_id).or_default().push(movie);
        }
    }

    Ok(lists
        .into_iter()
        .map(|list| {
            let mut list_movies = by_list.remove(&list.list_id).unwrap_or_default();
            list_movies.sort_by(|a, b| b.update.cmp(&a.update));

            CatalogEntry {
                list_id: list.list_id,
                owner: owners
                    .get(&list.user_id)
                    .cloned()
                    .unwrap_or_else(|| UserSummary::unknown(list.user_id)),
                favorite_count: list.favorite_count.unwrap_or_default().max(0),
                item_count: list_movies.len(),
                previews: list_movies
                    .iter()
                    .take(preview_size)
                    .map(|movie| MoviePreview::from(*movie))
                    .collect(),
                visibility: list.visibility(),
                is_favorited: favorited.contains(&list.list_id),
                is_owner: viewer == Some(list.user_id),
            }
        })
        .collect())
}
