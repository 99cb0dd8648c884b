use validator::Validate;

use crate::{
    db::error::DatabaseError,
    error::{Error, ProviderResult},
    model::{
        MovieId, ProfileListSection, ProfilePage, ProfileUpdate, ProfileVisibility,
        ProfileVisibilityRow, UserId, UserProfile,
    },
    policy::Visibility,
    store::Store,
};

use super::{
    PrimaryListCache, ProviderContext, favorites::favorite_series_of, list::find_list,
    movie_items, parse_user_id,
};

/// User pages and the viewer's own profile settings.
#[derive(Debug)]
pub struct ProfileProvider {
    ctx: ProviderContext,
    primary_list: PrimaryListCache,
}

impl ProfileProvider {
    pub fn new(ctx: ProviderContext) -> Self {
        Self {
            ctx,
            primary_list: PrimaryListCache::default(),
        }
    }

    /// A user's page. Each section is present only when its owner made it
    /// public, or the viewer is that owner.
    #[tracing::instrument(name = "user profile", skip(self))]
    pub async fn profile(&self, user_id: &str) -> ProviderResult<ProfilePage> {
        Ok(self.load_profile(user_id).await?)
    }

    #[tracing::instrument(name = "profile visibility", skip(self))]
    pub async fn visibility(&self) -> ProviderResult<ProfileVisibility> {
        Ok(self.load_visibility().await?)
    }

    #[tracing::instrument(
        name = "set profile visibility",
        skip(self),
        fields(oshi_list = oshi_list.as_str(), oshi_series = oshi_series.as_str())
    )]
    pub async fn set_visibility(
        &self,
        oshi_list: Visibility,
        oshi_series: Visibility,
    ) -> ProviderResult<ProfileVisibility> {
        Ok(self.write_visibility(oshi_list, oshi_series).await?)
    }

    #[tracing::instrument(name = "update profile", skip_all)]
    pub async fn update_profile(&self, update: ProfileUpdate) -> ProviderResult<UserProfile> {
        Ok(self.write_profile(update).await?)
    }

    async fn load_profile(&self, raw: &str) -> Result<ProfilePage, Error> {
        let user_id = parse_user_id(raw)?;
        let store = self.ctx.store()?;
        let viewer = self.ctx.viewer().await?;
        let is_owner = viewer == Some(user_id);

        let user_ids = [user_id];
        let (users, visibility) = futures::try_join!(
            store.users(&user_ids),
            store.profile_visibility(user_id)
        )?;
        let user = users.into_iter().next().ok_or(DatabaseError::NotFound)?;
        let visibility = ProfileVisibility::from(visibility);

        let oshi_list = if is_owner || visibility.oshi_list.is_public() {
            self.list_section(store, user_id, viewer).await?
        } else {
            None
        };

        let oshi_series = if is_owner || visibility.oshi_series.is_public() {
            Some(favorite_series_of(store, user_id, is_owner).await?)
        } else {
            None
        };

        Ok(ProfilePage {
            user: UserProfile::from(user),
            is_owner,
            oshi_list,
            oshi_series,
        })
    }

    /// The owner's primary list, unless the list itself is private to the
    /// viewer.
    async fn list_section(
        &self,
        store: &dyn Store,
        owner: UserId,
        viewer: Option<UserId>,
    ) -> Result<Option<ProfileListSection>, Error> {
        let Some(list_id) = store.primary_list_id(owner).await? else {
            return Ok(None);
        };

        let list = find_list(store, list_id).await?;
        if !list.is_readable_by(viewer) {
            return Ok(None);
        }

        let list_ids = [list_id];
        let (members, oshi) = futures::try_join!(
            store.list_movies(&list_ids),
            self.primary_list.oshi_movie_ids(store, viewer)
        )?;
        let movie_ids: Vec<MovieId> = members.into_iter().map(|row| row.movie_id).collect();

        Ok(Some(ProfileListSection {
            list_id,
            favorite_count: list.favorite_count.unwrap_or_default().max(0),
            items: movie_items(store, &movie_ids, &oshi).await?,
        }))
    }

    async fn load_visibility(&self) -> Result<ProfileVisibility, Error> {
        let store = self.ctx.store()?;
        let session = self.ctx.session().await?;

        Ok(store.profile_visibility(session.user_id).await?.into())
    }

    async fn write_visibility(
        &self,
        oshi_list: Visibility,
        oshi_series: Visibility,
    ) -> Result<ProfileVisibility, Error> {
        let store = self.ctx.store()?;
        let session = self.ctx.session().await?;

        let row = ProfileVisibilityRow {
            user_id: session.user_id,
            oshi_list_visibility: Some(oshi_list.to_flag()),
            oshi_series_visibility: Some(oshi_series.to_flag()),
        };
        store.upsert_profile_visibility(&row).await?;

        Ok(ProfileVisibility {
            oshi_list,
            oshi_series,
        })
    }

    async fn write_profile(&self, update: ProfileUpdate) -> Result<UserProfile, Error> {
        update.validate().map_err(Error::Validation)?;
        let store = self.ctx.store()?;
        let session = self.ctx.session().await?;

        let user = store.update_user_profile(session.user_id, &update).await?;

        Ok(UserProfile::from(user))
    }
}
