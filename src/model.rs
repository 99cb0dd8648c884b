use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidateUrl, ValidationError};

use crate::policy::{Sortable, Visibility};

pub type UserId = Uuid;
pub type ListId = i64;
pub type MovieId = String;
pub type SeriesId = String;

// Rows as the remote store returns them.

#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ListRow {
    pub list_id: ListId,
    pub user_id: UserId,
    pub can_display: Option<bool>,
    pub favorite_count: Option<i64>,
}

impl ListRow {
    pub fn visibility(&self) -> Visibility {
        Visibility::from_flag(self.can_display)
    }

    pub fn is_readable_by(&self, viewer: Option<UserId>) -> bool {
        self.visibility().is_public() || viewer == Some(self.user_id)
    }
}

#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ListMovieRow {
    pub list_id: ListId,
    pub movie_id: MovieId,
}

#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MovieRow {
    pub movie_id: MovieId,
    pub series_id: Option<SeriesId>,
    pub movie_title: String,
    pub url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub update: Option<DateTime<Utc>>,
    pub favorite_count: Option<i64>,
    pub weekday: Option<String>,
}

#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SeriesRow {
    pub series_id: SeriesId,
    pub title: String,
    pub favorite_count: Option<i64>,
}

#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserSeriesRow {
    pub user_id: UserId,
    pub series_id: SeriesId,
    pub can_display: Option<bool>,
}

#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserRow {
    pub user_id: UserId,
    pub name: Option<String>,
    pub icon_url: Option<String>,
    pub x_url: Option<String>,
    pub x_label: Option<String>,
    pub youtube_url: Option<String>,
    pub youtube_label: Option<String>,
    pub other_url: Option<String>,
    pub other_label: Option<String>,
}

impl UserRow {
    pub fn new(user_id: UserId, name: impl Into<String>) -> Self {
        Self {
            user_id,
            name: Some(name.into()),
            icon_url: None,
            x_url: None,
            x_label: None,
            youtube_url: None,
            youtube_label: None,
            other_url: None,
            other_label: None,
        }
    }
}

#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ProfileVisibilityRow {
    pub user_id: UserId,
    pub oshi_list_visibility: Option<bool>,
    pub oshi_series_visibility: Option<bool>,
}

#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct HistoryRow {
    pub user_id: UserId,
    pub movie_id: MovieId,
    pub clicked_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SearchDocument {
    pub id: MovieId,
    pub title: String,
    pub thumbnail_url: Option<String>,
}

// Shapes handed to the view layer.

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub user_id: UserId,
    pub name: Option<String>,
    pub icon_url: Option<String>,
}

impl From<&UserRow> for UserSummary {
    fn from(row: &UserRow) -> Self {
        Self {
            user_id: row.user_id,
            name: row.name.clone(),
            icon_url: row.icon_url.clone(),
        }
    }
}

impl UserSummary {
    pub fn unknown(user_id: UserId) -> Self {
        Self {
            user_id,
            name: None,
            icon_url: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExternalLink {
    pub label: Option<String>,
    pub url: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: UserId,
    pub name: Option<String>,
    pub icon_url: Option<String>,
    pub links: Vec<ExternalLink>,
}

impl From<UserRow> for UserProfile {
    fn from(row: UserRow) -> Self {
        let links = [
            (row.x_url, row.x_label),
            (row.youtube_url, row.youtube_label),
            (row.other_url, row.other_label),
        ]
        .into_iter()
        .filter_map(|(url, label)| url.map(|url| ExternalLink { label, url }))
        .collect();

        Self {
            user_id: row.user_id,
            name: row.name,
            icon_url: row.icon_url,
            links,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MovieItem {
    pub movie_id: MovieId,
    pub series_id: Option<SeriesId>,
    pub title: String,
    pub url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub favorite_count: i64,
    pub weekday: Option<String>,
    pub is_oshi: bool,
}

impl MovieItem {
    pub fn from_row(row: MovieRow, is_oshi: bool) -> Self {
        Self {
            movie_id: row.movie_id,
            series_id: row.series_id,
            title: row.movie_title,
            url: row.url,
            thumbnail_url: row.thumbnail_url,
            published_at: row.update,
            favorite_count: row.favorite_count.unwrap_or_default().max(0),
            weekday: row.weekday,
            is_oshi,
        }
    }
}

impl Sortable for MovieItem {
    fn favorite_count(&self) -> i64 {
        self.favorite_count
    }

    fn recency(&self) -> i64 {
        self.published_at
            .map(|at| at.timestamp_millis())
            .unwrap_or(i64::MIN)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MoviePreview {
    pub movie_id: MovieId,
    pub title: String,
    pub thumbnail_url: Option<String>,
}

impl From<&MovieRow> for MoviePreview {
    fn from(row: &MovieRow) -> Self {
        Self {
            movie_id: row.movie_id.clone(),
            title: row.movie_title.clone(),
            thumbnail_url: row.thumbnail_url.clone(),
        }
    }
}

/// One list as it appears on the catalog and favorites pages.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub list_id: ListId,
    pub owner: UserSummary,
    pub favorite_count: i64,
    pub item_count: usize,
    pub previews: Vec<MoviePreview>,
    pub visibility: Visibility,
    pub is_favorited: bool,
    pub is_owner: bool,
}

impl Sortable for CatalogEntry {
    fn favorite_count(&self) -> i64 {
        self.favorite_count
    }

    // List ids are assigned in creation order.
    fn recency(&self) -> i64 {
        self.list_id
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ListSummary {
    pub list_id: ListId,
    pub owner: UserSummary,
    pub favorite_count: i64,
    pub visibility: Visibility,
    pub is_favorited: bool,
    pub is_owner: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ListDetail {
    pub summary: ListSummary,
    pub items: Vec<MovieItem>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MyList {
    pub list_id: ListId,
    pub visibility: Visibility,
    pub favorite_count: i64,
    pub items: Vec<MovieItem>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteToggled {
    pub is_favorited: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OshiToggled {
    pub is_oshi: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SeriesSummary {
    pub series_id: SeriesId,
    pub title: String,
    pub favorite_count: i64,
    pub is_favorited: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SeriesDetail {
    pub summary: SeriesSummary,
    pub movies: Vec<MovieItem>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteSeries {
    pub series_id: SeriesId,
    pub title: String,
    pub favorite_count: i64,
    pub visibility: Visibility,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProfileVisibility {
    pub oshi_list: Visibility,
    pub oshi_series: Visibility,
}

impl From<Option<ProfileVisibilityRow>> for ProfileVisibility {
    fn from(row: Option<ProfileVisibilityRow>) -> Self {
        match row {
            Some(row) => Self {
                oshi_list: Visibility::from_flag(row.oshi_list_visibility),
                oshi_series: Visibility::from_flag(row.oshi_series_visibility),
            },
            None => Self::default(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileListSection {
    pub list_id: ListId,
    pub favorite_count: i64,
    pub items: Vec<MovieItem>,
}

/// Another user's page. Sections the owner has not opted to show are `None`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePage {
    pub user: UserProfile,
    pub is_owner: bool,
    pub oshi_list: Option<ProfileListSection>,
    pub oshi_series: Option<Vec<FavoriteSeries>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[validate(length(min = 1, max = 50))]
    pub name: Option<String>,
    #[validate(custom(function = "url_or_empty"))]
    pub icon_url: Option<String>,
    #[validate(custom(function = "url_or_empty"))]
    pub x_url: Option<String>,
    #[validate(length(max = 30))]
    pub x_label: Option<String>,
    #[validate(custom(function = "url_or_empty"))]
    pub youtube_url: Option<String>,
    #[validate(length(max = 30))]
    pub youtube_label: Option<String>,
    #[validate(custom(function = "url_or_empty"))]
    pub other_url: Option<String>,
    #[validate(length(max = 30))]
    pub other_label: Option<String>,
}

// An empty string clears the stored link.
fn url_or_empty(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || value.validate_url() {
        return Ok(());
    }

    Err(ValidationError::new("url"))
}

impl ProfileUpdate {
    /// Copies the fields that were sent onto `row`. Empty strings clear.
    pub fn apply_to(&self, row: &mut UserRow) {
        let fields = [
            (&self.name, &mut row.name),
            (&self.icon_url, &mut row.icon_url),
            (&self.x_url, &mut row.x_url),
            (&self.x_label, &mut row.x_label),
            (&self.youtube_url, &mut row.youtube_url),
            (&self.youtube_label, &mut row.youtube_label),
            (&self.other_url, &mut row.other_url),
            (&self.other_label, &mut row.other_label),
        ];

        for (update, current) in fields {
            if let Some(value) = update {
                *current = if value.is_empty() {
                    None
                } else {
                    Some(value.clone())
                };
            }
        }
    }
}

/// Where a view event came from. Suppression is scoped per source.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ViewSource {
    Select,
    Play,
    Navigate,
}

impl ViewSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewSource::Select => "select",
            ViewSource::Play => "play",
            ViewSource::Navigate => "navigate",
        }
    }

    pub fn is_suppressible(&self) -> bool {
        matches!(self, ViewSource::Play)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RecordView {
    pub movie_id: MovieId,
    pub clicked_at: String,
    pub source: ViewSource,
}

impl RecordView {
    pub fn now(movie_id: impl Into<MovieId>, source: ViewSource) -> Self {
        Self {
            movie_id: movie_id.into(),
            clicked_at: Utc::now().to_rfc3339(),
            source,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryReceipt {
    pub history_id: String,
}

impl HistoryReceipt {
    pub fn for_entry(user_id: UserId, movie_id: &str) -> Self {
        Self {
            history_id: format!("{user_id}:{movie_id}"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub movie: MovieItem,
    pub clicked_at: DateTime<Utc>,
}
