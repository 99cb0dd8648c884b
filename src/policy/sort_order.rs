use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Canonical catalog orderings. Every input, known or not, lands on one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "Option<String>")]
pub enum SortOrder {
    #[default]
    Popular,
    FavoriteAsc,
    Latest,
    Oldest,
}

impl SortOrder {
    pub fn normalize(input: Option<&str>) -> Self {
        let Some(input) = input else {
            return Self::default();
        };

        match input.trim().to_ascii_lowercase().as_str() {
            "popular" | "popular_desc" | "favorite_desc" => SortOrder::Popular,
            "favorite_asc" | "popular_asc" => SortOrder::FavoriteAsc,
            "latest" => SortOrder::Latest,
            "oldest" => SortOrder::Oldest,
            _ => SortOrder::Popular,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Popular => "popular",
            SortOrder::FavoriteAsc => "favorite_asc",
            SortOrder::Latest => "latest",
            SortOrder::Oldest => "oldest",
        }
    }

    pub fn compare<T: Sortable>(&self, a: &T, b: &T) -> Ordering {
        let by_count = a.favorite_count().cmp(&b.favorite_count());
        let by_recency = a.recency().cmp(&b.recency());

        match self {
            SortOrder::Popular => by_count.reverse().then(by_recency.reverse()),
            SortOrder::FavoriteAsc => by_count.then(by_recency),
            SortOrder::Latest => by_recency.reverse().then(by_count.reverse()),
            SortOrder::Oldest => by_recency.then(by_count),
        }
    }

    pub fn sort<T: Sortable>(&self, items: &mut [T]) {
        items.sort_by(|a, b| self.compare(a, b));
    }
}

impl From<Option<String>> for SortOrder {
    fn from(value: Option<String>) -> Self {
        Self::normalize(value.as_deref())
    }
}

impl From<&str> for SortOrder {
    fn from(value: &str) -> Self {
        Self::normalize(Some(value))
    }
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keys a row exposes to the client-side multi-key sort.
pub trait Sortable {
    fn favorite_count(&self) -> i64;

    /// Larger is newer.
    fn recency(&self) -> i64;
}
