use chrono::{DateTime, Duration, Utc};
use fake::{
    Fake,
    faker::{lorem::en::Words, name::en::Name},
};
use oshi_sync::{
    model::{ListId, ListRow, MovieId, MovieRow, SeriesId, SeriesRow, UserId, UserRow},
    store::{Edge, MemoryStore},
};
use rand::Rng;
use uuid::Uuid;

pub fn insert_fake_user(store: &MemoryStore) -> UserId {
    let user_id = Uuid::new_v4();
    store.seed_user(UserRow::new(user_id, Name().fake::<String>()));

    user_id
}

pub fn insert_fake_list(
    store: &MemoryStore,
    owner: UserId,
    can_display: bool,
    favorite_count: i64,
) -> ListId {
    let list_id = rand::rng().random_range(1..1_000_000_000);
    insert_list(store, list_id, owner, can_display, favorite_count);

    list_id
}

pub fn insert_list(
    store: &MemoryStore,
    list_id: ListId,
    owner: UserId,
    can_display: bool,
    favorite_count: i64,
) {
    store.seed_list(ListRow {
        list_id,
        user_id: owner,
        can_display: Some(can_display),
        favorite_count: Some(favorite_count),
    });
}

/// A movie published `days_ago` days before now.
pub fn insert_fake_movie(store: &MemoryStore, series_id: Option<&str>, days_ago: i64) -> MovieId {
    let movie_id = format!("movie-{}", Uuid::new_v4());
    insert_movie(store, &movie_id, &fake_title(), series_id, days_ago);

    movie_id
}

pub fn insert_movie(
    store: &MemoryStore,
    movie_id: &str,
    title: &str,
    series_id: Option<&str>,
    days_ago: i64,
) {
    let published: DateTime<Utc> = Utc::now() - Duration::days(days_ago);
    let favorite_count: i64 = rand::rng().random_range(0..100);

    store.seed_movie(MovieRow {
        movie_id: movie_id.to_string(),
        series_id: series_id.map(str::to_string),
        movie_title: title.to_string(),
        url: Some(format!("https://video.example.com/{movie_id}")),
        thumbnail_url: Some(format!("https://img.example.com/{movie_id}.jpg")),
        update: Some(published),
        favorite_count: Some(favorite_count),
        weekday: None,
    });
}

pub fn insert_fake_series(store: &MemoryStore, favorite_count: i64) -> SeriesId {
    let series_id = format!("series-{}", Uuid::new_v4());
    store.seed_series(SeriesRow {
        series_id: series_id.clone(),
        title: fake_title(),
        favorite_count: Some(favorite_count),
    });

    series_id
}

pub fn add_to_list(store: &MemoryStore, list_id: ListId, movie_id: &str) {
    store.seed_edge(Edge::ListMovie {
        list_id,
        movie_id: movie_id.to_string(),
    });
}

fn fake_title() -> String {
    Words(2..4).fake::<Vec<String>>().join(" ")
}
