use oshi_sync::{ErrorKind, SortOrder, Topic, Visibility, store::Edge};

use crate::{
    TestState, add_to_list, insert_fake_list, insert_fake_movie, insert_fake_series,
    insert_fake_user, published,
};

#[tokio::test]
async fn series_favorite_round_trip_notifies_each_time() {
    let state = TestState::new();
    let viewer = insert_fake_user(&state.store);
    let series_id = insert_fake_series(&state.store, 12);
    let changed = state.count_events(Topic::UserSeriesChanged);
    let favorites = state.favorites(Some(viewer));

    assert!(favorites.toggle_series_favorite(&series_id).await.unwrap().is_favorited);
    let listed = favorites.favorite_series().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].series_id, series_id);
    assert_eq!(listed[0].favorite_count, 12);
    assert_eq!(listed[0].visibility, Visibility::Private);

    assert!(!favorites.toggle_series_favorite(&series_id).await.unwrap().is_favorited);
    assert!(favorites.favorite_series().await.unwrap().is_empty());
    assert_eq!(published(&changed), 2);
}

#[tokio::test]
async fn unknown_series_cannot_be_favorited() {
    let state = TestState::new();
    let viewer = insert_fake_user(&state.store);

    let error = state
        .favorites(Some(viewer))
        .toggle_series_favorite("no-such-series")
        .await
        .unwrap_err();

    assert_eq!(error, ErrorKind::NotFound);
    assert_eq!(state.store.write_count(), 0);
}

#[tokio::test]
async fn series_visibility_is_written_per_favorite() {
    let state = TestState::new();
    let viewer = insert_fake_user(&state.store);
    let series_id = insert_fake_series(&state.store, 0);
    let favorites = state.favorites(Some(viewer));

    assert_eq!(
        favorites
            .set_series_visibility(&series_id, Visibility::Public)
            .await
            .unwrap_err(),
        ErrorKind::NotFound
    );

    favorites.toggle_series_favorite(&series_id).await.unwrap();
    favorites
        .set_series_visibility(&series_id, Visibility::Public)
        .await
        .unwrap();

    let listed = favorites.favorite_series().await.unwrap();
    assert_eq!(listed[0].visibility, Visibility::Public);
}

#[tokio::test]
async fn favorite_lists_drop_lists_hidden_since() {
    let state = TestState::new();
    let viewer = insert_fake_user(&state.store);
    let owner = insert_fake_user(&state.store);
    let visible = insert_fake_list(&state.store, owner, true, 3);
    let hidden = insert_fake_list(&state.store, insert_fake_user(&state.store), false, 8);
    for list_id in [visible, hidden] {
        state.store.seed_edge(Edge::UserList {
            user_id: viewer,
            list_id,
        });
    }

    let lists = state
        .favorites(Some(viewer))
        .favorite_lists(SortOrder::Popular)
        .await
        .unwrap();

    assert_eq!(lists.len(), 1);
    assert_eq!(lists[0].list_id, visible);
    assert!(lists[0].is_favorited);
}

#[tokio::test]
async fn favorites_page_requires_a_session() {
    let state = TestState::new();

    assert_eq!(
        state.favorites(None).favorite_series().await.unwrap_err(),
        ErrorKind::AuthRequired
    );
    assert_eq!(
        state
            .favorites(None)
            .favorite_lists(SortOrder::Latest)
            .await
            .unwrap_err(),
        ErrorKind::AuthRequired
    );
}

#[tokio::test]
async fn series_detail_sorts_movies_and_marks_viewer_state() {
    let state = TestState::new();
    let viewer = insert_fake_user(&state.store);
    let list_id = insert_fake_list(&state.store, viewer, true, 0);
    let series_id = insert_fake_series(&state.store, 4);
    let older = insert_fake_movie(&state.store, Some(&series_id), 10);
    let newer = insert_fake_movie(&state.store, Some(&series_id), 1);
    insert_fake_movie(&state.store, None, 0);
    add_to_list(&state.store, list_id, &older);
    let favorites = state.favorites(Some(viewer));
    favorites.toggle_series_favorite(&series_id).await.unwrap();

    let detail = favorites
        .series_detail(&series_id, SortOrder::Latest)
        .await
        .unwrap();

    assert!(detail.summary.is_favorited);
    assert_eq!(detail.summary.favorite_count, 4);
    let movies: Vec<_> = detail
        .movies
        .iter()
        .map(|movie| (movie.movie_id.as_str(), movie.is_oshi))
        .collect();
    assert_eq!(movies, vec![(newer.as_str(), false), (older.as_str(), true)]);
}

#[tokio::test]
async fn missing_series_detail_is_not_found() {
    let state = TestState::new();

    let error = state
        .favorites(None)
        .series_detail("nope", SortOrder::Popular)
        .await
        .unwrap_err();

    assert_eq!(error, ErrorKind::NotFound);
}
