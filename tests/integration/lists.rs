use oshi_sync::{
    ErrorKind, Outcome, SortOrder, Topic, Visibility,
    error::RawFailure,
    model::{CatalogEntry, FavoriteToggled},
    providers::{OshiListProvider, ProviderContext},
    store::Edge,
};
use serde_json::json;

use crate::{
    PREVIEW_SIZE, TestState, add_to_list, insert_fake_list, insert_fake_movie, insert_fake_user,
    insert_list, published,
};

#[tokio::test]
async fn favorite_a_list_marks_it_without_touching_the_count() {
    let state = TestState::new();
    let owner = insert_fake_user(&state.store);
    let viewer = insert_fake_user(&state.store);
    insert_list(&state.store, 42, owner, true, 5);
    let lists = state.lists(Some(viewer));

    let outcome: Outcome<FavoriteToggled> = lists.toggle_favorite("42").await.into();
    assert_eq!(
        serde_json::to_value(&outcome).unwrap(),
        json!({"ok": true, "data": {"isFavorited": true}})
    );

    let catalog = lists.catalog(SortOrder::Popular).await.unwrap();
    let entry = catalog.iter().find(|entry| entry.list_id == 42).unwrap();
    assert_eq!(entry.favorite_count, 5);
    assert!(entry.is_favorited);
    assert!(!entry.is_owner);
}

#[tokio::test]
async fn unauthenticated_toggle_writes_nothing() {
    let state = TestState::new();
    let owner = insert_fake_user(&state.store);
    insert_list(&state.store, 42, owner, true, 0);

    let outcome: Outcome<FavoriteToggled> = state.lists(None).toggle_favorite("42").await.into();

    assert_eq!(
        serde_json::to_value(&outcome).unwrap(),
        json!({"ok": false, "error": "auth_required"})
    );
    assert_eq!(state.store.write_count(), 0);
}

#[tokio::test]
async fn missing_store_is_not_configured() {
    let lists = OshiListProvider::new(ProviderContext::default(), PREVIEW_SIZE);

    assert_eq!(
        lists.toggle_favorite("42").await.unwrap_err(),
        ErrorKind::NotConfigured
    );
    assert_eq!(
        lists.catalog(SortOrder::Latest).await.unwrap_err(),
        ErrorKind::NotConfigured
    );
}

#[tokio::test]
async fn malformed_list_id_is_invalid_input() {
    let state = TestState::new();
    let viewer = insert_fake_user(&state.store);
    let lists = state.lists(Some(viewer));

    for raw in ["", "  ", "forty-two", "-3"] {
        assert_eq!(
            lists.toggle_favorite(raw).await.unwrap_err(),
            ErrorKind::InvalidInput,
            "{raw:?}"
        );
    }
    assert_eq!(state.store.write_count(), 0);
}

#[tokio::test]
async fn owner_cannot_favorite_their_own_list() {
    let state = TestState::new();
    let owner = insert_fake_user(&state.store);
    insert_list(&state.store, 7, owner, true, 0);

    let error = state.lists(Some(owner)).toggle_favorite("7").await.unwrap_err();

    assert_eq!(error, ErrorKind::Forbidden);
    assert_eq!(state.store.write_count(), 0);
}

#[tokio::test]
async fn private_list_cannot_be_favorited_by_others() {
    let state = TestState::new();
    let owner = insert_fake_user(&state.store);
    let viewer = insert_fake_user(&state.store);
    insert_list(&state.store, 42, owner, false, 0);
    let changed = state.count_events(Topic::OshiListCatalogChanged);

    let error = state.lists(Some(viewer)).toggle_favorite("42").await.unwrap_err();

    assert_eq!(error, ErrorKind::NotFound);
    assert_eq!(state.store.write_count(), 0);
    assert_eq!(
        state.store.edge_count(&Edge::UserList {
            user_id: viewer,
            list_id: 42,
        }),
        0
    );
    assert_eq!(published(&changed), 0);
}

#[tokio::test]
async fn favorite_toggle_twice_returns_to_start() {
    let state = TestState::new();
    let owner = insert_fake_user(&state.store);
    let viewer = insert_fake_user(&state.store);
    insert_list(&state.store, 42, owner, true, 0);
    let edge = Edge::UserList {
        user_id: viewer,
        list_id: 42,
    };
    let lists = state.lists(Some(viewer));

    assert!(lists.toggle_favorite("42").await.unwrap().is_favorited);
    assert_eq!(state.store.edge_count(&edge), 1);

    assert!(!lists.toggle_favorite("42").await.unwrap().is_favorited);
    assert_eq!(state.store.edge_count(&edge), 0);
}

#[tokio::test]
async fn racing_favorite_from_another_tab_reconciles() {
    let state = TestState::new();
    let owner = insert_fake_user(&state.store);
    let viewer = insert_fake_user(&state.store);
    insert_list(&state.store, 42, owner, true, 0);
    let edge = Edge::UserList {
        user_id: viewer,
        list_id: 42,
    };
    state.store.interleave_after_next_check(edge.clone());

    let toggled = state.lists(Some(viewer)).toggle_favorite("42").await.unwrap();

    assert!(toggled.is_favorited);
    assert_eq!(state.store.edge_count(&edge), 1);
}

#[tokio::test]
async fn catalog_hides_private_lists_from_everyone_but_the_owner() {
    let state = TestState::new();
    let alice = insert_fake_user(&state.store);
    let bob = insert_fake_user(&state.store);
    let private = insert_fake_list(&state.store, alice, false, 0);
    let public = insert_fake_list(&state.store, bob, true, 0);

    let anonymous: Vec<_> = state
        .lists(None)
        .catalog(SortOrder::Popular)
        .await
        .unwrap()
        .into_iter()
        .map(|entry| entry.list_id)
        .collect();
    assert_eq!(anonymous, vec![public]);

    let as_owner = state.lists(Some(alice)).catalog(SortOrder::Popular).await.unwrap();
    let own = as_owner.iter().find(|entry| entry.list_id == private).unwrap();
    assert!(own.is_owner);
    assert_eq!(own.visibility, Visibility::Private);
    assert_eq!(as_owner.len(), 2);
}

#[tokio::test]
async fn catalog_sorts_by_count_then_recency() {
    let state = TestState::new();
    let owner = insert_fake_user(&state.store);
    insert_list(&state.store, 1, owner, true, 10);
    insert_list(&state.store, 2, owner, true, 3);
    insert_list(&state.store, 3, owner, true, 10);
    let lists = state.lists(None);

    let ids = |entries: Vec<CatalogEntry>| -> Vec<i64> {
        entries.into_iter().map(|entry| entry.list_id).collect()
    };

    assert_eq!(ids(lists.catalog(SortOrder::Popular).await.unwrap()), vec![3, 1, 2]);
    assert_eq!(ids(lists.catalog(SortOrder::FavoriteAsc).await.unwrap()), vec![2, 1, 3]);
    assert_eq!(ids(lists.catalog(SortOrder::Latest).await.unwrap()), vec![3, 2, 1]);
    assert_eq!(ids(lists.catalog(SortOrder::Oldest).await.unwrap()), vec![1, 2, 3]);
}

#[tokio::test]
async fn catalog_previews_are_capped() {
    let state = TestState::new();
    let owner = insert_fake_user(&state.store);
    let list_id = insert_fake_list(&state.store, owner, true, 0);
    for days_ago in 0..6 {
        let movie_id = insert_fake_movie(&state.store, None, days_ago);
        add_to_list(&state.store, list_id, &movie_id);
    }

    let catalog = state.lists(None).catalog(SortOrder::Popular).await.unwrap();

    assert_eq!(catalog[0].item_count, 6);
    assert_eq!(catalog[0].previews.len(), PREVIEW_SIZE);
}

#[tokio::test]
async fn private_list_detail_is_not_found_for_others() {
    let state = TestState::new();
    let owner = insert_fake_user(&state.store);
    let viewer = insert_fake_user(&state.store);
    let list_id = insert_fake_list(&state.store, owner, false, 0).to_string();

    let error = state
        .lists(Some(viewer))
        .list_detail(&list_id, SortOrder::Latest)
        .await
        .unwrap_err();
    assert_eq!(error, ErrorKind::NotFound);

    let detail = state
        .lists(Some(owner))
        .list_detail(&list_id, SortOrder::Latest)
        .await
        .unwrap();
    assert!(detail.summary.is_owner);
}

#[tokio::test]
async fn list_detail_marks_the_viewers_oshi() {
    let state = TestState::new();
    let owner = insert_fake_user(&state.store);
    let viewer = insert_fake_user(&state.store);
    let list_id = insert_fake_list(&state.store, owner, true, 0);
    let viewer_list = insert_fake_list(&state.store, viewer, true, 0);
    let shared = insert_fake_movie(&state.store, None, 1);
    let other = insert_fake_movie(&state.store, None, 2);
    add_to_list(&state.store, list_id, &shared);
    add_to_list(&state.store, list_id, &other);
    add_to_list(&state.store, viewer_list, &shared);

    let detail = state
        .lists(Some(viewer))
        .list_detail(&list_id.to_string(), SortOrder::Latest)
        .await
        .unwrap();

    let flags: Vec<_> = detail
        .items
        .iter()
        .map(|item| (item.movie_id.as_str(), item.is_oshi))
        .collect();
    assert_eq!(flags, vec![(shared.as_str(), true), (other.as_str(), false)]);
}

#[tokio::test]
async fn toggle_oshi_edits_the_primary_list_and_notifies() {
    let state = TestState::new();
    let viewer = insert_fake_user(&state.store);
    insert_list(&state.store, 5, viewer, true, 0);
    insert_list(&state.store, 9, viewer, true, 0);
    let movie_id = insert_fake_movie(&state.store, None, 0);
    let changed = state.count_events(Topic::OshiListCatalogChanged);

    let toggled = state.lists(Some(viewer)).toggle_oshi(&movie_id).await.unwrap();

    assert!(toggled.is_oshi);
    assert_eq!(
        state.store.edge_count(&Edge::ListMovie {
            list_id: 5,
            movie_id: movie_id.clone(),
        }),
        1
    );
    assert_eq!(published(&changed), 1);
}

#[tokio::test]
async fn toggle_oshi_without_a_list_is_not_found() {
    let state = TestState::new();
    let viewer = insert_fake_user(&state.store);
    let changed = state.count_events(Topic::OshiListCatalogChanged);

    let error = state.lists(Some(viewer)).toggle_oshi("m1").await.unwrap_err();

    assert_eq!(error, ErrorKind::NotFound);
    assert_eq!(published(&changed), 0);
}

#[tokio::test]
async fn toggle_oshi_unknown_movie_is_not_found() {
    let state = TestState::new();
    let viewer = insert_fake_user(&state.store);
    insert_list(&state.store, 5, viewer, true, 0);
    let changed = state.count_events(Topic::OshiListCatalogChanged);

    let error = state
        .lists(Some(viewer))
        .toggle_oshi("no-such-movie")
        .await
        .unwrap_err();

    assert_eq!(error, ErrorKind::NotFound);
    assert_eq!(state.store.write_count(), 0);
    assert_eq!(
        state.store.edge_count(&Edge::ListMovie {
            list_id: 5,
            movie_id: "no-such-movie".into(),
        }),
        0
    );
    assert_eq!(published(&changed), 0);
}

#[tokio::test]
async fn set_visibility_writes_the_flag_and_notifies() {
    let state = TestState::new();
    let viewer = insert_fake_user(&state.store);
    let list_id = insert_fake_list(&state.store, viewer, false, 0);
    let changed = state.count_events(Topic::OshiListCatalogChanged);
    let lists = state.lists(Some(viewer));

    assert_eq!(
        lists.set_visibility(Visibility::Public).await.unwrap(),
        Visibility::Public
    );
    assert_eq!(state.store.list_row(list_id).unwrap().can_display, Some(true));
    assert_eq!(published(&changed), 1);

    let mine = lists.my_list(SortOrder::Latest).await.unwrap();
    assert_eq!(mine.list_id, list_id);
    assert_eq!(mine.visibility, Visibility::Public);
}

#[tokio::test]
async fn store_failures_are_classified() {
    let state = TestState::new();
    let owner = insert_fake_user(&state.store);
    let viewer = insert_fake_user(&state.store);
    insert_list(&state.store, 42, owner, true, 0);
    state
        .store
        .fail_next(RawFailure::new("JWT expired").with_code("PGRST301"));

    let error = state.lists(Some(viewer)).toggle_favorite("42").await.unwrap_err();

    assert_eq!(error, ErrorKind::AuthRequired);
}
