use oshi_sync::search::{SearchStatus, TitleSearchController};

use crate::{TestState, insert_movie};

fn ids(search: &TitleSearchController) -> Vec<&str> {
    search.results().iter().map(|doc| doc.id.as_str()).collect()
}

#[tokio::test]
async fn applied_queries_reuse_the_fetched_corpus() {
    let state = TestState::new();
    insert_movie(&state.store, "1", "Hero Academia", None, 0);
    insert_movie(&state.store, "2", "One Piece", None, 0);
    let mut search = TitleSearchController::new(Some(state.store.clone()));

    search.set_input("hero");
    search.apply_search().await.unwrap();
    assert_eq!(ids(&search), vec!["1"]);
    assert_eq!(search.status(), SearchStatus::Active);

    search.set_input("piece");
    search.apply_search().await.unwrap();
    assert_eq!(ids(&search), vec!["2"]);

    assert_eq!(state.store.corpus_fetch_count(), 1);
}

#[tokio::test]
async fn matching_ignores_width_case_and_spacing() {
    let state = TestState::new();
    insert_movie(&state.store, "1", "Hero Academia", None, 0);
    let mut search = TitleSearchController::new(Some(state.store.clone()));

    search.set_input("  ＨＥＲＯ   academia ");
    search.apply_search().await.unwrap();

    assert_eq!(ids(&search), vec!["1"]);
    assert_eq!(search.applied_query(), "hero academia");
}

#[tokio::test]
async fn clearing_returns_to_idle_and_keeps_the_corpus() {
    let state = TestState::new();
    insert_movie(&state.store, "1", "Hero Academia", None, 0);
    let mut search = TitleSearchController::new(Some(state.store.clone()));

    search.set_input("hero");
    search.apply_search().await.unwrap();
    search.clear();

    assert_eq!(search.status(), SearchStatus::Idle);
    assert!(search.results().is_empty());
    assert_eq!(search.input(), "");

    search.set_input("aca");
    search.apply_search().await.unwrap();
    assert_eq!(ids(&search), vec!["1"]);
    assert_eq!(state.store.corpus_fetch_count(), 1);
}

#[tokio::test]
async fn separate_controllers_fetch_separately() {
    let state = TestState::new();
    insert_movie(&state.store, "1", "Hero Academia", None, 0);

    for _ in 0..2 {
        let mut search = TitleSearchController::new(Some(state.store.clone()));
        search.set_input("hero");
        search.apply_search().await.unwrap();
    }

    assert_eq!(state.store.corpus_fetch_count(), 2);
}
