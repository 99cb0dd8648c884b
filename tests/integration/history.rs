use std::time::Duration;

use chrono::{TimeZone, Utc};
use oshi_sync::{
    ErrorKind,
    model::{RecordView, ViewSource},
    providers::HistoryRecorder,
};

use crate::{TestState, insert_fake_movie, insert_fake_user};

fn view(movie_id: &str, source: ViewSource) -> RecordView {
    RecordView::now(movie_id, source)
}

#[tokio::test]
async fn repeated_play_is_written_once() {
    let state = TestState::new();
    let viewer = insert_fake_user(&state.store);
    let history = state.history(Some(viewer));

    let first = history.record_view(view("m1", ViewSource::Play)).await.unwrap();
    let second = history.record_view(view("m1", ViewSource::Play)).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.history_id, format!("{viewer}:m1"));
    assert_eq!(state.store.write_count(), 1);

    history
        .record_view(view("m1", ViewSource::Navigate))
        .await
        .unwrap();
    assert_eq!(state.store.write_count(), 2);
}

#[tokio::test]
async fn suppression_is_scoped_to_movie_and_source() {
    let state = TestState::new();
    let viewer = insert_fake_user(&state.store);
    let history = state.history(Some(viewer));

    history.record_view(view("m1", ViewSource::Play)).await.unwrap();
    history.record_view(view("m2", ViewSource::Play)).await.unwrap();
    history.record_view(view("m1", ViewSource::Select)).await.unwrap();
    history.record_view(view("m1", ViewSource::Select)).await.unwrap();

    assert_eq!(state.store.write_count(), 4);
}

#[tokio::test]
async fn plays_outside_the_window_are_written() {
    let state = TestState::new();
    let viewer = insert_fake_user(&state.store);
    let history = HistoryRecorder::new(state.context(Some(viewer)), Duration::ZERO);

    history.record_view(view("m1", ViewSource::Play)).await.unwrap();
    history.record_view(view("m1", ViewSource::Play)).await.unwrap();

    assert_eq!(state.store.write_count(), 2);
}

#[tokio::test]
async fn repeat_view_overwrites_the_timestamp() {
    let state = TestState::new();
    let viewer = insert_fake_user(&state.store);
    let history = state.history(Some(viewer));

    for clicked_at in ["2024-05-01T10:00:00Z", "2024-05-02T10:00:00Z"] {
        history
            .record_view(RecordView {
                movie_id: "m1".into(),
                clicked_at: clicked_at.into(),
                source: ViewSource::Select,
            })
            .await
            .unwrap();
    }

    assert_eq!(
        state.store.history_entry(viewer, "m1"),
        Some(Utc.with_ymd_and_hms(2024, 5, 2, 10, 0, 0).unwrap())
    );
}

#[tokio::test]
async fn record_view_validates_before_resolving_the_session() {
    let state = TestState::new();
    let history = state.history(None);

    let blank_movie = history.record_view(view(" ", ViewSource::Select)).await;
    let blank_time = history
        .record_view(RecordView {
            movie_id: "m1".into(),
            clicked_at: String::new(),
            source: ViewSource::Select,
        })
        .await;

    assert_eq!(blank_movie.unwrap_err(), ErrorKind::InvalidInput);
    assert_eq!(blank_time.unwrap_err(), ErrorKind::InvalidInput);
    assert_eq!(
        history
            .record_view(view("m1", ViewSource::Play))
            .await
            .unwrap_err(),
        ErrorKind::AuthRequired
    );
    assert_eq!(state.store.write_count(), 0);
}

#[tokio::test]
async fn recent_history_is_newest_first() {
    let state = TestState::new();
    let viewer = insert_fake_user(&state.store);
    let older = insert_fake_movie(&state.store, None, 3);
    let newer = insert_fake_movie(&state.store, None, 5);
    let history = state.history(Some(viewer));

    for (movie_id, clicked_at) in [
        (&older, "2024-05-01T10:00:00Z"),
        (&newer, "2024-05-03T10:00:00Z"),
    ] {
        history
            .record_view(RecordView {
                movie_id: movie_id.clone(),
                clicked_at: clicked_at.into(),
                source: ViewSource::Select,
            })
            .await
            .unwrap();
    }

    let recent = history.recent(10).await.unwrap();
    let ids: Vec<_> = recent.iter().map(|item| item.movie.movie_id.as_str()).collect();
    assert_eq!(ids, vec![newer.as_str(), older.as_str()]);

    assert_eq!(history.recent(0).await.unwrap_err(), ErrorKind::InvalidInput);
}
