use oshi_sync::{
    ErrorKind, Visibility,
    model::{ProfileUpdate, ProfileVisibility, ProfileVisibilityRow, UserId, UserSeriesRow},
};

use crate::{
    TestState, add_to_list, insert_fake_list, insert_fake_movie, insert_fake_series,
    insert_fake_user,
};

struct Fixture {
    state: TestState,
    owner: UserId,
    visitor: UserId,
}

/// An owner with one movie on a public list and two favorite series, one
/// of them hidden.
fn fixture() -> Fixture {
    let state = TestState::new();
    let owner = insert_fake_user(&state.store);
    let visitor = insert_fake_user(&state.store);

    let list_id = insert_fake_list(&state.store, owner, true, 2);
    let movie_id = insert_fake_movie(&state.store, None, 1);
    add_to_list(&state.store, list_id, &movie_id);

    for can_display in [true, false] {
        let series_id = insert_fake_series(&state.store, 1);
        state.store.seed_user_series(UserSeriesRow {
            user_id: owner,
            series_id,
            can_display: Some(can_display),
        });
    }

    Fixture {
        state,
        owner,
        visitor,
    }
}

#[tokio::test]
async fn sections_default_to_private_for_visitors() {
    let Fixture {
        state,
        owner,
        visitor,
    } = fixture();

    let page = state
        .profiles(Some(visitor))
        .profile(&owner.to_string())
        .await
        .unwrap();

    assert!(!page.is_owner);
    assert!(page.oshi_list.is_none());
    assert!(page.oshi_series.is_none());
}

#[tokio::test]
async fn public_sections_show_only_displayable_series() {
    let Fixture {
        state,
        owner,
        visitor,
    } = fixture();
    state.store.seed_profile_visibility(ProfileVisibilityRow {
        user_id: owner,
        oshi_list_visibility: Some(true),
        oshi_series_visibility: Some(true),
    });

    let page = state
        .profiles(Some(visitor))
        .profile(&owner.to_string())
        .await
        .unwrap();

    let list = page.oshi_list.unwrap();
    assert_eq!(list.items.len(), 1);
    assert_eq!(list.favorite_count, 2);
    assert_eq!(page.oshi_series.unwrap().len(), 1);
}

#[tokio::test]
async fn owner_sees_every_section() {
    let Fixture { state, owner, .. } = fixture();

    let page = state
        .profiles(Some(owner))
        .profile(&owner.to_string())
        .await
        .unwrap();

    assert!(page.is_owner);
    assert!(page.oshi_list.is_some());
    assert_eq!(page.oshi_series.unwrap().len(), 2);
}

#[tokio::test]
async fn profile_lookup_validates_the_user_id() {
    let Fixture { state, .. } = fixture();
    let profiles = state.profiles(None);

    assert_eq!(
        profiles.profile("not-a-uuid").await.unwrap_err(),
        ErrorKind::InvalidInput
    );
    assert_eq!(
        profiles
            .profile("6f1c2a1e-8b1e-4f7e-9d55-0a4f0c9c2b11")
            .await
            .unwrap_err(),
        ErrorKind::NotFound
    );
}

#[tokio::test]
async fn visibility_settings_round_trip() {
    let Fixture { state, owner, .. } = fixture();
    let profiles = state.profiles(Some(owner));

    assert_eq!(profiles.visibility().await.unwrap(), ProfileVisibility::default());

    profiles
        .set_visibility(Visibility::Public, Visibility::Private)
        .await
        .unwrap();

    assert_eq!(
        profiles.visibility().await.unwrap(),
        ProfileVisibility {
            oshi_list: Visibility::Public,
            oshi_series: Visibility::Private,
        }
    );
}

#[tokio::test]
async fn profile_update_is_validated_before_writing() {
    let Fixture { state, owner, .. } = fixture();
    let profiles = state.profiles(Some(owner));

    let invalid = ProfileUpdate {
        name: Some(String::new()),
        ..Default::default()
    };
    assert_eq!(
        profiles.update_profile(invalid).await.unwrap_err(),
        ErrorKind::InvalidInput
    );
    assert_eq!(state.store.write_count(), 0);

    let profile = profiles
        .update_profile(ProfileUpdate {
            name: Some("Aki".into()),
            x_url: Some("https://x.com/aki".into()),
            x_label: Some("X".into()),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(profile.name.as_deref(), Some("Aki"));
    assert_eq!(profile.links.len(), 1);
    assert_eq!(profile.links[0].url, "https://x.com/aki");
}
