use nook_client::{api::UserId, load_profile, ProfileState, ProfileView};
use tests::fixture;

#[tokio::test]
async fn follow_round_trip() {
    let f = fixture();
    f.mock.server().add_badge(f.bob, "Early bird").unwrap();
    let state = ProfileState::new(f.mock.clone(), f.bob);
    state.load().await;
    let profile = match state.view() {
        ProfileView::Loaded(p) => p,
        v => panic!("unexpected {v:?}"),
    };
    assert_eq!(profile.user.username, "Bob");
    assert_eq!(profile.badges.len(), 1);
    assert!(!profile.follow.is_following);

    assert!(state.toggle_follow().await.unwrap());
    assert_eq!(f.mock.server().fetch_profile_stats(f.bob).unwrap().followers, 1);
    assert_eq!(f.mock.server().fetch_profile_stats(f.me).unwrap().following, 1);

    f.mock.set_offline(true);
    assert!(state.toggle_follow().await.is_err());
    match state.view() {
        ProfileView::Loaded(p) => {
            assert!(p.follow.is_following);
            assert_eq!(p.stats.followers, 1);
        }
        v => panic!("unexpected {v:?}"),
    }
}

#[tokio::test]
async fn unreachable_profile_cannot_load() {
    let f = fixture();
    f.mock.set_offline(true);
    assert_eq!(load_profile(&*f.mock, f.bob).await, ProfileView::CouldNotLoad);
    assert_eq!(f.mock.requests(), 4);
}

#[tokio::test]
async fn unknown_user_cannot_load() {
    let f = fixture();
    let state = ProfileState::new(f.mock.clone(), UserId(nook_client::api::Uuid::new_v4()));
    assert_eq!(state.view(), ProfileView::Loading);
    state.load().await;
    assert_eq!(state.view(), ProfileView::CouldNotLoad);
}

#[tokio::test]
async fn cannot_follow_yourself() {
    let f = fixture();
    let state = ProfileState::new(f.mock.clone(), f.me);
    state.load().await;
    let err = state.toggle_follow().await.unwrap_err();
    assert_eq!(err.user_message(), "you cannot follow yourself");
}
