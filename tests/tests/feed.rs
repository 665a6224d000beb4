use nook_client::{
    api::{ContentType, Error, ReactionKind},
    Backend, FeedView, ReactionsExt,
};
use tests::fixture;

fn observable(i: &nook_client::api::FeedItem) -> (bool, u64, bool, bool, u64, (bool, u64)) {
    (
        i.is_liked,
        i.engagement.likes,
        i.is_bookmarked,
        i.is_shared,
        i.engagement.shares,
        i.reactions.get(&ReactionKind::heard()),
    )
}

async fn server_item(f: &tests::Fixture) -> nook_client::api::FeedItem {
    f.mock
        .server()
        .fetch_feed(1, 20)
        .expect("fetching feed from mock")
        .items
        .into_iter()
        .find(|i| i.id == f.post.0)
        .expect("post is in the feed")
}

#[tokio::test]
async fn heard_reaches_the_server() {
    let f = fixture();
    let view = FeedView::new(f.mock.clone(), 20);
    view.refresh().await.unwrap();
    assert_eq!(view.snapshot().items.len(), 3);
    let heard = ReactionKind::heard();

    view.toggle_reaction(f.post.0, heard.clone()).await.unwrap();
    assert_eq!(view.item(f.post.0).unwrap().reactions.get(&heard), (true, 1));
    assert_eq!(server_item(&f).await.reactions.get(&heard), (true, 1));

    view.toggle_reaction(f.post.0, heard.clone()).await.unwrap();
    assert_eq!(view.item(f.post.0).unwrap().reactions.get(&heard), (false, 0));
    assert_eq!(server_item(&f).await.reactions.get(&heard), (false, 0));
}

#[tokio::test]
async fn refused_reaction_rolls_back() {
    let f = fixture();
    let view = FeedView::new(f.mock.clone(), 20);
    view.refresh().await.unwrap();
    let before = observable(&view.item(f.topic.0).unwrap());

    f.mock.fail_next(Error::PermissionDenied);
    let err = view
        .toggle_reaction(f.topic.0, ReactionKind::heard())
        .await
        .unwrap_err();
    assert!(matches!(err, nook_client::Error::Api(Error::PermissionDenied)));
    assert_eq!(observable(&view.item(f.topic.0).unwrap()), before);

    f.mock.set_offline(true);
    assert!(view.toggle_like(f.topic.0).await.unwrap_err().is_transport());
    assert!(view.toggle_bookmark(f.topic.0).await.unwrap_err().is_transport());
    assert_eq!(observable(&view.item(f.topic.0).unwrap()), before);
}

#[tokio::test]
async fn shares_count_once() {
    let f = fixture();
    let view = FeedView::new(f.mock.clone(), 20);
    view.refresh().await.unwrap();
    view.share(f.post.0).await.unwrap();
    view.share(f.post.0).await.unwrap();
    assert_eq!(view.item(f.post.0).unwrap().engagement.shares, 1);
    assert_eq!(server_item(&f).await.engagement.shares, 1);
}

#[tokio::test]
async fn nook_items_take_no_reactions() {
    let f = fixture();
    let view = FeedView::new(f.mock.clone(), 20);
    view.refresh().await.unwrap();
    let nook = view.snapshot().items[0].clone();
    assert_eq!(nook.content_type, ContentType::Nook);
    assert!(nook.time_left.is_some());
    let requests = f.mock.requests();
    assert!(matches!(
        view.toggle_reaction(nook.id, ReactionKind::heard()).await,
        Err(nook_client::Error::Unsupported(_))
    ));
    assert_eq!(f.mock.requests(), requests);
}

#[tokio::test]
async fn pages_follow_each_other() {
    let f = fixture();
    let view = FeedView::new(f.mock.clone(), 2);
    view.refresh().await.unwrap();
    assert!(view.snapshot().has_more);
    assert!(view.load_more().await.unwrap());
    assert!(!view.load_more().await.unwrap());
    let feed = view.snapshot();
    assert_eq!(feed.items.len(), 3);
    assert_eq!(feed.page, 2);
    assert_eq!(
        feed.items.iter().map(|i| i.id).collect::<Vec<_>>(),
        f.mock
            .fetch_feed(1, 3)
            .await
            .unwrap()
            .items
            .iter()
            .map(|i| i.id)
            .collect::<Vec<_>>()
    );
}

// Whatever fails and whatever succeeds, once every call returned the local
// state matches the server's.
#[test]
fn local_state_converges_with_server() {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed initializing tokio runtime");
    bolero::check!()
        .with_type::<Vec<(u8, bool)>>()
        .for_each(|ops| {
            runtime.block_on(async {
                let f = fixture();
                let view = FeedView::new(f.mock.clone(), 20);
                view.refresh().await.unwrap();
                for (op, fail) in ops {
                    if *fail {
                        f.mock.drop_next();
                    }
                    let res = match op % 4 {
                        0 => view.toggle_like(f.post.0).await,
                        1 => view.toggle_bookmark(f.post.0).await,
                        2 => view.share(f.post.0).await,
                        _ => view.toggle_reaction(f.post.0, ReactionKind::heard()).await,
                    };
                    assert_eq!(res.is_err(), *fail);
                    assert_eq!(
                        observable(&view.item(f.post.0).unwrap()),
                        observable(&server_item(&f).await)
                    );
                }
            })
        });
}
