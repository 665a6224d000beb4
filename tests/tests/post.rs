use nook_client::{
    api::{CommentTarget, ContentType, NewComment, NewPost, PostId, Uuid},
    load_post, Backend, FeedView, PostDetail, ThreadView,
};
use tests::fixture;

#[tokio::test]
async fn post_loads_with_its_thread() {
    let f = fixture();
    let thread = ThreadView::new(f.mock.clone(), CommentTarget::Post(f.post), f.me, "me");
    let root = thread.post(NewComment::new("so proud")).await.unwrap();
    let mut reply = NewComment::new("thanks!");
    reply.parent_id = Some(root);
    let reply = thread.post(reply).await.unwrap();

    match load_post(&*f.mock, f.post).await {
        PostDetail::Loaded {
            post,
            comments,
            index,
        } => {
            assert_eq!(post.id, f.post);
            assert_eq!(post.owner_id, f.me);
            assert_eq!(comments.len(), 2);
            assert_eq!(index.walk(), &[(0, root), (1, reply)]);
        }
        d => panic!("unexpected {d:?}"),
    }
}

#[tokio::test]
async fn unknown_or_unreachable_post_is_not_found() {
    let f = fixture();
    assert_eq!(
        load_post(&*f.mock, PostId(Uuid::new_v4())).await,
        PostDetail::NotFound
    );

    f.mock.set_offline(true);
    let before = f.mock.requests();
    assert_eq!(load_post(&*f.mock, f.post).await, PostDetail::NotFound);
    assert_eq!(f.mock.requests(), before + 2);
}

#[tokio::test]
async fn published_then_deleted() {
    let f = fixture();
    let view = FeedView::new(f.mock.clone(), 20);
    view.refresh().await.unwrap();

    let post = view
        .publish(NewPost {
            body: String::from("Three weeks without a panic attack"),
            mentioned_user_ids: Vec::new(),
        })
        .await
        .unwrap();
    let feed = view.snapshot();
    assert_eq!(feed.items.len(), 4);
    assert_eq!(feed.items[0].id, post.id.0);
    assert_eq!(feed.items[0].content_type, ContentType::Post);

    view.delete_post(post.id).await.unwrap();
    assert!(view.item(post.id.0).is_none());
    assert_eq!(load_post(&*f.mock, post.id).await, PostDetail::NotFound);
    assert!(f.mock.fetch_post(post.id).await.unwrap_err().is_not_found());
}
