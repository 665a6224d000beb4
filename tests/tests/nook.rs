use chrono::{Duration, Utc};
use nook_client::{
    api::{CommentTarget, NewComment, NookFilter, NookId, ReactionKind, Uuid},
    fetch_suggestions, load_nook, Backend, ClientConfig, Key, MentionComposer, NookBrowser,
    NookDetail, ReactionsExt, ThreadView,
};
use tests::{fixture, new_nook, Fixture};

fn messages(f: &Fixture) -> ThreadView<nook_mock_server::SharedMock> {
    ThreadView::new(f.mock.clone(), CommentTarget::Nook(f.nook), f.me, "Anonymous")
}

#[tokio::test]
async fn sent_message_replaces_its_provisional_entry() {
    let f = fixture();
    let view = messages(&f);
    view.refresh().await.unwrap();
    assert_eq!(view.snapshot().total, 0);

    let id = view.post(NewComment::new("anyone else panicking?")).await.unwrap();
    let thread = view.snapshot();
    assert_eq!(thread.comments.len(), 1);
    assert_eq!(thread.total, 1);
    assert_eq!(thread.comments[0].id, id);
    assert!(!thread.is_provisional(id));

    view.refresh().await.unwrap();
    assert_eq!(view.snapshot().comments, thread.comments);
}

#[tokio::test]
async fn message_to_expired_nook_is_removed() {
    let f = fixture();
    let view = messages(&f);
    view.refresh().await.unwrap();
    view.post(NewComment::new("first")).await.unwrap();

    f.mock.server().expire_nook(f.nook).unwrap();
    let err = view.post(NewComment::new("second")).await.unwrap_err();
    assert_eq!(err.user_message(), "Nook has expired");
    let thread = view.snapshot();
    assert_eq!(thread.total, 1);
    assert_eq!(thread.comments.len(), 1);
    assert_eq!(thread.comments[0].text, "first");
}

#[tokio::test]
async fn replies_form_a_tree() {
    let f = fixture();
    let view = messages(&f);
    view.refresh().await.unwrap();
    let root = view.post(NewComment::new("root")).await.unwrap();
    let mut reply = NewComment::new("reply");
    reply.parent_id = Some(root);
    let reply = view.post(reply).await.unwrap();

    let thread = view.snapshot();
    assert_eq!(thread.index().walk(), &[(0, root), (1, reply)]);

    // the server refuses replies to comments it does not know
    let mut lost = NewComment::new("lost");
    lost.parent_id = Some(nook_client::api::CommentId(Uuid::new_v4()));
    assert!(view.post(lost).await.is_err());
    assert_eq!(view.snapshot().total, 2);
}

#[tokio::test]
async fn message_reactions_roll_back_without_refetch() {
    let f = fixture();
    let view = messages(&f);
    view.refresh().await.unwrap();
    let id = view.post(NewComment::new("hang in there")).await.unwrap();
    let heard = ReactionKind::heard();

    view.toggle_reaction(id, heard.clone()).await.unwrap();
    let server = f.mock.list_comments(CommentTarget::Nook(f.nook)).await.unwrap();
    assert_eq!(server[0].reactions.get(&heard), (true, 1));

    f.mock.drop_next();
    let requests = f.mock.requests();
    assert!(view.toggle_reaction(id, heard.clone()).await.is_err());
    assert_eq!(f.mock.requests(), requests + 1);
    assert_eq!(view.comment(id).unwrap().reactions.get(&heard), (true, 1));
}

#[tokio::test]
async fn composed_mentions_are_sent() {
    let f = fixture();
    let config = ClientConfig::default();
    let mut composer = MentionComposer::new(&config);
    let t0 = Utc::now();
    composer.set_input("thanks @bo", 10, t0);
    let q = composer.due(t0 + config.mention_debounce).unwrap();
    let users = fetch_suggestions(&*f.mock, &q, config.mention_search_limit)
        .await
        .unwrap();
    assert!(composer.receive(&q, users));
    composer.on_key(Key::Enter);
    assert_eq!(composer.text(), "thanks @Bob ");

    let view = messages(&f);
    let mut message = NewComment::new(composer.text());
    message.mentioned_user_ids = composer.mentioned_user_ids();
    let id = view.post(message).await.unwrap();
    assert_eq!(view.comment(id).unwrap().mentioned_user_ids, vec![f.bob]);
}

#[tokio::test]
async fn browsing_joining_and_leaving() {
    let f = fixture();
    f.mock.server().create_nook(new_nook("Other")).unwrap();
    let browser = NookBrowser::new(f.mock.clone());
    browser
        .refresh(NookFilter {
            hashtag: Some(String::from("#exams")),
            ..NookFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(browser.nooks().len(), 2);

    browser.leave(f.nook).await.unwrap();
    let n = browser.snapshot().nook(f.nook).cloned().unwrap();
    assert!(!n.is_member);
    assert_eq!(n.member_count, 0);
    assert!(f.mock.nook_members(f.nook).await.unwrap().is_empty());

    f.mock.set_offline(true);
    assert!(browser.join(f.nook).await.is_err());
    assert!(!browser.snapshot().nook(f.nook).unwrap().is_member);
    f.mock.set_offline(false);

    let created = browser.create(new_nook("Fresh")).await.unwrap();
    assert_eq!(browser.nooks()[0], created);
    assert!(created.expires_at > Utc::now() + Duration::hours(23));
}

#[tokio::test]
async fn missing_and_expired_nooks_are_not_found() {
    let f = fixture();
    match load_nook(&*f.mock, f.nook).await {
        NookDetail::Loaded { nook, members } => {
            assert_eq!(nook.id, f.nook);
            assert_eq!(members.len(), 1);
        }
        d => panic!("unexpected {d:?}"),
    }
    assert_eq!(
        load_nook(&*f.mock, NookId(Uuid::new_v4())).await,
        NookDetail::NotFound
    );
    f.mock.server().expire_nook(f.nook).unwrap();
    assert_eq!(load_nook(&*f.mock, f.nook).await, NookDetail::NotFound);
}
