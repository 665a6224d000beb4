//! Seeded mock servers shared by the integration tests

use std::sync::Arc;

use nook_client::api::{
    NewNook, NewPost, NookId, PostId, Scope, Temperature, TopicId, Urgency, UserId,
};
use nook_mock_server::{MockServer, SharedMock};

pub fn init_tracing() {
    if std::env::var("RUST_LOG").is_ok() {
        // several tests of the same binary may race to install it
        let _ = tracing_subscriber::fmt::try_init();
    }
}

pub struct Fixture {
    pub mock: Arc<SharedMock>,
    pub me: UserId,
    pub bob: UserId,
    pub alice: UserId,
    pub post: PostId,
    pub topic: TopicId,
    pub nook: NookId,
}

pub fn new_nook(title: &str) -> NewNook {
    NewNook {
        title: String::from(title),
        description: String::from("A place to vent before finals"),
        urgency: Urgency::High,
        scope: Scope::Local,
        temperature: Temperature::Warm,
        hashtags: vec![String::from("exams")],
    }
}

/// Users `me`, `Bob` and `alice`, a post by `me`, a topic by Bob, and a nook
pub fn fixture() -> Fixture {
    init_tracing();
    let mut server = MockServer::new("me");
    let me = server.me();
    let bob = server.add_user("Bob", "Bob Builder");
    let alice = server.add_user("alice", "Alice");
    let topic = server
        .add_topic(bob, "Sleep", "How do you all sleep before exams?")
        .expect("adding topic");
    let post = server
        .create_post(NewPost {
            body: String::from("I passed my exam!"),
            mentioned_user_ids: Vec::new(),
        })
        .expect("creating post")
        .id;
    let nook = server
        .create_nook(new_nook("Exam stress"))
        .expect("creating nook")
        .id;
    Fixture {
        mock: Arc::new(SharedMock::new(server)),
        me,
        bob,
        alice,
        post,
        topic,
        nook,
    }
}
