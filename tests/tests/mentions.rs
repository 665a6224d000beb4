use nook_client::{tokenize, ClientConfig, MentionResolver, Segment};
use tests::fixture;

#[tokio::test]
async fn resolves_exact_usernames_only() {
    let f = fixture();
    let resolver = MentionResolver::new(f.mock.clone(), &ClientConfig::default());

    let bob = resolver.resolve("bob").await.unwrap().unwrap();
    assert_eq!(bob.id, f.bob);
    assert_eq!(resolver.resolve("ALICE").await.unwrap().unwrap().id, f.alice);
    assert_eq!(resolver.resolve("bo").await.unwrap(), None);
    assert_eq!(resolver.resolve("carol").await.unwrap(), None);

    let requests = f.mock.requests();
    assert_eq!(resolver.resolve("Bob").await.unwrap().unwrap().id, f.bob);
    assert_eq!(f.mock.requests(), requests);
}

#[tokio::test]
async fn resolution_failures_surface() {
    let f = fixture();
    let resolver = MentionResolver::new(f.mock.clone(), &ClientConfig::default());
    f.mock.set_offline(true);
    assert!(resolver.resolve("bob").await.unwrap_err().is_transport());
    f.mock.set_offline(false);
    assert!(resolver.resolve("bob").await.unwrap().is_some());
}

#[tokio::test]
async fn rendered_text_links_known_users() {
    let f = fixture();
    let resolver = MentionResolver::new(f.mock.clone(), &ClientConfig::default());
    let text = "@alice told @nobody to ping bob@example.com";
    let mut linked = Vec::new();
    for s in tokenize(text) {
        if let Segment::Mention(u) = &s {
            linked.push((u.clone(), resolver.resolve(u).await.unwrap().map(|u| u.id)));
        }
    }
    assert_eq!(
        linked,
        vec![
            (String::from("alice"), Some(f.alice)),
            (String::from("nobody"), None)
        ]
    );
}
