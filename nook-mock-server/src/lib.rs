use std::{
    collections::{BTreeMap, BTreeSet, VecDeque},
    sync::Arc,
};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use nook_client::{
    api::{
        Author, Badge, Comment, CommentId, CommentTarget, ContentType, Engagement, Error,
        FeedItem, FeedPage, FollowStatus, MentionUser, NewComment, NewNook, NewPost, Nook,
        NookFilter, NookId, NookMember, NookSort, Post, PostId, ProfileStats, ReactionKind,
        ReactionTarget, Reactions, Time, TopicId, User, UserId, Uuid,
    },
    format, Backend, FeedItemExt, ReactionsExt,
};
use parking_lot::Mutex;

/// How long a nook lives after being created
pub const NOOK_LIFETIME_HOURS: i64 = 24;

/// In-memory stand-in for the REST server, seen by a single logged-in user
pub struct MockServer {
    me: UserId,
    users: BTreeMap<UserId, MockUser>,
    follows: BTreeSet<(UserId, UserId)>,

    // newest last
    feed: Vec<FeedItem>,
    comments: Vec<Comment>,
    nooks: BTreeMap<NookId, MockNook>,
}

#[derive(Debug)]
struct MockUser {
    user: User,
    badges: Vec<Badge>,
}

#[derive(Debug)]
struct MockNook {
    nook: Nook,
    members: Vec<NookMember>,
}

impl MockNook {
    fn is_expired(&self, now: Time) -> bool {
        self.nook.expires_at <= now
    }
}

fn expired() -> Error {
    Error::Validation(String::from("Nook has expired"))
}

impl MockServer {
    /// Create a server whose session belongs to a fresh user named `me`
    pub fn new(me: &str) -> MockServer {
        let mut res = MockServer {
            me: UserId::stub(),
            users: BTreeMap::new(),
            follows: BTreeSet::new(),
            feed: Vec::new(),
            comments: Vec::new(),
            nooks: BTreeMap::new(),
        };
        res.me = res.add_user(me, me);
        res
    }

    pub fn me(&self) -> UserId {
        self.me
    }

    pub fn add_user(&mut self, username: &str, display_name: &str) -> UserId {
        let id = UserId(Uuid::new_v4());
        self.users.insert(
            id,
            MockUser {
                user: User {
                    id,
                    username: String::from(username),
                    display_name: String::from(display_name),
                    avatar_url: None,
                    bio: None,
                    joined: Utc::now(),
                },
                badges: Vec::new(),
            },
        );
        id
    }

    pub fn add_badge(&mut self, user: UserId, name: &str) -> Result<(), Error> {
        let u = self.users.get_mut(&user).ok_or(Error::NotFound)?;
        u.badges.push(Badge {
            name: String::from(name),
            description: String::new(),
            awarded: Utc::now(),
        });
        Ok(())
    }

    fn author(&self, user: UserId) -> Result<Author, Error> {
        let u = &self.users.get(&user).ok_or(Error::NotFound)?.user;
        Ok(Author {
            id: u.id,
            username: u.username.clone(),
            display_name: u.display_name.clone(),
            avatar_url: u.avatar_url.clone(),
        })
    }

    fn push_item(
        &mut self,
        id: Uuid,
        content_type: ContentType,
        author: Option<Author>,
        title: Option<String>,
        body: String,
    ) {
        self.feed.push(FeedItem {
            id,
            content_type,
            author,
            title,
            body,
            date: Utc::now(),
            engagement: Engagement::default(),
            is_liked: false,
            is_bookmarked: false,
            is_shared: false,
            reactions: Reactions::default(),
            hashtags: Vec::new(),
            time_left: None,
        });
    }

    /// Add a topic started by `owner` to the feed
    pub fn add_topic(&mut self, owner: UserId, title: &str, body: &str) -> Result<TopicId, Error> {
        let author = self.author(owner)?;
        let id = TopicId(Uuid::new_v4());
        self.push_item(
            id.0,
            ContentType::Topic,
            Some(author),
            Some(String::from(title)),
            String::from(body),
        );
        Ok(id)
    }

    /// Make a nook expire right away
    pub fn expire_nook(&mut self, id: NookId) -> Result<(), Error> {
        let n = self.nooks.get_mut(&id).ok_or(Error::NotFound)?;
        n.nook.expires_at = Utc::now() - Duration::seconds(1);
        Ok(())
    }

    fn item(&self, content_type: ContentType, id: Uuid) -> Result<&FeedItem, Error> {
        self.feed
            .iter()
            .find(|i| i.id == id && i.content_type == content_type)
            .ok_or(Error::NotFound)
    }

    fn item_mut(&mut self, content_type: ContentType, id: Uuid) -> Result<&mut FeedItem, Error> {
        self.feed
            .iter_mut()
            .find(|i| i.id == id && i.content_type == content_type)
            .ok_or(Error::NotFound)
    }

    fn live_nook(&self, id: NookId) -> Result<&MockNook, Error> {
        let n = self.nooks.get(&id).ok_or(Error::NotFound)?;
        match n.is_expired(Utc::now()) {
            true => Err(expired()),
            false => Ok(n),
        }
    }

    fn render_nook(&self, n: &MockNook, now: Time) -> Nook {
        let mut nook = n.nook.clone();
        nook.member_count = n.members.len() as u64;
        nook.is_member = n.members.iter().any(|m| m.user_id == self.me);
        nook.time_left = format::time_left(nook.expires_at, now);
        nook
    }

    pub fn fetch_feed(&self, page: u32, limit: u32) -> Result<FeedPage, Error> {
        if page == 0 || limit == 0 {
            return Err(Error::Validation(String::from("page and limit start at 1")));
        }
        let now = Utc::now();
        let skip = (page as usize - 1) * limit as usize;
        let mut items = self
            .feed
            .iter()
            .rev()
            .skip(skip)
            .take(limit as usize)
            .cloned()
            .collect::<Vec<_>>();
        for i in items.iter_mut() {
            if let Some(n) = i.nook_id().and_then(|id| self.nooks.get(&id)) {
                i.time_left = Some(format::time_left(n.nook.expires_at, now));
            }
        }
        Ok(FeedPage {
            items,
            page,
            has_more: self.feed.len() > skip + limit as usize,
        })
    }

    pub fn toggle_reaction(
        &mut self,
        target: ReactionTarget,
        kind: &ReactionKind,
    ) -> Result<(), Error> {
        kind.validate()?;
        let reactions = match target {
            ReactionTarget::Post(p) => &mut self.item_mut(ContentType::Post, p.0)?.reactions,
            ReactionTarget::Topic(t) => &mut self.item_mut(ContentType::Topic, t.0)?.reactions,
            ReactionTarget::NookMessage(c) => {
                let nook = match self.comments.iter().find(|m| m.id == c).map(|m| m.target) {
                    Some(CommentTarget::Nook(n)) => n,
                    _ => return Err(Error::NotFound),
                };
                self.live_nook(nook)?;
                let m = self
                    .comments
                    .iter_mut()
                    .find(|m| m.id == c)
                    .ok_or(Error::NotFound)?;
                &mut m.reactions
            }
        };
        reactions.toggle(kind);
        Ok(())
    }

    pub fn toggle_like(&mut self, content: ContentType, id: Uuid) -> Result<(), Error> {
        self.item_mut(content, id)?.toggle_like();
        Ok(())
    }

    pub fn toggle_bookmark(&mut self, content: ContentType, id: Uuid) -> Result<(), Error> {
        self.item_mut(content, id)?.toggle_bookmark();
        Ok(())
    }

    pub fn track_share(&mut self, content: ContentType, id: Uuid) -> Result<(), Error> {
        self.item_mut(content, id)?.record_share();
        Ok(())
    }

    pub fn set_following(&mut self, user: UserId, follow: bool) -> Result<(), Error> {
        if user == self.me {
            return Err(Error::Validation(String::from("you cannot follow yourself")));
        }
        if !self.users.contains_key(&user) {
            return Err(Error::NotFound);
        }
        match follow {
            true => self.follows.insert((self.me, user)),
            false => self.follows.remove(&(self.me, user)),
        };
        Ok(())
    }

    /// Users whose username starts with `query`, ignoring case
    pub fn search_mentions(&self, query: &str, limit: u32) -> Result<Vec<MentionUser>, Error> {
        let query = query.to_ascii_lowercase();
        let mut res = self
            .users
            .values()
            .map(|u| &u.user)
            .filter(|u| u.username.to_ascii_lowercase().starts_with(&query))
            .map(|u| MentionUser {
                id: u.id,
                username: u.username.clone(),
                display_name: u.display_name.clone(),
                avatar_url: u.avatar_url.clone(),
            })
            .collect::<Vec<_>>();
        res.sort_by(|a, b| a.username.cmp(&b.username));
        res.truncate(limit as usize);
        Ok(res)
    }

    pub fn fetch_user(&self, user: UserId) -> Result<User, Error> {
        Ok(self.users.get(&user).ok_or(Error::NotFound)?.user.clone())
    }

    pub fn fetch_profile_stats(&self, user: UserId) -> Result<ProfileStats, Error> {
        self.fetch_user(user)?;
        Ok(ProfileStats {
            posts: self
                .feed
                .iter()
                .filter(|i| i.content_type == ContentType::Post)
                .filter(|i| i.author.as_ref().map(|a| a.id) == Some(user))
                .count() as u64,
            followers: self.follows.iter().filter(|(_, to)| *to == user).count() as u64,
            following: self.follows.iter().filter(|(from, _)| *from == user).count() as u64,
        })
    }

    pub fn fetch_badges(&self, user: UserId) -> Result<Vec<Badge>, Error> {
        Ok(self.users.get(&user).ok_or(Error::NotFound)?.badges.clone())
    }

    pub fn fetch_follow_status(&self, user: UserId) -> Result<FollowStatus, Error> {
        self.fetch_user(user)?;
        Ok(FollowStatus {
            is_following: self.follows.contains(&(self.me, user)),
        })
    }

    pub fn create_post(&mut self, post: NewPost) -> Result<Post, Error> {
        post.validate()?;
        let author = self.author(self.me)?;
        let id = PostId(Uuid::new_v4());
        self.push_item(id.0, ContentType::Post, Some(author), None, post.body);
        self.fetch_post(id)
    }

    pub fn fetch_post(&self, post: PostId) -> Result<Post, Error> {
        let i = self.item(ContentType::Post, post.0)?;
        Ok(Post {
            id: post,
            owner_id: i.author.as_ref().map(|a| a.id).unwrap_or(self.me),
            date: i.date,
            body: i.body.clone(),
            engagement: i.engagement.clone(),
            reactions: i.reactions.clone(),
        })
    }

    pub fn delete_post(&mut self, post: PostId) -> Result<(), Error> {
        if self.fetch_post(post)?.owner_id != self.me {
            return Err(Error::PermissionDenied);
        }
        self.feed.retain(|i| i.id != post.0);
        self.comments
            .retain(|c| c.target != CommentTarget::Post(post));
        Ok(())
    }

    fn check_target(&self, target: CommentTarget) -> Result<(), Error> {
        match target {
            CommentTarget::Post(p) => self.item(ContentType::Post, p.0).map(|_| ()),
            CommentTarget::Topic(t) => self.item(ContentType::Topic, t.0).map(|_| ()),
            CommentTarget::Nook(n) => self.nooks.get(&n).map(|_| ()).ok_or(Error::NotFound),
        }
    }

    pub fn list_comments(&self, target: CommentTarget) -> Result<Vec<Comment>, Error> {
        self.check_target(target)?;
        Ok(self
            .comments
            .iter()
            .filter(|c| c.target == target)
            .cloned()
            .collect())
    }

    pub fn create_comment(
        &mut self,
        target: CommentTarget,
        c: NewComment,
    ) -> Result<Comment, Error> {
        c.validate()?;
        self.check_target(target)?;
        let author_name = match target {
            CommentTarget::Nook(n) => {
                self.live_nook(n)?;
                String::from("Anonymous")
            }
            _ => self.author(self.me)?.display_name,
        };
        if let Some(parent) = c.parent_id {
            if !self.comments.iter().any(|p| p.id == parent && p.target == target) {
                return Err(Error::Validation(String::from("replied-to comment does not exist")));
            }
        }
        let comment = Comment {
            id: CommentId(Uuid::new_v4()),
            target,
            parent_id: c.parent_id,
            owner_id: self.me,
            author_name,
            text: c.text,
            date: Utc::now(),
            reactions: Reactions::default(),
            mentioned_user_ids: c.mentioned_user_ids,
        };
        let counted = match target {
            CommentTarget::Post(p) => Some((ContentType::Post, p.0)),
            CommentTarget::Topic(t) => Some((ContentType::Topic, t.0)),
            CommentTarget::Nook(_) => None,
        };
        if let Some((ct, id)) = counted {
            self.item_mut(ct, id)?.engagement.comments += 1;
        }
        self.comments.push(comment.clone());
        Ok(comment)
    }

    pub fn delete_comment(&mut self, target: CommentTarget, id: CommentId) -> Result<(), Error> {
        let pos = self
            .comments
            .iter()
            .position(|c| c.id == id && c.target == target)
            .ok_or(Error::NotFound)?;
        if self.comments[pos].owner_id != self.me {
            return Err(Error::PermissionDenied);
        }
        self.comments.remove(pos);
        Ok(())
    }

    pub fn create_nook(&mut self, new: NewNook) -> Result<Nook, Error> {
        new.validate()?;
        let now = Utc::now();
        let id = NookId(Uuid::new_v4());
        let nook = Nook {
            id,
            title: new.title.clone(),
            description: new.description.clone(),
            urgency: new.urgency,
            scope: new.scope,
            temperature: new.temperature,
            hashtags: new
                .hashtags
                .iter()
                .map(|h| String::from(h.trim_start_matches('#')))
                .collect(),
            member_count: 0,
            is_member: false,
            created_at: now,
            expires_at: now + Duration::hours(NOOK_LIFETIME_HOURS),
            time_left: String::new(),
        };
        self.nooks.insert(
            id,
            MockNook {
                nook,
                members: vec![NookMember {
                    user_id: self.me,
                    joined_at: now,
                }],
            },
        );
        self.push_item(id.0, ContentType::Nook, None, Some(new.title), new.description);
        self.fetch_nook(id)
    }

    pub fn list_nooks(&self, filter: &NookFilter) -> Result<Vec<Nook>, Error> {
        let now = Utc::now();
        let hashtag = filter
            .hashtag
            .as_ref()
            .map(|h| h.trim_start_matches('#').to_lowercase());
        let mut res = self
            .nooks
            .values()
            .filter(|n| !n.is_expired(now))
            .filter(|n| filter.urgency.map_or(true, |u| u == n.nook.urgency))
            .filter(|n| filter.scope.map_or(true, |s| s == n.nook.scope))
            .filter(|n| filter.temperature.map_or(true, |t| t == n.nook.temperature))
            .filter(|n| {
                hashtag
                    .as_ref()
                    .map_or(true, |h| n.nook.hashtags.iter().any(|t| t.to_lowercase() == *h))
            })
            .map(|n| self.render_nook(n, now))
            .collect::<Vec<_>>();
        match filter.sort {
            NookSort::Recent => res.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            NookSort::Active => res.sort_by(|a, b| b.member_count.cmp(&a.member_count)),
            NookSort::ExpiringSoon => res.sort_by(|a, b| a.expires_at.cmp(&b.expires_at)),
        }
        Ok(res)
    }

    /// Expired nooks are gone
    pub fn fetch_nook(&self, id: NookId) -> Result<Nook, Error> {
        let now = Utc::now();
        match self.nooks.get(&id) {
            Some(n) if !n.is_expired(now) => Ok(self.render_nook(n, now)),
            _ => Err(Error::NotFound),
        }
    }

    pub fn join_nook(&mut self, id: NookId) -> Result<(), Error> {
        self.live_nook(id)?;
        let me = self.me;
        let n = self.nooks.get_mut(&id).ok_or(Error::NotFound)?;
        if !n.members.iter().any(|m| m.user_id == me) {
            n.members.push(NookMember {
                user_id: me,
                joined_at: Utc::now(),
            });
        }
        Ok(())
    }

    pub fn leave_nook(&mut self, id: NookId) -> Result<(), Error> {
        self.live_nook(id)?;
        let me = self.me;
        let n = self.nooks.get_mut(&id).ok_or(Error::NotFound)?;
        n.members.retain(|m| m.user_id != me);
        Ok(())
    }

    pub fn nook_members(&self, id: NookId) -> Result<Vec<NookMember>, Error> {
        Ok(self.live_nook(id)?.members.clone())
    }
}

enum Failure {
    Api(Error),
    Offline,
}

/// A [`MockServer`] reachable through the [`Backend`] trait
///
/// Failures can be injected to exercise the client's rollbacks.
#[derive(Clone)]
pub struct SharedMock {
    server: Arc<Mutex<MockServer>>,
    failures: Arc<Mutex<VecDeque<Failure>>>,
    offline: Arc<Mutex<bool>>,
    requests: Arc<Mutex<usize>>,
}

impl SharedMock {
    pub fn new(server: MockServer) -> SharedMock {
        SharedMock {
            server: Arc::new(Mutex::new(server)),
            failures: Arc::new(Mutex::new(VecDeque::new())),
            offline: Arc::new(Mutex::new(false)),
            requests: Arc::new(Mutex::new(0)),
        }
    }

    /// Direct access to the server state, eg. to seed it
    pub fn server(&self) -> parking_lot::MutexGuard<'_, MockServer> {
        self.server.lock()
    }

    /// Make the next request fail with `err`, without reaching the server
    pub fn fail_next(&self, err: Error) {
        self.failures.lock().push_back(Failure::Api(err));
    }

    /// Make the next request fail as if the network were down
    pub fn drop_next(&self) {
        self.failures.lock().push_back(Failure::Offline);
    }

    pub fn set_offline(&self, offline: bool) {
        *self.offline.lock() = offline;
    }

    /// Number of requests received so far, including failed ones
    pub fn requests(&self) -> usize {
        *self.requests.lock()
    }

    fn call<T>(
        &self,
        name: &'static str,
        f: impl FnOnce(&mut MockServer) -> Result<T, Error>,
    ) -> Result<T, nook_client::Error> {
        *self.requests.lock() += 1;
        if *self.offline.lock() {
            return Err(unreachable(name));
        }
        match self.failures.lock().pop_front() {
            Some(Failure::Api(e)) => {
                tracing::debug!(name, ?e, "injecting failure");
                return Err(nook_client::Error::Api(e));
            }
            Some(Failure::Offline) => {
                return Err(unreachable(name));
            }
            None => (),
        }
        let res = f(&mut self.server.lock());
        if let Err(e) = &res {
            tracing::debug!(name, ?e, "mock server refused request");
        }
        res.map_err(nook_client::Error::Api)
    }
}

fn unreachable(name: &str) -> nook_client::Error {
    nook_client::Error::Transport(anyhow::anyhow!("mock server unreachable during {name}"))
}

#[async_trait]
impl Backend for SharedMock {
    async fn fetch_feed(&self, page: u32, limit: u32) -> Result<FeedPage, nook_client::Error> {
        self.call("fetch_feed", |s| s.fetch_feed(page, limit))
    }

    async fn toggle_reaction(
        &self,
        target: ReactionTarget,
        kind: &ReactionKind,
    ) -> Result<(), nook_client::Error> {
        self.call("toggle_reaction", |s| s.toggle_reaction(target, kind))
    }

    async fn toggle_like(&self, content: ContentType, id: Uuid) -> Result<(), nook_client::Error> {
        self.call("toggle_like", |s| s.toggle_like(content, id))
    }

    async fn toggle_bookmark(
        &self,
        content: ContentType,
        id: Uuid,
    ) -> Result<(), nook_client::Error> {
        self.call("toggle_bookmark", |s| s.toggle_bookmark(content, id))
    }

    async fn track_share(&self, content: ContentType, id: Uuid) -> Result<(), nook_client::Error> {
        self.call("track_share", |s| s.track_share(content, id))
    }

    async fn set_following(&self, user: UserId, follow: bool) -> Result<(), nook_client::Error> {
        self.call("set_following", |s| s.set_following(user, follow))
    }

    async fn search_mentions(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<MentionUser>, nook_client::Error> {
        self.call("search_mentions", |s| s.search_mentions(query, limit))
    }

    async fn fetch_user(&self, user: UserId) -> Result<User, nook_client::Error> {
        self.call("fetch_user", |s| s.fetch_user(user))
    }

    async fn fetch_profile_stats(&self, user: UserId) -> Result<ProfileStats, nook_client::Error> {
        self.call("fetch_profile_stats", |s| s.fetch_profile_stats(user))
    }

    async fn fetch_badges(&self, user: UserId) -> Result<Vec<Badge>, nook_client::Error> {
        self.call("fetch_badges", |s| s.fetch_badges(user))
    }

    async fn fetch_follow_status(&self, user: UserId) -> Result<FollowStatus, nook_client::Error> {
        self.call("fetch_follow_status", |s| s.fetch_follow_status(user))
    }

    async fn create_post(&self, post: NewPost) -> Result<Post, nook_client::Error> {
        self.call("create_post", |s| s.create_post(post))
    }

    async fn fetch_post(&self, post: PostId) -> Result<Post, nook_client::Error> {
        self.call("fetch_post", |s| s.fetch_post(post))
    }

    async fn delete_post(&self, post: PostId) -> Result<(), nook_client::Error> {
        self.call("delete_post", |s| s.delete_post(post))
    }

    async fn list_comments(
        &self,
        target: CommentTarget,
    ) -> Result<Vec<Comment>, nook_client::Error> {
        self.call("list_comments", |s| s.list_comments(target))
    }

    async fn create_comment(
        &self,
        target: CommentTarget,
        c: NewComment,
    ) -> Result<Comment, nook_client::Error> {
        self.call("create_comment", |s| s.create_comment(target, c))
    }

    async fn delete_comment(
        &self,
        target: CommentTarget,
        id: CommentId,
    ) -> Result<(), nook_client::Error> {
        self.call("delete_comment", |s| s.delete_comment(target, id))
    }

    async fn create_nook(&self, nook: NewNook) -> Result<Nook, nook_client::Error> {
        self.call("create_nook", |s| s.create_nook(nook))
    }

    async fn list_nooks(&self, filter: &NookFilter) -> Result<Vec<Nook>, nook_client::Error> {
        self.call("list_nooks", |s| s.list_nooks(filter))
    }

    async fn fetch_nook(&self, nook: NookId) -> Result<Nook, nook_client::Error> {
        self.call("fetch_nook", |s| s.fetch_nook(nook))
    }

    async fn join_nook(&self, nook: NookId) -> Result<(), nook_client::Error> {
        self.call("join_nook", |s| s.join_nook(nook))
    }

    async fn leave_nook(&self, nook: NookId) -> Result<(), nook_client::Error> {
        self.call("leave_nook", |s| s.leave_nook(nook))
    }

    async fn nook_members(&self, nook: NookId) -> Result<Vec<NookMember>, nook_client::Error> {
        self.call("nook_members", |s| s.nook_members(nook))
    }
}
