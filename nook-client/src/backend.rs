use async_trait::async_trait;

use crate::{
    api::{
        Badge, Comment, CommentId, CommentTarget, ContentType, FeedPage, FollowStatus,
        MentionUser, NewComment, NewNook, NewPost, Nook, NookFilter, NookId, NookMember, Post,
        PostId, ProfileStats, ReactionKind, ReactionTarget, User, UserId, Uuid,
    },
    Error,
};

/// The REST API, as seen by the client
///
/// Toggle endpoints flip membership for the current user and are idempotent
/// per user and content.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn fetch_feed(&self, page: u32, limit: u32) -> Result<FeedPage, Error>;

    async fn toggle_reaction(&self, target: ReactionTarget, kind: &ReactionKind)
        -> Result<(), Error>;
    async fn toggle_like(&self, content: ContentType, id: Uuid) -> Result<(), Error>;
    async fn toggle_bookmark(&self, content: ContentType, id: Uuid) -> Result<(), Error>;
    async fn track_share(&self, content: ContentType, id: Uuid) -> Result<(), Error>;
    async fn set_following(&self, user: UserId, follow: bool) -> Result<(), Error>;

    async fn search_mentions(&self, query: &str, limit: u32) -> Result<Vec<MentionUser>, Error>;

    async fn fetch_user(&self, user: UserId) -> Result<User, Error>;
    async fn fetch_profile_stats(&self, user: UserId) -> Result<ProfileStats, Error>;
    async fn fetch_badges(&self, user: UserId) -> Result<Vec<Badge>, Error>;
    async fn fetch_follow_status(&self, user: UserId) -> Result<FollowStatus, Error>;

    async fn create_post(&self, post: NewPost) -> Result<Post, Error>;
    async fn fetch_post(&self, post: PostId) -> Result<Post, Error>;
    async fn delete_post(&self, post: PostId) -> Result<(), Error>;

    async fn list_comments(&self, target: CommentTarget) -> Result<Vec<Comment>, Error>;
    async fn create_comment(&self, target: CommentTarget, c: NewComment)
        -> Result<Comment, Error>;
    async fn delete_comment(&self, target: CommentTarget, id: CommentId) -> Result<(), Error>;

    async fn create_nook(&self, nook: NewNook) -> Result<Nook, Error>;
    async fn list_nooks(&self, filter: &NookFilter) -> Result<Vec<Nook>, Error>;
    async fn fetch_nook(&self, nook: NookId) -> Result<Nook, Error>;
    async fn join_nook(&self, nook: NookId) -> Result<(), Error>;
    async fn leave_nook(&self, nook: NookId) -> Result<(), Error>;
    async fn nook_members(&self, nook: NookId) -> Result<Vec<NookMember>, Error>;
}
