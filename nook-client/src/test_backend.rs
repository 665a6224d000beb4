//! Backend answering from a script, for unit tests

use std::collections::VecDeque;

use async_trait::async_trait;
use futures::channel::oneshot;
use parking_lot::Mutex;
use serde_json::{json, Value};

use crate::{
    api::{
        self, Badge, Comment, CommentId, CommentTarget, ContentType, FeedPage, FollowStatus,
        MentionUser, NewComment, NewNook, NewPost, Nook, NookFilter, NookId, NookMember, Post,
        PostId, ProfileStats, ReactionKind, ReactionTarget, User, UserId, Uuid,
    },
    Backend, Error,
};

pub enum Reply {
    Fail(api::Error),
    Json(Value),

    /// Wait until the test releases the call
    Gate(oneshot::Receiver<Result<Value, api::Error>>),
}

/// Calls pop replies in order
///
/// With no reply left, endpoints that return nothing succeed and the others
/// fail with a transport error.
#[derive(Default)]
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub fn push(&self, r: Reply) {
        self.replies.lock().push_back(r);
    }

    pub fn push_json(&self, v: impl serde::Serialize) {
        self.push(Reply::Json(json!(v)));
    }

    pub fn push_feed(&self, page: FeedPage) {
        self.push_json(page);
    }

    pub fn gate(&self) -> oneshot::Sender<Result<Value, api::Error>> {
        let (tx, rx) = oneshot::channel();
        self.push(Reply::Gate(rx));
        tx
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    async fn reply(&self, call: String) -> Option<Result<Value, Error>> {
        self.calls.lock().push(call);
        let reply = self.replies.lock().pop_front();
        Some(match reply? {
            Reply::Fail(e) => Err(Error::Api(e)),
            Reply::Json(v) => Ok(v),
            Reply::Gate(rx) => match rx.await {
                Ok(res) => res.map_err(Error::Api),
                Err(_) => Err(Error::Transport(anyhow::anyhow!("gate dropped"))),
            },
        })
    }

    async fn unit(&self, call: String) -> Result<(), Error> {
        match self.reply(call).await {
            None => Ok(()),
            Some(res) => res.map(|_| ()),
        }
    }

    async fn value<T: serde::de::DeserializeOwned>(&self, call: String) -> Result<T, Error> {
        let v = self
            .reply(call.clone())
            .await
            .unwrap_or_else(|| Err(Error::Transport(anyhow::anyhow!("no reply for {call}"))))?;
        Ok(serde_json::from_value(v).expect("scripted reply has the wrong shape"))
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    async fn fetch_feed(&self, page: u32, _limit: u32) -> Result<FeedPage, Error> {
        self.value(format!("fetch_feed {page}")).await
    }

    async fn toggle_reaction(
        &self,
        target: ReactionTarget,
        kind: &ReactionKind,
    ) -> Result<(), Error> {
        self.unit(format!(
            "toggle_reaction {} {} {kind}",
            target.kind_str(),
            target.uuid()
        ))
        .await
    }

    async fn toggle_like(&self, content: ContentType, id: Uuid) -> Result<(), Error> {
        self.unit(format!("toggle_like {} {id}", content.as_str())).await
    }

    async fn toggle_bookmark(&self, content: ContentType, id: Uuid) -> Result<(), Error> {
        self.unit(format!("toggle_bookmark {} {id}", content.as_str()))
            .await
    }

    async fn track_share(&self, content: ContentType, id: Uuid) -> Result<(), Error> {
        self.unit(format!("track_share {} {id}", content.as_str())).await
    }

    async fn set_following(&self, user: UserId, follow: bool) -> Result<(), Error> {
        self.unit(format!("set_following {} {follow}", user.0)).await
    }

    async fn search_mentions(&self, query: &str, limit: u32) -> Result<Vec<MentionUser>, Error> {
        self.value(format!("search_mentions {query} {limit}")).await
    }

    async fn fetch_user(&self, user: UserId) -> Result<User, Error> {
        self.value(format!("fetch_user {}", user.0)).await
    }

    async fn fetch_profile_stats(&self, user: UserId) -> Result<ProfileStats, Error> {
        self.value(format!("fetch_profile_stats {}", user.0)).await
    }

    async fn fetch_badges(&self, user: UserId) -> Result<Vec<Badge>, Error> {
        self.value(format!("fetch_badges {}", user.0)).await
    }

    async fn fetch_follow_status(&self, user: UserId) -> Result<FollowStatus, Error> {
        self.value(format!("fetch_follow_status {}", user.0)).await
    }

    async fn create_post(&self, _post: NewPost) -> Result<Post, Error> {
        self.value(String::from("create_post")).await
    }

    async fn fetch_post(&self, post: PostId) -> Result<Post, Error> {
        self.value(format!("fetch_post {}", post.0)).await
    }

    async fn delete_post(&self, post: PostId) -> Result<(), Error> {
        self.unit(format!("delete_post {}", post.0)).await
    }

    async fn list_comments(&self, _target: CommentTarget) -> Result<Vec<Comment>, Error> {
        self.value(String::from("list_comments")).await
    }

    async fn create_comment(
        &self,
        _target: CommentTarget,
        c: NewComment,
    ) -> Result<Comment, Error> {
        self.value(format!("create_comment {}", c.text)).await
    }

    async fn delete_comment(&self, _target: CommentTarget, id: CommentId) -> Result<(), Error> {
        self.unit(format!("delete_comment {}", id.0)).await
    }

    async fn create_nook(&self, nook: NewNook) -> Result<Nook, Error> {
        self.value(format!("create_nook {}", nook.title)).await
    }

    async fn list_nooks(&self, _filter: &NookFilter) -> Result<Vec<Nook>, Error> {
        self.value(String::from("list_nooks")).await
    }

    async fn fetch_nook(&self, nook: NookId) -> Result<Nook, Error> {
        self.value(format!("fetch_nook {}", nook.0)).await
    }

    async fn join_nook(&self, nook: NookId) -> Result<(), Error> {
        self.unit(format!("join_nook {}", nook.0)).await
    }

    async fn leave_nook(&self, nook: NookId) -> Result<(), Error> {
        self.unit(format!("leave_nook {}", nook.0)).await
    }

    async fn nook_members(&self, nook: NookId) -> Result<Vec<NookMember>, Error> {
        self.value(format!("nook_members {}", nook.0)).await
    }
}
