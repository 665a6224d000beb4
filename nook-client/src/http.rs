use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};

use crate::{
    api::{
        self, AuthToken, Badge, Comment, CommentId, CommentTarget, ContentType, FeedPage,
        FollowStatus, MentionUser, NewComment, NewNook, NewPost, Nook, NookFilter, NookId,
        NookMember, Post, PostId, ProfileStats, ReactionKind, ReactionTarget, User, UserId, Uuid,
    },
    Backend, Error,
};

/// [`Backend`] talking to the REST API at `{host}/api/`
#[derive(Clone, Debug)]
pub struct HttpBackend {
    client: reqwest::Client,
    host: String,
    token: AuthToken,
}

fn comments_path(target: CommentTarget) -> String {
    match target {
        CommentTarget::Post(p) => format!("posts/{}/comments", p.0),
        CommentTarget::Topic(t) => format!("topics/{}/comments", t.0),
        CommentTarget::Nook(n) => format!("nooks/{}/messages", n.0),
    }
}

// For bodies that are not in the usual error format
fn error_from_status(status: StatusCode) -> api::Error {
    match status {
        StatusCode::NOT_FOUND => api::Error::NotFound,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => api::Error::PermissionDenied,
        s => api::Error::Unknown(format!("server answered {s}")),
    }
}

impl HttpBackend {
    pub fn new(host: impl Into<String>, token: AuthToken) -> HttpBackend {
        HttpBackend {
            client: reqwest::Client::new(),
            host: host.into(),
            token,
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let host = self.host.trim_end_matches('/');
        self.client
            .request(method, format!("{host}/api/{path}"))
            .bearer_auth(self.token.0)
    }

    async fn send(&self, req: RequestBuilder) -> Result<reqwest::Response, Error> {
        let resp = req.send().await.context("sending request to server")?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.bytes().await.context("reading error body")?;
        let err = api::Error::parse(&body).unwrap_or_else(|e| {
            tracing::debug!(?e, %status, "server error body is not in the error format");
            error_from_status(status)
        });
        Err(Error::Api(err))
    }

    async fn json<T>(&self, req: RequestBuilder) -> Result<T, Error>
    where
        T: for<'de> serde::Deserialize<'de>,
    {
        Ok(self
            .send(req)
            .await?
            .json()
            .await
            .context("parsing response from server")?)
    }

    async fn unit(&self, req: RequestBuilder) -> Result<(), Error> {
        self.send(req).await.map(|_| ())
    }

    async fn toggle(&self, what: &str, content: ContentType, id: Uuid) -> Result<(), Error> {
        let path = format!("{what}/{}/{id}", content.as_str());
        self.unit(self.request(Method::POST, &path)).await
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn fetch_feed(&self, page: u32, limit: u32) -> Result<FeedPage, Error> {
        self.json(
            self.request(Method::GET, "feed")
                .query(&[("page", page), ("limit", limit)]),
        )
        .await
    }

    async fn toggle_reaction(
        &self,
        target: ReactionTarget,
        kind: &ReactionKind,
    ) -> Result<(), Error> {
        let path = format!("reactions/{}/{}", target.kind_str(), target.uuid());
        self.unit(
            self.request(Method::POST, &path)
                .json(&serde_json::json!({ "reaction_type": kind })),
        )
        .await
    }

    async fn toggle_like(&self, content: ContentType, id: Uuid) -> Result<(), Error> {
        self.toggle("likes", content, id).await
    }

    async fn toggle_bookmark(&self, content: ContentType, id: Uuid) -> Result<(), Error> {
        self.toggle("bookmarks", content, id).await
    }

    async fn track_share(&self, content: ContentType, id: Uuid) -> Result<(), Error> {
        self.toggle("shares", content, id).await
    }

    async fn set_following(&self, user: UserId, follow: bool) -> Result<(), Error> {
        let method = match follow {
            true => Method::POST,
            false => Method::DELETE,
        };
        self.unit(self.request(method, &format!("users/{}/follow", user.0)))
            .await
    }

    async fn search_mentions(&self, query: &str, limit: u32) -> Result<Vec<MentionUser>, Error> {
        self.json(
            self.request(Method::GET, "users/search-mention")
                .query(&[("q", query)])
                .query(&[("limit", limit)]),
        )
        .await
    }

    async fn fetch_user(&self, user: UserId) -> Result<User, Error> {
        self.json(self.request(Method::GET, &format!("users/{}", user.0)))
            .await
    }

    async fn fetch_profile_stats(&self, user: UserId) -> Result<ProfileStats, Error> {
        self.json(self.request(Method::GET, &format!("users/{}/stats", user.0)))
            .await
    }

    async fn fetch_badges(&self, user: UserId) -> Result<Vec<Badge>, Error> {
        self.json(self.request(Method::GET, &format!("users/{}/badges", user.0)))
            .await
    }

    async fn fetch_follow_status(&self, user: UserId) -> Result<FollowStatus, Error> {
        self.json(self.request(Method::GET, &format!("users/{}/follow-status", user.0)))
            .await
    }

    async fn create_post(&self, post: NewPost) -> Result<Post, Error> {
        post.validate()?;
        self.json(self.request(Method::POST, "posts").json(&post))
            .await
    }

    async fn fetch_post(&self, post: PostId) -> Result<Post, Error> {
        self.json(self.request(Method::GET, &format!("posts/{}", post.0)))
            .await
    }

    async fn delete_post(&self, post: PostId) -> Result<(), Error> {
        self.unit(self.request(Method::DELETE, &format!("posts/{}", post.0)))
            .await
    }

    async fn list_comments(&self, target: CommentTarget) -> Result<Vec<Comment>, Error> {
        self.json(self.request(Method::GET, &comments_path(target)))
            .await
    }

    async fn create_comment(&self, target: CommentTarget, c: NewComment) -> Result<Comment, Error> {
        self.json(self.request(Method::POST, &comments_path(target)).json(&c))
            .await
    }

    async fn delete_comment(&self, target: CommentTarget, id: CommentId) -> Result<(), Error> {
        let path = format!("{}/{}", comments_path(target), id.0);
        self.unit(self.request(Method::DELETE, &path)).await
    }

    async fn create_nook(&self, nook: NewNook) -> Result<Nook, Error> {
        self.json(self.request(Method::POST, "nooks").json(&nook))
            .await
    }

    async fn list_nooks(&self, filter: &NookFilter) -> Result<Vec<Nook>, Error> {
        self.json(
            self.request(Method::GET, "nooks")
                .query(&filter.query_pairs()),
        )
        .await
    }

    async fn fetch_nook(&self, nook: NookId) -> Result<Nook, Error> {
        self.json(self.request(Method::GET, &format!("nooks/{}", nook.0)))
            .await
    }

    async fn join_nook(&self, nook: NookId) -> Result<(), Error> {
        self.unit(self.request(Method::POST, &format!("nooks/{}/join", nook.0)))
            .await
    }

    async fn leave_nook(&self, nook: NookId) -> Result<(), Error> {
        self.unit(self.request(Method::POST, &format!("nooks/{}/leave", nook.0)))
            .await
    }

    async fn nook_members(&self, nook: NookId) -> Result<Vec<NookMember>, Error> {
        self.json(self.request(Method::GET, &format!("nooks/{}/members", nook.0)))
            .await
    }
}
