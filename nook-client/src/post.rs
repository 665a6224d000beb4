use crate::{
    api::{Comment, CommentTarget, Post, PostId},
    Backend, ReplyIndex,
};

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PostDetail {
    Loaded {
        post: Post,
        comments: Vec<Comment>,
        index: ReplyIndex,
    },

    /// Deleted, never existed, or failed to load
    NotFound,
}

/// Fetch a post with its comments
///
/// A post that fails to load is shown as not found. Failing to list the
/// comments only leaves the thread empty.
pub async fn load_post<B: Backend + ?Sized>(backend: &B, id: PostId) -> PostDetail {
    let (post, comments) = futures::join!(
        backend.fetch_post(id),
        backend.list_comments(CommentTarget::Post(id)),
    );
    let post = match post {
        Ok(p) => p,
        Err(err) => {
            tracing::warn!(post = %id.0, ?err, "failed loading post");
            return PostDetail::NotFound;
        }
    };
    let comments = comments.unwrap_or_else(|err| {
        tracing::warn!(post = %id.0, ?err, "failed loading post comments");
        Vec::new()
    });
    let index = ReplyIndex::build(&comments);
    PostDetail::Loaded {
        post,
        comments,
        index,
    }
}
