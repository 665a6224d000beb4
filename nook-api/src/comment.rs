use uuid::Uuid;

use crate::{Error, NookId, PostId, Reactions, Time, TopicId, UserId};

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
pub struct CommentId(pub Uuid);

impl CommentId {
    /// Client-side id for a comment the server has not acknowledged yet
    pub fn provisional() -> CommentId {
        CommentId(Uuid::new_v4())
    }
}

/// What a comment hangs off of
///
/// Nook messages are comments on a nook.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum CommentTarget {
    Post(PostId),
    Topic(TopicId),
    Nook(NookId),
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Comment {
    pub id: CommentId,
    pub target: CommentTarget,

    /// Comment this one replies to, if any
    pub parent_id: Option<CommentId>,

    pub owner_id: UserId,
    pub author_name: String,
    pub text: String,
    pub date: Time,

    #[serde(flatten)]
    pub reactions: Reactions,

    #[serde(default)]
    pub mentioned_user_ids: Vec<UserId>,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct NewComment {
    pub text: String,
    pub parent_id: Option<CommentId>,
    pub mentioned_user_ids: Vec<UserId>,
}

impl NewComment {
    pub fn new(text: impl Into<String>) -> NewComment {
        NewComment {
            text: text.into(),
            parent_id: None,
            mentioned_user_ids: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_string(&self.text)?;
        crate::validate_length(&self.text, crate::MAX_COMMENT_LEN)?;
        if self.text.trim().is_empty() {
            return Err(Error::Validation(String::from("message cannot be empty")));
        }
        Ok(())
    }
}
