use uuid::Uuid;

use crate::{Engagement, Error, Reactions, Time, UserId, STUB_UUID};

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
pub struct PostId(pub Uuid);

impl PostId {
    pub fn stub() -> PostId {
        PostId(STUB_UUID)
    }
}

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
pub struct TopicId(pub Uuid);

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Post {
    pub id: PostId,
    pub owner_id: UserId,
    pub date: Time,
    pub body: String,
    pub engagement: Engagement,
    pub reactions: Reactions,
}

#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct NewPost {
    pub body: String,
    pub mentioned_user_ids: Vec<UserId>,
}

impl NewPost {
    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_string(&self.body)?;
        crate::validate_length(&self.body, crate::MAX_COMMENT_LEN)?;
        if self.body.trim().is_empty() {
            return Err(Error::Validation(String::from("post cannot be empty")));
        }
        Ok(())
    }
}
