use uuid::Uuid;

use crate::{NookId, PostId, ReactionTarget, Reactions, Time, TopicId, UserId};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Post,
    Topic,
    Nook,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Post => "post",
            ContentType::Topic => "topic",
            ContentType::Nook => "nook",
        }
    }

    /// Nooks themselves cannot be reacted to, only their messages
    pub fn reaction_target(&self, id: Uuid) -> Option<ReactionTarget> {
        match self {
            ContentType::Post => Some(ReactionTarget::Post(PostId(id))),
            ContentType::Topic => Some(ReactionTarget::Topic(TopicId(id))),
            ContentType::Nook => None,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Author {
    pub id: UserId,
    pub username: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Engagement {
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
    pub seen: u64,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct FeedItem {
    pub id: Uuid,
    pub content_type: ContentType,

    /// None for nooks, which are anonymous
    pub author: Option<Author>,

    pub title: Option<String>,
    pub body: String,
    pub date: Time,

    #[serde(flatten)]
    pub engagement: Engagement,

    #[serde(default)]
    pub is_liked: bool,
    #[serde(default)]
    pub is_bookmarked: bool,
    #[serde(default)]
    pub is_shared: bool,

    #[serde(flatten)]
    pub reactions: Reactions,

    #[serde(default)]
    pub hashtags: Vec<String>,

    /// Only set for nooks, eg. "3h 20m left"
    pub time_left: Option<String>,
}

impl FeedItem {
    pub fn nook_id(&self) -> Option<NookId> {
        (self.content_type == ContentType::Nook).then_some(NookId(self.id))
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct FeedPage {
    pub items: Vec<FeedItem>,
    pub page: u32,
    pub has_more: bool,
}
