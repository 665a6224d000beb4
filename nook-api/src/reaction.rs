use std::{collections::BTreeMap, fmt};

use crate::{CommentId, Error, PostId, TopicId};

/// Free-form reaction type, as understood by the server (eg. `heard`)
#[derive(
    Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
#[serde(transparent)]
pub struct ReactionKind(pub String);

impl ReactionKind {
    pub fn new(kind: impl Into<String>) -> ReactionKind {
        ReactionKind(kind.into())
    }

    pub fn heard() -> ReactionKind {
        ReactionKind::new("heard")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_string(&self.0)?;
        if self.0.is_empty() {
            return Err(Error::Validation(String::from("empty reaction type")));
        }
        Ok(())
    }
}

impl fmt::Display for ReactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-kind counters and the current user's own flags
///
/// A missing entry counts as zero / not reacted.
#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Reactions {
    #[serde(default)]
    pub reaction_counts: BTreeMap<ReactionKind, u64>,
    #[serde(default)]
    pub user_reactions: BTreeMap<ReactionKind, bool>,
}

impl Reactions {
    pub fn count(&self, kind: &ReactionKind) -> u64 {
        self.reaction_counts.get(kind).copied().unwrap_or(0)
    }

    pub fn has_reacted(&self, kind: &ReactionKind) -> bool {
        self.user_reactions.get(kind).copied().unwrap_or(false)
    }
}

/// Anything the reaction endpoints accept
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum ReactionTarget {
    Post(PostId),
    Topic(TopicId),
    NookMessage(CommentId),
}

impl ReactionTarget {
    /// Content-type segment used by the REST endpoints
    pub fn kind_str(&self) -> &'static str {
        match self {
            ReactionTarget::Post(_) => "post",
            ReactionTarget::Topic(_) => "topic",
            ReactionTarget::NookMessage(_) => "nook_message",
        }
    }

    pub fn uuid(&self) -> uuid::Uuid {
        match self {
            ReactionTarget::Post(id) => id.0,
            ReactionTarget::Topic(id) => id.0,
            ReactionTarget::NookMessage(id) => id.0,
        }
    }
}
