use chrono::Utc;

pub use uuid::{uuid, Uuid};
pub type Time = chrono::DateTime<Utc>;

pub const STUB_UUID: Uuid = uuid!("ffffffff-ffff-ffff-ffff-ffffffffffff");

/// Longest username accepted, both by the server and by the mention syntax
pub const MAX_USERNAME_LEN: usize = 30;

pub const MAX_COMMENT_LEN: usize = 5000;
pub const MAX_NOOK_TITLE_LEN: usize = 120;

mod comment;
pub use comment::{Comment, CommentId, CommentTarget, NewComment};

mod error;
pub use error::Error;

mod feed;
pub use feed::{Author, ContentType, Engagement, FeedItem, FeedPage};

mod nook;
pub use nook::{NewNook, Nook, NookFilter, NookId, NookMember, NookSort, Scope, Temperature, Urgency};

mod post;
pub use post::{NewPost, Post, PostId, TopicId};

mod reaction;
pub use reaction::{ReactionKind, ReactionTarget, Reactions};

mod user;
pub use user::{Badge, FollowStatus, MentionUser, ProfileStats, User, UserId};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct AuthToken(pub Uuid);

impl AuthToken {
    pub fn stub() -> AuthToken {
        AuthToken(STUB_UUID)
    }
}

// The server rejects NUL bytes anywhere, so check before even sending
pub fn validate_string(s: &str) -> Result<(), Error> {
    match s.contains('\0') {
        true => Err(Error::NullByteInString(String::from(s))),
        false => Ok(()),
    }
}

pub fn validate_length(s: &str, max: usize) -> Result<(), Error> {
    let len = s.chars().count();
    match len > max {
        true => Err(Error::TooLong { len, max }),
        false => Ok(()),
    }
}

pub fn is_username_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

pub fn validate_username(name: &str) -> Result<(), Error> {
    validate_string(name)?;
    if name.is_empty()
        || name.len() > MAX_USERNAME_LEN
        || !name.chars().all(is_username_char)
    {
        return Err(Error::InvalidName(String::from(name)));
    }
    Ok(())
}
