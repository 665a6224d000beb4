mod backend;
pub use backend::Backend;

mod composer;
pub use composer::{
    active_mention, fetch_suggestions, ActiveMention, Key, KeyOutcome, MentionComposer,
    SuggestionQuery,
};

mod config;
pub use config::ClientConfig;

mod error;
pub use error::Error;

mod feed;
pub use feed::{Feed, FeedItemExt, FeedView};

pub mod format;

mod http;
pub use http::HttpBackend;

mod mention;
pub use mention::{mentioned_usernames, tokenize, Segment};

mod nook;
pub use nook::{load_nook, NookBrowser, NookDetail, NookList};

pub mod optimistic;

mod post;
pub use post::{load_post, PostDetail};

mod profile;
pub use profile::{load_profile, Profile, ProfileState, ProfileView};

mod reaction;
pub use reaction::{toggle_counter, ReactionsExt};

mod resolver;
pub use resolver::{MentionCache, MentionResolver};

#[cfg(test)]
mod test_backend;

mod thread;
pub use thread::{ReplyIndex, Thread, ThreadView};

pub mod api {
    pub use nook_api::*;
}

pub mod prelude {
    pub use crate::{FeedItemExt, ReactionsExt};
}
