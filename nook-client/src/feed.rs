use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
    api::{ContentType, FeedItem, FeedPage, NewPost, Post, PostId, ReactionKind, Uuid},
    optimistic::{self, InFlight},
    toggle_counter, Backend, Error, ReactionsExt,
};

pub trait FeedItemExt {
    /// Returns whether the item is now liked
    fn toggle_like(&mut self) -> bool;

    /// Returns whether the item is now bookmarked
    fn toggle_bookmark(&mut self) -> bool;

    /// Count the current user's share, at most once
    fn record_share(&mut self);
}

impl FeedItemExt for FeedItem {
    fn toggle_like(&mut self) -> bool {
        toggle_counter(&mut self.is_liked, &mut self.engagement.likes)
    }

    fn toggle_bookmark(&mut self) -> bool {
        self.is_bookmarked = !self.is_bookmarked;
        self.is_bookmarked
    }

    fn record_share(&mut self) {
        if !self.is_shared {
            self.is_shared = true;
            self.engagement.shares = self.engagement.shares.saturating_add(1);
        }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Feed {
    pub items: Vec<FeedItem>,

    /// Last page loaded, 0 if none
    pub page: u32,
    pub has_more: bool,

    // bumped by every refresh, so that older responses can be told apart
    generation: u64,

    // bumped whenever a server listing replaces the items
    revision: u64,
}

impl Feed {
    pub fn item(&self, id: Uuid) -> Option<&FeedItem> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn item_mut(&mut self, id: Uuid) -> Option<&mut FeedItem> {
        self.items.iter_mut().find(|i| i.id == id)
    }

    fn loaded(&self, id: Uuid) -> Result<&FeedItem, Error> {
        self.item(id)
            .ok_or_else(|| Error::NotLoaded(format!("feed item {id}")))
    }

    fn replace(&mut self, page: FeedPage) {
        self.revision += 1;
        self.items = page.items;
        self.page = page.page;
        self.has_more = page.has_more;
    }

    fn append(&mut self, page: FeedPage) {
        for item in page.items {
            // pages can overlap when new items got inserted at the top meanwhile
            if self.item(item.id).is_none() {
                self.items.push(item);
            }
        }
        self.page = page.page;
        self.has_more = page.has_more;
    }

    // Run f on the item if it is still there, it may have vanished with a refresh
    fn with_item(&mut self, id: Uuid, f: impl FnOnce(&mut FeedItem)) {
        match self.item_mut(id) {
            Some(item) => f(item),
            None => tracing::debug!(%id, "feed item vanished before rollback"),
        }
    }

    // Roll an item back, unless a refresh since `revision` already brought
    // the server's version of it
    fn roll_back(&mut self, revision: u64, id: Uuid, f: impl FnOnce(&mut FeedItem)) {
        if self.revision != revision {
            tracing::debug!(%id, "feed reloaded meanwhile, keeping the server's state");
            return;
        }
        self.with_item(id, f)
    }
}

pub struct FeedView<B> {
    backend: Arc<B>,
    page_size: u32,
    state: Mutex<Feed>,
    in_flight: InFlight,
}

impl<B: Backend> FeedView<B> {
    pub fn new(backend: Arc<B>, page_size: u32) -> FeedView<B> {
        FeedView {
            backend,
            page_size,
            state: Mutex::new(Feed::default()),
            in_flight: InFlight::new(),
        }
    }

    pub fn snapshot(&self) -> Feed {
        self.state.lock().clone()
    }

    pub fn item(&self, id: Uuid) -> Option<FeedItem> {
        self.state.lock().item(id).cloned()
    }

    /// Reload the first page, replacing everything
    ///
    /// If another refresh was started while this one was in flight, its
    /// response wins and this one is dropped.
    pub async fn refresh(&self) -> Result<(), Error> {
        let generation = {
            let mut state = self.state.lock();
            state.generation += 1;
            state.generation
        };
        let page = self.backend.fetch_feed(1, self.page_size).await?;
        let mut state = self.state.lock();
        if state.generation != generation {
            tracing::debug!(generation, "dropping stale feed response");
            return Ok(());
        }
        state.replace(page);
        Ok(())
    }

    /// Append the next page, returning false if there was nothing more to load
    pub async fn load_more(&self) -> Result<bool, Error> {
        let (generation, next) = {
            let state = self.state.lock();
            if state.page > 0 && !state.has_more {
                return Ok(false);
            }
            (state.generation, state.page + 1)
        };
        let page = self.backend.fetch_feed(next, self.page_size).await?;
        let mut state = self.state.lock();
        if state.generation != generation {
            tracing::debug!(generation, "dropping page loaded before a refresh");
            return Ok(false);
        }
        if page.page <= state.page {
            // another load_more already got this page
            return Ok(false);
        }
        state.append(page);
        Ok(true)
    }

    pub async fn toggle_reaction(&self, id: Uuid, kind: ReactionKind) -> Result<(), Error> {
        kind.validate()?;
        let pending = optimistic::begin(
            &self.in_flight,
            format!("reaction:{id}:{kind}"),
            &self.state,
            |feed| {
                let item = feed.loaded(id)?;
                let target = item
                    .content_type
                    .reaction_target(id)
                    .ok_or(Error::Unsupported("nooks cannot be reacted to"))?;
                Ok((target, item.reactions.get(&kind), feed.revision))
            },
            |feed| feed.with_item(id, |item| {
                item.reactions.toggle(&kind);
            }),
        )?;
        let target = pending.snapshot().0;
        let res = self.backend.toggle_reaction(target, &kind).await;
        pending.settle(&self.state, res, |_, ()| (), |feed, (_, before, rev)| {
            feed.roll_back(rev, id, |item| item.reactions.restore(&kind, before))
        })
    }

    pub async fn toggle_like(&self, id: Uuid) -> Result<(), Error> {
        let pending = optimistic::begin(
            &self.in_flight,
            format!("like:{id}"),
            &self.state,
            |feed| {
                let item = feed.loaded(id)?;
                Ok((item.content_type, item.is_liked, item.engagement.likes, feed.revision))
            },
            |feed| feed.with_item(id, |item| {
                item.toggle_like();
            }),
        )?;
        let content = pending.snapshot().0;
        let res = self.backend.toggle_like(content, id).await;
        pending.settle(&self.state, res, |_, ()| (), |feed, (_, liked, likes, rev)| {
            feed.roll_back(rev, id, |item| {
                item.is_liked = liked;
                item.engagement.likes = likes;
            })
        })
    }

    pub async fn toggle_bookmark(&self, id: Uuid) -> Result<(), Error> {
        let pending = optimistic::begin(
            &self.in_flight,
            format!("bookmark:{id}"),
            &self.state,
            |feed| {
                let item = feed.loaded(id)?;
                Ok((item.content_type, item.is_bookmarked, feed.revision))
            },
            |feed| feed.with_item(id, |item| {
                item.toggle_bookmark();
            }),
        )?;
        let content = pending.snapshot().0;
        let res = self.backend.toggle_bookmark(content, id).await;
        pending.settle(&self.state, res, |_, ()| (), |feed, (_, bookmarked, rev)| {
            feed.roll_back(rev, id, |item| item.is_bookmarked = bookmarked)
        })
    }

    /// Publish a post, then reload the first page so that it shows up
    ///
    /// Failing to reload does not undo the publication, it is only logged.
    pub async fn publish(&self, new: NewPost) -> Result<Post, Error> {
        new.validate()?;
        let post = self.backend.create_post(new).await?;
        tracing::info!(post = %post.id.0, "published post");
        if let Err(err) = self.refresh().await {
            tracing::warn!(?err, "failed reloading feed after publishing");
        }
        Ok(post)
    }

    /// Delete one of our posts, putting it back where it was on failure
    pub async fn delete_post(&self, id: PostId) -> Result<(), Error> {
        let pending = optimistic::begin(
            &self.in_flight,
            format!("delete:{}", id.0),
            &self.state,
            |feed| {
                let pos = feed
                    .items
                    .iter()
                    .position(|i| i.id == id.0)
                    .ok_or_else(|| Error::NotLoaded(format!("feed item {}", id.0)))?;
                if feed.items[pos].content_type != ContentType::Post {
                    return Err(Error::Unsupported("only posts can be deleted from the feed"));
                }
                Ok((pos, feed.items[pos].clone(), feed.revision))
            },
            |feed| feed.items.retain(|i| i.id != id.0),
        )?;
        let res = self.backend.delete_post(id).await;
        pending.settle(
            &self.state,
            res,
            |feed, ()| feed.items.retain(|i| i.id != id.0),
            |feed, (pos, item, rev)| {
                if feed.revision != rev || feed.item(id.0).is_some() {
                    tracing::debug!(post = %id.0, "feed reloaded meanwhile, not restoring post");
                    return;
                }
                let pos = pos.min(feed.items.len());
                feed.items.insert(pos, item);
            },
        )
    }

    pub async fn share(&self, id: Uuid) -> Result<(), Error> {
        let pending = optimistic::begin(
            &self.in_flight,
            format!("share:{id}"),
            &self.state,
            |feed| {
                let item = feed.loaded(id)?;
                Ok((item.content_type, item.is_shared, item.engagement.shares, feed.revision))
            },
            |feed| feed.with_item(id, FeedItemExt::record_share),
        )?;
        let content: ContentType = pending.snapshot().0;
        let res = self.backend.track_share(content, id).await;
        pending.settle(&self.state, res, |_, ()| (), |feed, (_, shared, shares, rev)| {
            feed.roll_back(rev, id, |item| {
                item.is_shared = shared;
                item.engagement.shares = shares;
            })
        })
    }
}
