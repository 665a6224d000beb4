use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use chrono::Utc;
use parking_lot::Mutex;

use crate::{
    api::{
        Comment, CommentId, CommentTarget, NewComment, ReactionKind, ReactionTarget, Reactions,
        UserId,
    },
    optimistic::{self, InFlight},
    Backend, Error, ReactionsExt,
};

/// Parent → replies index over a flat list of comments
///
/// Comments whose parent is not in the list, and all their descendants, are
/// orphans: they are listed apart and never part of the tree.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ReplyIndex {
    roots: Vec<CommentId>,
    children: HashMap<CommentId, Vec<CommentId>>,
    orphans: Vec<CommentId>,
    order: Vec<(usize, CommentId)>,
}

impl ReplyIndex {
    pub fn build(comments: &[Comment]) -> ReplyIndex {
        let present = comments.iter().map(|c| c.id).collect::<HashSet<_>>();
        let mut roots = Vec::new();
        let mut children = HashMap::<CommentId, Vec<CommentId>>::new();
        for c in comments {
            match c.parent_id {
                None => roots.push(c.id),
                Some(p) if present.contains(&p) => children.entry(p).or_default().push(c.id),
                Some(_) => (),
            }
        }

        // depth-first from the roots, anything not reached is an orphan
        let mut order = Vec::with_capacity(comments.len());
        let mut seen = HashSet::new();
        let mut stack = roots.iter().rev().map(|r| (0, *r)).collect::<Vec<_>>();
        while let Some((depth, id)) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            order.push((depth, id));
            if let Some(replies) = children.get(&id) {
                stack.extend(replies.iter().rev().map(|r| (depth + 1, *r)));
            }
        }
        let orphans = comments
            .iter()
            .map(|c| c.id)
            .filter(|id| !seen.contains(id))
            .collect::<Vec<_>>();
        if !orphans.is_empty() {
            tracing::debug!(count = orphans.len(), "comments with a missing parent");
        }

        ReplyIndex {
            roots,
            children,
            orphans,
            order,
        }
    }

    pub fn roots(&self) -> &[CommentId] {
        &self.roots
    }

    pub fn replies(&self, id: CommentId) -> &[CommentId] {
        self.children.get(&id).map(|v| &v[..]).unwrap_or(&[])
    }

    pub fn orphans(&self) -> &[CommentId] {
        &self.orphans
    }

    /// The tree in display order, each comment with its nesting depth
    pub fn walk(&self) -> &[(usize, CommentId)] {
        &self.order
    }
}

/// Comments on a post or topic, or messages in a nook
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Thread {
    pub target: CommentTarget,

    /// Oldest first
    pub comments: Vec<Comment>,

    /// Displayed comment count
    pub total: u64,

    provisional: HashSet<CommentId>,
    index: ReplyIndex,
    generation: u64,

    // bumped whenever a server listing replaces the comments
    revision: u64,
}

impl Thread {
    pub fn new(target: CommentTarget) -> Thread {
        Thread {
            target,
            comments: Vec::new(),
            total: 0,
            provisional: HashSet::new(),
            index: ReplyIndex::default(),
            generation: 0,
            revision: 0,
        }
    }

    pub fn comment(&self, id: CommentId) -> Option<&Comment> {
        self.comments.iter().find(|c| c.id == id)
    }

    /// Whether the comment is still waiting for the server's acknowledgment
    pub fn is_provisional(&self, id: CommentId) -> bool {
        self.provisional.contains(&id)
    }

    pub fn index(&self) -> &ReplyIndex {
        &self.index
    }

    fn position(&self, id: CommentId) -> Option<usize> {
        self.comments.iter().position(|c| c.id == id)
    }

    fn loaded(&self, id: CommentId) -> Result<(usize, &Comment), Error> {
        if self.is_provisional(id) {
            return Err(Error::Unsupported("this message is still being sent"));
        }
        let pos = self
            .position(id)
            .ok_or_else(|| Error::NotLoaded(format!("comment {}", id.0)))?;
        Ok((pos, &self.comments[pos]))
    }

    fn reindex(&mut self) {
        self.index = ReplyIndex::build(&self.comments);
    }

    fn replace(&mut self, fetched: Vec<Comment>) {
        self.revision += 1;
        let previous = std::mem::replace(&mut self.comments, fetched);
        let provisional = &self.provisional;
        self.comments
            .extend(previous.into_iter().filter(|c| provisional.contains(&c.id)));
        self.total = self.comments.len() as u64;
        self.reindex();
    }

    fn push_provisional(&mut self, c: Comment) {
        self.provisional.insert(c.id);
        self.comments.push(c);
        self.total += 1;
        self.reindex();
    }

    // Swap the provisional entry for the server's, in place
    //
    // A refresh may already have brought the server's copy in, in which case
    // the provisional entry is only dropped.
    fn acknowledge(&mut self, provisional: CommentId, c: Comment) {
        if self.position(c.id).is_some() {
            self.drop_provisional(provisional);
            return;
        }
        self.provisional.remove(&provisional);
        match self.position(provisional) {
            Some(pos) => self.comments[pos] = c,
            None => {
                tracing::debug!(id = %provisional.0, "provisional comment vanished");
                self.comments.push(c);
                self.total += 1;
            }
        }
        self.reindex();
    }

    fn remove(&mut self, id: CommentId) {
        if let Some(pos) = self.position(id) {
            self.comments.remove(pos);
            self.total = self.total.saturating_sub(1);
            self.reindex();
        }
    }

    fn reloaded_since(&self, revision: u64) -> bool {
        if self.revision != revision {
            tracing::debug!("comments reloaded meanwhile, keeping the server's state");
        }
        self.revision != revision
    }

    // Put back a comment whose deletion failed, unless a refresh already
    // brought the server's list
    fn restore(&mut self, revision: u64, pos: usize, c: Comment) {
        if self.reloaded_since(revision) || self.position(c.id).is_some() {
            return;
        }
        let pos = pos.min(self.comments.len());
        self.comments.insert(pos, c);
        self.total += 1;
        self.reindex();
    }

    fn drop_provisional(&mut self, provisional: CommentId) {
        self.provisional.remove(&provisional);
        if let Some(pos) = self.position(provisional) {
            self.comments.remove(pos);
        }
        self.total = self.total.saturating_sub(1);
        self.reindex();
    }

    fn with_reactions(&mut self, id: CommentId, f: impl FnOnce(&mut Reactions)) {
        match self.comments.iter_mut().find(|c| c.id == id) {
            Some(c) => f(&mut c.reactions),
            None => tracing::debug!(id = %id.0, "comment vanished before rollback"),
        }
    }
}

pub struct ThreadView<B> {
    backend: Arc<B>,
    me: UserId,
    my_name: String,
    state: Mutex<Thread>,
    in_flight: InFlight,
}

impl<B: Backend> ThreadView<B> {
    /// `me` and `my_name` are used to render our own messages before the
    /// server acknowledges them
    pub fn new(
        backend: Arc<B>,
        target: CommentTarget,
        me: UserId,
        my_name: impl Into<String>,
    ) -> ThreadView<B> {
        ThreadView {
            backend,
            me,
            my_name: my_name.into(),
            state: Mutex::new(Thread::new(target)),
            in_flight: InFlight::new(),
        }
    }

    pub fn snapshot(&self) -> Thread {
        self.state.lock().clone()
    }

    pub fn comment(&self, id: CommentId) -> Option<Comment> {
        self.state.lock().comment(id).cloned()
    }

    fn target(&self) -> CommentTarget {
        self.state.lock().target
    }

    /// Reload all comments
    ///
    /// Messages still being sent stay at the end of the list.
    pub async fn refresh(&self) -> Result<(), Error> {
        let (target, generation) = {
            let mut state = self.state.lock();
            state.generation += 1;
            (state.target, state.generation)
        };
        let comments = self.backend.list_comments(target).await?;
        let mut state = self.state.lock();
        if state.generation != generation {
            tracing::debug!(generation, "dropping stale comments response");
            return Ok(());
        }
        state.replace(comments);
        Ok(())
    }

    /// Send a comment, showing it right away
    ///
    /// Returns the id the server assigned to it.
    pub async fn post(&self, new: NewComment) -> Result<CommentId, Error> {
        new.validate()?;
        let target = self.target();
        let provisional = Comment {
            id: CommentId::provisional(),
            target,
            parent_id: new.parent_id,
            owner_id: self.me,
            author_name: self.my_name.clone(),
            text: new.text.clone(),
            date: Utc::now(),
            reactions: Reactions::default(),
            mentioned_user_ids: new.mentioned_user_ids.clone(),
        };
        let pid = provisional.id;
        let pending = optimistic::begin(
            &self.in_flight,
            format!("comment:{}", pid.0),
            &self.state,
            |_| Ok(()),
            |thread| thread.push_provisional(provisional),
        )?;
        let res = self.backend.create_comment(target, new).await;
        let mut id = pid;
        pending.settle(
            &self.state,
            res,
            |thread, c| {
                id = c.id;
                thread.acknowledge(pid, c);
            },
            |thread, ()| thread.drop_provisional(pid),
        )?;
        Ok(id)
    }

    /// Remove a comment, putting it back where it was if the server refuses
    pub async fn delete(&self, id: CommentId) -> Result<(), Error> {
        let pending = optimistic::begin(
            &self.in_flight,
            format!("comment:{}", id.0),
            &self.state,
            |thread| {
                let (pos, c) = thread.loaded(id)?;
                Ok((thread.target, pos, c.clone(), thread.revision))
            },
            |thread| thread.remove(id),
        )?;
        let target = pending.snapshot().0;
        let res = self.backend.delete_comment(target, id).await;
        // a refresh that landed meanwhile may have brought the comment back
        pending.settle(
            &self.state,
            res,
            |thread, ()| thread.remove(id),
            |thread, (_, pos, c, rev)| thread.restore(rev, pos, c),
        )
    }

    /// React to a nook message
    pub async fn toggle_reaction(&self, id: CommentId, kind: ReactionKind) -> Result<(), Error> {
        kind.validate()?;
        let pending = optimistic::begin(
            &self.in_flight,
            format!("reaction:{}:{kind}", id.0),
            &self.state,
            |thread| {
                if !matches!(thread.target, CommentTarget::Nook(_)) {
                    return Err(Error::Unsupported("only nook messages take reactions"));
                }
                let (_, c) = thread.loaded(id)?;
                Ok((c.reactions.get(&kind), thread.revision))
            },
            |thread| {
                thread.with_reactions(id, |r| {
                    r.toggle(&kind);
                })
            },
        )?;
        let res = self
            .backend
            .toggle_reaction(ReactionTarget::NookMessage(id), &kind)
            .await;
        pending.settle(&self.state, res, |_, ()| (), |thread, (before, rev)| {
            if !thread.reloaded_since(rev) {
                thread.with_reactions(id, |r| r.restore(&kind, before))
            }
        })
    }
}
