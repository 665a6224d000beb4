use std::collections::BTreeMap;

use chrono::Duration;

use crate::{
    api::{MentionUser, Time, UserId},
    Backend, ClientConfig, Error,
};

/// The `@` token the cursor is in
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ActiveMention {
    /// Byte offset of the `@`
    pub start: usize,

    /// What was typed between the `@` and the cursor
    pub query: String,
}

/// Find the mention being typed at `cursor`, a byte offset into `text`
///
/// The token must start with `@`, and be either at the start of the text or
/// right after a whitespace.
pub fn active_mention(text: &str, cursor: usize) -> Option<ActiveMention> {
    let before = text.get(..cursor)?;
    let start = before
        .char_indices()
        .rev()
        .find(|(_, c)| c.is_whitespace())
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    let query = before[start..].strip_prefix('@')?;
    Some(ActiveMention {
        start,
        query: String::from(query),
    })
}

/// A search that became due, to hand back to [`MentionComposer::receive`]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SuggestionQuery {
    pub generation: u64,
    pub query: String,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Key {
    Up,
    Down,
    Enter,
    Tab,
    Escape,
    Other,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum KeyOutcome {
    /// The key is for the text box
    Ignored,

    /// The key was used by the suggestion list, and must not reach the text box
    Handled,
}

/// Mention autocompletion state for one text box
///
/// Time is passed in by the caller: `set_input` arms the debounce and `due`
/// must be polled to know when to search.
#[derive(Clone, Debug)]
pub struct MentionComposer {
    text: String,
    cursor: usize,
    debounce: Duration,
    active: Option<ActiveMention>,
    deadline: Option<Time>,
    generation: u64,
    suggestions: Vec<MentionUser>,
    selected: usize,
    mappings: BTreeMap<String, UserId>,
}

impl MentionComposer {
    pub fn new(config: &ClientConfig) -> MentionComposer {
        MentionComposer {
            text: String::new(),
            cursor: 0,
            debounce: config.mention_debounce,
            active: None,
            deadline: None,
            generation: 0,
            suggestions: Vec::new(),
            selected: 0,
            mappings: BTreeMap::new(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn suggestions(&self) -> &[MentionUser] {
        &self.suggestions
    }

    pub fn selected(&self) -> Option<usize> {
        self.is_open().then_some(self.selected)
    }

    pub fn is_open(&self) -> bool {
        self.active.is_some() && !self.suggestions.is_empty()
    }

    /// Record a keystroke's result
    pub fn set_input(&mut self, text: impl Into<String>, cursor: usize, now: Time) {
        self.text = text.into();
        self.cursor = cursor.min(self.text.len());
        self.prune();
        // whatever search is in flight now answers an outdated question
        self.generation += 1;
        self.active = active_mention(&self.text, self.cursor);
        match self.active {
            Some(_) => self.deadline = Some(now + self.debounce),
            None => self.close(),
        }
    }

    /// The search to issue, if the debounce delay elapsed since the last keystroke
    pub fn due(&mut self, now: Time) -> Option<SuggestionQuery> {
        match self.deadline {
            Some(d) if d <= now => {
                self.deadline = None;
                let query = self.active.as_ref()?.query.clone();
                Some(SuggestionQuery {
                    generation: self.generation,
                    query,
                })
            }
            _ => None,
        }
    }

    /// Show search results, returning false if they came too late to be useful
    pub fn receive(&mut self, query: &SuggestionQuery, users: Vec<MentionUser>) -> bool {
        if query.generation != self.generation || self.active.is_none() {
            tracing::trace!(query = %query.query, "dropping stale mention suggestions");
            return false;
        }
        self.suggestions = users;
        self.selected = 0;
        true
    }

    pub fn on_key(&mut self, key: Key) -> KeyOutcome {
        if !self.is_open() {
            return KeyOutcome::Ignored;
        }
        let len = self.suggestions.len();
        match key {
            Key::Up => self.selected = (self.selected + len - 1) % len,
            Key::Down => self.selected = (self.selected + 1) % len,
            Key::Enter | Key::Tab => {
                self.accept(self.selected);
            }
            Key::Escape => self.dismiss(),
            Key::Other => return KeyOutcome::Ignored,
        }
        KeyOutcome::Handled
    }

    /// Replace the partial token with the `i`-th suggestion
    ///
    /// Returns false if there is no such suggestion.
    pub fn accept(&mut self, i: usize) -> bool {
        let user = match self.suggestions.get(i) {
            Some(u) => u.clone(),
            None => return false,
        };
        let active = match self.active.take() {
            Some(a) => a,
            None => return false,
        };
        let inserted = format!("@{} ", user.username);
        self.text.replace_range(active.start..self.cursor, &inserted);
        self.cursor = active.start + inserted.len();
        self.mappings.insert(user.username, user.id);
        self.generation += 1;
        self.close();
        true
    }

    /// Close the suggestion list, eg. on a click outside of it
    pub fn dismiss(&mut self) {
        self.active = None;
        self.generation += 1;
        self.close();
    }

    /// Users picked from the suggestions whose mention is still in the text
    pub fn mentioned_user_ids(&self) -> Vec<UserId> {
        self.mappings
            .iter()
            .filter(|(name, _)| self.text.contains(&format!("@{name}")))
            .map(|(_, id)| *id)
            .collect()
    }

    /// Forget everything, eg. once the message was sent
    pub fn reset(&mut self) {
        self.text.clear();
        self.cursor = 0;
        self.mappings.clear();
        self.dismiss();
    }

    fn close(&mut self) {
        self.deadline = None;
        self.suggestions.clear();
        self.selected = 0;
    }

    fn prune(&mut self) {
        let text = &self.text;
        self.mappings
            .retain(|name, _| text.contains(&format!("@{name}")));
    }
}

pub async fn fetch_suggestions<B: Backend + ?Sized>(
    backend: &B,
    query: &SuggestionQuery,
    limit: u32,
) -> Result<Vec<MentionUser>, Error> {
    backend.search_mentions(&query.query, limit).await
}
