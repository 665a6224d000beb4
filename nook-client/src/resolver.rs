use std::{collections::HashMap, sync::Arc};

use chrono::{Duration, Utc};
use parking_lot::Mutex;

use crate::{
    api::{self, MentionUser, Time},
    Backend, ClientConfig, Error,
};

#[derive(Clone, Debug)]
struct Entry {
    user: MentionUser,
    inserted: Time,
    last_used: u64,
}

/// Username → user cache, bounded in size and age
///
/// Usernames are compared case-insensitively. When full, the least recently
/// used entry is evicted.
#[derive(Clone, Debug)]
pub struct MentionCache {
    capacity: usize,
    ttl: Duration,
    entries: HashMap<String, Entry>,
    clock: u64,
}

impl MentionCache {
    pub fn new(capacity: usize, ttl: Duration) -> MentionCache {
        MentionCache {
            capacity,
            ttl,
            entries: HashMap::new(),
            clock: 0,
        }
    }

    pub fn get(&mut self, username: &str, now: Time) -> Option<MentionUser> {
        let key = username.to_ascii_lowercase();
        let expired = match self.entries.get(&key) {
            None => return None,
            Some(e) => now - e.inserted >= self.ttl,
        };
        if expired {
            self.entries.remove(&key);
            return None;
        }
        self.clock += 1;
        let e = self.entries.get_mut(&key)?;
        e.last_used = self.clock;
        Some(e.user.clone())
    }

    pub fn insert(&mut self, user: MentionUser, now: Time) {
        if self.capacity == 0 {
            return;
        }
        let key = user.username.to_ascii_lowercase();
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            self.evict(now);
        }
        self.clock += 1;
        self.entries.insert(
            key,
            Entry {
                user,
                inserted: now,
                last_used: self.clock,
            },
        );
    }

    // Drop expired entries, and if that was not enough the least recently used one
    fn evict(&mut self, now: Time) {
        let ttl = self.ttl;
        self.entries.retain(|_, e| now - e.inserted < ttl);
        if self.entries.len() < self.capacity {
            return;
        }
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, e)| e.last_used)
            .map(|(k, _)| k.clone());
        if let Some(k) = oldest {
            self.entries.remove(&k);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Resolves usernames to users, lazily, for one session
pub struct MentionResolver<B> {
    backend: Arc<B>,
    search_limit: u32,
    cache: Mutex<MentionCache>,
}

impl<B: Backend> MentionResolver<B> {
    pub fn new(backend: Arc<B>, config: &ClientConfig) -> MentionResolver<B> {
        MentionResolver {
            backend,
            search_limit: config.mention_search_limit,
            cache: Mutex::new(MentionCache::new(
                config.mention_cache_capacity,
                config.mention_cache_ttl,
            )),
        }
    }

    /// Look up a mentioned user
    ///
    /// `Ok(None)` means no such user: a mention of someone who does not exist
    /// is just text.
    pub async fn resolve(&self, username: &str) -> Result<Option<MentionUser>, Error> {
        if api::validate_username(username).is_err() {
            return Ok(None);
        }
        if let Some(u) = self.cache.lock().get(username, Utc::now()) {
            return Ok(Some(u));
        }
        let candidates = self
            .backend
            .search_mentions(username, self.search_limit)
            .await?;
        let now = Utc::now();
        let mut cache = self.cache.lock();
        let mut found = None;
        for u in candidates {
            if u.username.eq_ignore_ascii_case(username) {
                found = Some(u.clone());
            }
            cache.insert(u, now);
        }
        if found.is_none() {
            tracing::debug!(username, "mention did not resolve to any user");
        }
        Ok(found)
    }

    /// Forget everything, eg. on logout
    pub fn clear(&self) {
        self.cache.lock().clear();
    }

    pub fn cached(&self) -> usize {
        self.cache.lock().len()
    }
}
