use crate::api::{ReactionKind, Reactions};

/// Flip `flag`, moving `count` along with it
///
/// The count never goes below zero, even if the server sent an inconsistent
/// state. Returns the new value of the flag.
pub fn toggle_counter(flag: &mut bool, count: &mut u64) -> bool {
    *flag = !*flag;
    *count = match *flag {
        true => count.saturating_add(1),
        false => count.saturating_sub(1),
    };
    *flag
}

pub trait ReactionsExt {
    /// Returns whether the current user now has this reaction
    fn toggle(&mut self, kind: &ReactionKind) -> bool;

    /// Put back the state of one reaction kind, as captured by `get`
    fn restore(&mut self, kind: &ReactionKind, state: (bool, u64));

    fn get(&self, kind: &ReactionKind) -> (bool, u64);
}

impl ReactionsExt for Reactions {
    fn toggle(&mut self, kind: &ReactionKind) -> bool {
        let flag = self.user_reactions.entry(kind.clone()).or_insert(false);
        let count = self.reaction_counts.entry(kind.clone()).or_insert(0);
        toggle_counter(flag, count)
    }

    fn restore(&mut self, kind: &ReactionKind, (flag, count): (bool, u64)) {
        self.user_reactions.insert(kind.clone(), flag);
        self.reaction_counts.insert(kind.clone(), count);
    }

    fn get(&self, kind: &ReactionKind) -> (bool, u64) {
        (self.has_reacted(kind), self.count(kind))
    }
}
