use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
    api::{NewNook, Nook, NookFilter, NookId, NookMember},
    optimistic::{self, InFlight},
    toggle_counter, Backend, Error,
};

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum NookDetail {
    Loaded { nook: Nook, members: Vec<NookMember> },

    /// Missing, expired, or failed to load
    NotFound,
}

/// Fetch a nook and its members
///
/// A nook that fails to load is shown as not found. Failing to list the
/// members only leaves the list empty.
pub async fn load_nook<B: Backend + ?Sized>(backend: &B, id: NookId) -> NookDetail {
    let (nook, members) = futures::join!(backend.fetch_nook(id), backend.nook_members(id));
    let nook = match nook {
        Ok(n) => n,
        Err(err) => {
            tracing::warn!(nook = %id.0, ?err, "failed loading nook");
            return NookDetail::NotFound;
        }
    };
    let members = members.unwrap_or_else(|err| {
        tracing::warn!(nook = %id.0, ?err, "failed loading nook members");
        Vec::new()
    });
    NookDetail::Loaded { nook, members }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct NookList {
    pub nooks: Vec<Nook>,

    /// Filter the current list was fetched with
    pub filter: NookFilter,

    generation: u64,

    // bumped whenever a server listing replaces the nooks
    revision: u64,
}

impl NookList {
    pub fn nook(&self, id: NookId) -> Option<&Nook> {
        self.nooks.iter().find(|n| n.id == id)
    }

    fn nook_mut(&mut self, id: NookId) -> Option<&mut Nook> {
        self.nooks.iter_mut().find(|n| n.id == id)
    }

    fn membership(&self, id: NookId) -> Result<(bool, u64), Error> {
        self.nook(id)
            .map(|n| (n.is_member, n.member_count))
            .ok_or_else(|| Error::NotLoaded(format!("nook {}", id.0)))
    }
}

pub struct NookBrowser<B> {
    backend: Arc<B>,
    state: Mutex<NookList>,
    in_flight: InFlight,
}

impl<B: Backend> NookBrowser<B> {
    pub fn new(backend: Arc<B>) -> NookBrowser<B> {
        NookBrowser {
            backend,
            state: Mutex::new(NookList::default()),
            in_flight: InFlight::new(),
        }
    }

    pub fn snapshot(&self) -> NookList {
        self.state.lock().clone()
    }

    pub fn nooks(&self) -> Vec<Nook> {
        self.state.lock().nooks.clone()
    }

    /// List the nooks matching `filter`
    ///
    /// When the filter changes again before the answer comes, the answer is
    /// dropped.
    pub async fn refresh(&self, filter: NookFilter) -> Result<(), Error> {
        let generation = {
            let mut state = self.state.lock();
            state.generation += 1;
            state.generation
        };
        let nooks = self.backend.list_nooks(&filter).await?;
        let mut state = self.state.lock();
        if state.generation != generation {
            tracing::debug!(generation, "dropping stale nook list");
            return Ok(());
        }
        state.nooks = nooks;
        state.filter = filter;
        state.revision += 1;
        Ok(())
    }

    /// Create a nook, adding it at the top of the list once the server has it
    pub async fn create(&self, new: NewNook) -> Result<Nook, Error> {
        new.validate()?;
        let nook = self.backend.create_nook(new).await?;
        tracing::info!(nook = %nook.id.0, "created nook");
        let mut state = self.state.lock();
        if state.nook(nook.id).is_none() {
            state.nooks.insert(0, nook.clone());
        }
        Ok(nook)
    }

    pub async fn join(&self, id: NookId) -> Result<(), Error> {
        self.set_membership(id, true).await
    }

    pub async fn leave(&self, id: NookId) -> Result<(), Error> {
        self.set_membership(id, false).await
    }

    async fn set_membership(&self, id: NookId, join: bool) -> Result<(), Error> {
        let pending = optimistic::begin(
            &self.in_flight,
            format!("membership:{}", id.0),
            &self.state,
            |list| {
                let before = list.membership(id)?;
                match before.0 == join {
                    true => Err(Error::Unsupported(match join {
                        true => "already a member of this nook",
                        false => "not a member of this nook",
                    })),
                    false => Ok((before, list.revision)),
                }
            },
            |list| {
                if let Some(n) = list.nook_mut(id) {
                    toggle_counter(&mut n.is_member, &mut n.member_count);
                }
            },
        )?;
        let res = match join {
            true => self.backend.join_nook(id).await,
            false => self.backend.leave_nook(id).await,
        };
        pending.settle(&self.state, res, |_, ()| (), |list, ((member, count), rev)| {
            if list.revision != rev {
                tracing::debug!(nook = %id.0, "nooks reloaded meanwhile, keeping the server's state");
                return;
            }
            if let Some(n) = list.nook_mut(id) {
                n.is_member = member;
                n.member_count = count;
            }
        })
    }
}
