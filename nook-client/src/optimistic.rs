//! Optimistic mutations
//!
//! Every user action that changes server state goes through the same steps:
//! [`begin`] captures a snapshot and applies the change locally, so that
//! readers of the state see it right away; then the caller awaits the network
//! call with no lock held; finally [`Pending::settle`] either reconciles the
//! state with the server's answer or restores the snapshot.
//!
//! Mutations are keyed. While a mutation is pending, another one with the same
//! key is refused with [`Error::AlreadyPending`], so two toggles of the same
//! flag can never race each other.

use std::collections::HashSet;

use parking_lot::Mutex;

use crate::Error;

/// Keys of the mutations currently awaiting the server
#[derive(Debug, Default)]
pub struct InFlight(Mutex<HashSet<String>>);

impl InFlight {
    pub fn new() -> InFlight {
        InFlight::default()
    }

    pub fn claim(&self, key: impl Into<String>) -> Result<Claim<'_>, Error> {
        let key = key.into();
        if !self.0.lock().insert(key.clone()) {
            return Err(Error::AlreadyPending(key));
        }
        Ok(Claim {
            in_flight: self,
            key,
        })
    }

    pub fn is_pending(&self, key: &str) -> bool {
        self.0.lock().contains(key)
    }

    pub fn len(&self) -> usize {
        self.0.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.lock().is_empty()
    }
}

/// Releases its key when dropped
#[derive(Debug)]
pub struct Claim<'a> {
    in_flight: &'a InFlight,
    key: String,
}

impl Claim<'_> {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        self.in_flight.0.lock().remove(&self.key);
    }
}

/// A change that was applied locally and awaits the server's answer
#[must_use = "a pending change must be settled, or it will never be rolled back"]
#[derive(Debug)]
pub struct Pending<'a, S> {
    snapshot: S,
    claim: Claim<'a>,
}

/// Claim `key`, capture a snapshot of `state` and apply the change to it
///
/// `snapshot` may refuse the change (eg. the entity is not loaded), in which
/// case nothing is applied and the key is released.
pub fn begin<'a, T, S>(
    in_flight: &'a InFlight,
    key: impl Into<String>,
    state: &Mutex<T>,
    snapshot: impl FnOnce(&T) -> Result<S, Error>,
    apply: impl FnOnce(&mut T),
) -> Result<Pending<'a, S>, Error> {
    let claim = in_flight.claim(key)?;
    let mut state = state.lock();
    let snapshot = snapshot(&*state)?;
    apply(&mut *state);
    tracing::debug!(key = claim.key(), "applied optimistic change");
    Ok(Pending { snapshot, claim })
}

impl<'a, S> Pending<'a, S> {
    pub fn snapshot(&self) -> &S {
        &self.snapshot
    }

    pub fn key(&self) -> &str {
        self.claim.key()
    }

    /// Reconcile on success, restore the snapshot on failure
    ///
    /// The network error is handed back so that the caller can surface it.
    pub fn settle<T, R>(
        self,
        state: &Mutex<T>,
        result: Result<R, Error>,
        reconcile: impl FnOnce(&mut T, R),
        restore: impl FnOnce(&mut T, S),
    ) -> Result<(), Error> {
        let Pending { snapshot, claim } = self;
        let mut state = state.lock();
        match result {
            Ok(response) => {
                reconcile(&mut *state, response);
                tracing::debug!(key = claim.key(), "optimistic change confirmed");
                Ok(())
            }
            Err(err) => {
                restore(&mut *state, snapshot);
                tracing::warn!(key = claim.key(), ?err, "optimistic change rolled back");
                Err(err)
            }
        }
    }
}
