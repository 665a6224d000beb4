use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
    api::{Badge, FollowStatus, ProfileStats, User, UserId},
    optimistic::{self, InFlight},
    toggle_counter, Backend, Error,
};

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Profile {
    pub user: User,
    pub stats: ProfileStats,
    pub badges: Vec<Badge>,
    pub follow: FollowStatus,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ProfileView {
    Loading,
    Loaded(Profile),

    /// Terminal state, the frontend shows "could not load this profile"
    CouldNotLoad,
}

fn or_default<T: Default>(user: UserId, what: &'static str, res: Result<T, Error>) -> T {
    res.unwrap_or_else(|err| {
        tracing::warn!(user = %user.0, ?err, "failed loading profile {what}");
        T::default()
    })
}

/// Fetch everything a profile page shows, in parallel
///
/// Only the user itself is required: stats, badges and follow status fall
/// back to empty values when their request fails.
pub async fn load_profile<B: Backend + ?Sized>(backend: &B, user: UserId) -> ProfileView {
    let (profile, stats, badges, follow) = futures::join!(
        backend.fetch_user(user),
        backend.fetch_profile_stats(user),
        backend.fetch_badges(user),
        backend.fetch_follow_status(user),
    );
    let profile = match profile {
        Ok(p) => p,
        Err(err) => {
            tracing::warn!(user = %user.0, ?err, "failed loading profile");
            return ProfileView::CouldNotLoad;
        }
    };
    ProfileView::Loaded(Profile {
        user: profile,
        stats: or_default(user, "stats", stats),
        badges: or_default(user, "badges", badges),
        follow: or_default(user, "follow status", follow),
    })
}

struct Slot {
    view: ProfileView,

    // bumped by every load
    revision: u64,
}

pub struct ProfileState<B> {
    backend: Arc<B>,
    user: UserId,
    state: Mutex<Slot>,
    in_flight: InFlight,
}

impl<B: Backend> ProfileState<B> {
    pub fn new(backend: Arc<B>, user: UserId) -> ProfileState<B> {
        ProfileState {
            backend,
            user,
            state: Mutex::new(Slot {
                view: ProfileView::Loading,
                revision: 0,
            }),
            in_flight: InFlight::new(),
        }
    }

    pub fn view(&self) -> ProfileView {
        self.state.lock().view.clone()
    }

    pub async fn load(&self) {
        let view = load_profile(&*self.backend, self.user).await;
        let mut slot = self.state.lock();
        slot.view = view;
        slot.revision += 1;
    }

    /// Follow or unfollow, returning whether we now follow the user
    pub async fn toggle_follow(&self) -> Result<bool, Error> {
        let user = self.user;
        let pending = optimistic::begin(
            &self.in_flight,
            format!("follow:{}", user.0),
            &self.state,
            |slot| match &slot.view {
                ProfileView::Loaded(p) => {
                    Ok((p.follow.is_following, p.stats.followers, slot.revision))
                }
                _ => Err(Error::NotLoaded(format!("profile {}", user.0))),
            },
            |slot| {
                if let ProfileView::Loaded(p) = &mut slot.view {
                    toggle_counter(&mut p.follow.is_following, &mut p.stats.followers);
                }
            },
        )?;
        let follow = !pending.snapshot().0;
        let res = self.backend.set_following(user, follow).await;
        pending.settle(&self.state, res, |_, ()| (), |slot, (following, followers, rev)| {
            if slot.revision != rev {
                tracing::debug!(user = %user.0, "profile reloaded meanwhile, keeping the server's state");
                return;
            }
            if let ProfileView::Loaded(p) = &mut slot.view {
                p.follow.is_following = following;
                p.stats.followers = followers;
            }
        })?;
        Ok(follow)
    }
}
