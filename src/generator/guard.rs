//! Call tokens and the loading-flag drop guard.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;

use crate::types::{GenerationState, Recipe};

/// Issues call tokens and decides which call owns the observable state.
///
/// Token bumps and state writes both happen inside the watch channel's
/// write lock, so a publish can never interleave with a newer call's
/// reset.
pub(crate) struct StateCell {
    state: watch::Sender<GenerationState>,
    latest: AtomicU64,
}

impl StateCell {
    pub(crate) fn new() -> Self {
        let (state, _) = watch::channel(GenerationState::default());
        Self {
            state,
            latest: AtomicU64::new(0),
        }
    }

    pub(crate) fn snapshot(&self) -> GenerationState {
        self.state.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<GenerationState> {
        self.state.subscribe()
    }

    /// Start a new call: invalidate every older token and publish the
    /// pending state.
    pub(crate) fn begin(&self) -> LoadingGuard<'_> {
        let mut token = 0;
        self.state.send_modify(|state| {
            token = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
            *state = GenerationState::pending();
        });
        LoadingGuard { cell: self, token }
    }

    /// Replace `current` with `edited` if `current` is what is displayed
    /// and no call is in flight.
    pub(crate) fn replace_recipe(&self, current: &Recipe, edited: &Recipe) -> bool {
        self.state.send_if_modified(|state| {
            if state.is_loading || state.recipe.as_ref() != Some(current) {
                return false;
            }
            state.recipe = Some(edited.clone());
            true
        })
    }

    fn is_current(&self, token: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == token
    }
}

/// Held for the lifetime of one `generate` call.
///
/// Dropping it clears the loading flag, but only while its call is still
/// the latest one. A cancelled or panicking call therefore never leaves
/// the state stuck in pending, and never touches a newer call's state.
pub(crate) struct LoadingGuard<'a> {
    cell: &'a StateCell,
    token: u64,
}

impl LoadingGuard<'_> {
    /// Publish the call's result. Returns `false` if a newer call has
    /// started, in which case nothing is written.
    pub(crate) fn settle(&self, recipe: Option<Recipe>, error: Option<String>) -> bool {
        let cell = self.cell;
        let token = self.token;
        let mut published = false;
        cell.state.send_if_modified(|state| {
            if !cell.is_current(token) {
                return false;
            }
            *state = GenerationState {
                recipe: recipe.clone(),
                is_loading: false,
                error: error.clone(),
            };
            published = true;
            true
        });
        published
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        let cell = self.cell;
        let token = self.token;
        cell.state.send_if_modified(|state| {
            if !cell.is_current(token) || !state.is_loading {
                return false;
            }
            state.is_loading = false;
            true
        });
    }
}
