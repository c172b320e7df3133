use dashmap::DashMap;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};

/// Key used when a request does not name one.
pub const GLOBAL_KEY: &str = "global";

#[derive(Debug, Clone, Copy, Default)]
struct KeyState {
    /// Requests under this key that have begun but not ended
    active: usize,
    /// When the indicator for this key last became visible
    shown_at: Option<Instant>,
    /// Earliest instant the indicator may hide once `active` reaches zero
    hold_until: Option<Instant>,
}

/// Thread-safe loading-indicator counters, one per logical request key.
///
/// Overlapping requests under the same key share one indicator: it turns on
/// with the first `begin` and stays on until every holder has ended and the
/// minimum visible duration (measured from when it turned on) has passed.
#[derive(Clone, Debug, Default)]
pub struct LoadingTracker {
    inner: Arc<DashMap<String, KeyState>>,
}

impl LoadingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new in-flight request under `key`.
    pub fn begin(&self, key: &str) {
        self.begin_at(key, Instant::now());
    }

    /// Release one holder of `key`. Extra calls are ignored rather than
    /// driving the counter below zero.
    pub fn end(&self, key: &str, min_duration: Duration) {
        self.end_at(key, min_duration, Instant::now());
    }

    /// Begin a request and return a guard that ends it when dropped.
    pub fn hold(&self, key: impl Into<String>, min_duration: Duration) -> LoadingGuard {
        let key = key.into();
        self.begin(&key);
        LoadingGuard {
            tracker: self.clone(),
            key,
            min_duration,
        }
    }

    /// Whether the indicator for `key` is visible right now.
    pub fn is_loading(&self, key: &str) -> bool {
        self.is_loading_at(key, Instant::now())
    }

    /// Number of in-flight requests under `key`.
    pub fn active(&self, key: &str) -> usize {
        self.inner.get(key).map(|s| s.active).unwrap_or(0)
    }

    /// Forget every key (logout / teardown).
    pub fn reset(&self) {
        self.inner.clear();
    }

    pub(crate) fn begin_at(&self, key: &str, now: Instant) {
        let was_visible = self.is_loading_at(key, now);
        let mut state = self.inner.entry(key.to_owned()).or_default();
        if state.active == 0 && !was_visible {
            state.shown_at = Some(now);
            state.hold_until = None;
        }
        state.active += 1;
    }

    pub(crate) fn end_at(&self, key: &str, min_duration: Duration, now: Instant) {
        let Some(mut state) = self.inner.get_mut(key) else {
            tracing::debug!("loading end for unknown key '{}'", key);
            return;
        };
        if state.active == 0 {
            tracing::debug!("unbalanced loading end for key '{}'", key);
            return;
        }
        state.active -= 1;
        if state.active == 0 {
            let shown_at = state.shown_at.unwrap_or(now);
            let hold = shown_at + min_duration;
            state.hold_until = Some(hold.max(state.hold_until.unwrap_or(hold)));
        }
    }

    pub(crate) fn is_loading_at(&self, key: &str, now: Instant) -> bool {
        match self.inner.get(key) {
            Some(state) => {
                state.active > 0 || state.hold_until.map(|until| now < until).unwrap_or(false)
            }
            None => false,
        }
    }
}

/// Ends its request on drop, so success, failure and cancellation all
/// release the counter.
#[derive(Debug)]
pub struct LoadingGuard {
    tracker: LoadingTracker,
    key: String,
    min_duration: Duration,
}

impl LoadingGuard {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.tracker.end(&self.key, self.min_duration);
    }
}
