//! Application Context
//!
//! Shared handles every view gets: backend state, reload version and
//! request tokens.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use phrasebank_lib::config::AppConfig;
use phrasebank_lib::AppState;

/// App-wide handles, cheap to clone
#[derive(Clone)]
pub struct AppContext {
    pub state: Arc<AppState>,
    /// Bumped whenever the category tree must be reloaded
    reload_version: Arc<AtomicU64>,
    /// Source of request tokens for list loads
    next_request: Arc<AtomicU64>,
}

impl AppContext {
    pub fn new(state: Arc<AppState>) -> Self {
        Self {
            state,
            reload_version: Arc::new(AtomicU64::new(0)),
            next_request: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.state.config
    }

    /// Trigger a reload of the category tree
    pub fn reload(&self) {
        self.reload_version.fetch_add(1, Ordering::SeqCst);
    }

    pub fn reload_version(&self) -> u64 {
        self.reload_version.load(Ordering::SeqCst)
    }

    /// Monotonically increasing token for one list load
    pub fn issue_request(&self) -> u64 {
        self.next_request.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// Latest request issued by one view; responses carrying an older token are stale
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestGuard {
    latest: u64,
}

impl RequestGuard {
    pub fn begin(&mut self, ctx: &AppContext) -> u64 {
        self.latest = ctx.issue_request();
        self.latest
    }

    pub fn is_current(&self, token: u64) -> bool {
        token == self.latest
    }
}
