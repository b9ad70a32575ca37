//! Cooperative cancellation
//!
//! A [`CancellationToken`] is passed down every fetch call chain. Clients check
//! it before issuing a request and again before decoding; the polling driver
//! races in-flight work against [`CancellationToken::cancelled`]. Cancelling a
//! token cancels every child created from it, never its parent.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::watch;

struct Inner {
    state: watch::Sender<bool>,
    children: Mutex<Vec<Weak<Inner>>>,
}

impl Inner {
    fn new() -> Self {
        let (state, _) = watch::channel(false);
        Self {
            state,
            children: Mutex::new(Vec::new()),
        }
    }

    fn cancel_tree(&self) {
        self.state.send_replace(true);
        let children = std::mem::take(&mut *self.children.lock());
        for child in children.iter().filter_map(Weak::upgrade) {
            child.cancel_tree();
        }
    }
}

/// Shared cancellation flag with parent/child propagation
#[derive(Clone)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner::new()),
        }
    }

    /// Create a token cancelled together with this one
    #[must_use]
    pub fn child_token(&self) -> Self {
        let child = Self::new();
        let mut children = self.inner.children.lock();
        if self.is_cancelled() {
            drop(children);
            child.cancel();
        } else {
            children.retain(|c| c.strong_count() > 0);
            children.push(Arc::downgrade(&child.inner));
        }
        child
    }

    /// Cancel this token and all its children
    pub fn cancel(&self) {
        self.inner.cancel_tree();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.inner.state.borrow()
    }

    /// Resolve once the token is cancelled
    pub async fn cancelled(&self) {
        let mut rx = self.inner.state.subscribe();
        // The sender lives as long as `self`, so this only ends on cancellation.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
