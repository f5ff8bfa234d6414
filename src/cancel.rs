//! A minimal cancellation token.
//!
//! The spec's "dual-channel select" container wait (Design Note in §9)
//! is expressed here as a token threaded through every suspension point
//! listed in §5: container create/wait/logs, helper-library download,
//! persistence calls. `cancel()` is idempotent and wakes every waiter;
//! `is_cancelled()` lets a suspension point that's about to start check
//! first rather than begin work doomed to be aborted.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once `cancel()` has been called. Already-cancelled
    /// tokens resolve immediately rather than missing the notification.
    pub async fn cancelled(&self) {
        if self.is_cancelled() {
            return;
        }
        let notified = self.inner.notify.notified();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cancelled_resolves_after_cancel() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());

        let waiter = token.clone();
        let handle = tokio::spawn(async move {
            waiter.cancelled().await;
        });

        token.cancel();
        handle.await.unwrap();
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn already_cancelled_resolves_immediately() {
        let token = CancelToken::new();
        token.cancel();
        token.cancelled().await;
    }
}
