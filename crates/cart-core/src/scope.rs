//! # View Scopes
//!
//! Ties in-flight backend requests to the lifetime of the view that issued
//! them. Dropping (or cancelling) the [`ViewGuard`] cancels every request
//! run through its [`ViewScope`].

use crate::error::{CartError, CartResult};
use std::future::Future;
use tokio::sync::watch;

/// Owned by the consuming view; cancels its scope when dropped
#[derive(Debug)]
pub struct ViewGuard {
    tx: watch::Sender<bool>,
}

impl ViewGuard {
    /// Cancel explicitly (same effect as dropping the guard)
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

/// Cloneable cancellation handle passed to store, submitter and verifier
#[derive(Debug, Clone)]
pub struct ViewScope {
    rx: Option<watch::Receiver<bool>>,
}

impl ViewScope {
    /// Create a scope and the guard that controls it
    pub fn new() -> (ViewGuard, ViewScope) {
        let (tx, rx) = watch::channel(false);
        (ViewGuard { tx }, ViewScope { rx: Some(rx) })
    }

    /// A scope that is never cancelled
    pub fn detached() -> ViewScope {
        ViewScope { rx: None }
    }

    pub fn is_cancelled(&self) -> bool {
        match &self.rx {
            None => false,
            Some(rx) => *rx.borrow() || rx.has_changed().is_err(),
        }
    }

    /// Resolves once the guard is cancelled or dropped
    pub async fn cancelled(&self) {
        let Some(rx) = &self.rx else {
            return std::future::pending().await;
        };
        let mut rx = rx.clone();
        // Err means the guard was dropped, which also cancels.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }

    /// Run a request unless the scope is cancelled first
    pub async fn run<F, T>(&self, request: F) -> CartResult<T>
    where
        F: Future<Output = CartResult<T>>,
    {
        if self.is_cancelled() {
            return Err(CartError::Cancelled);
        }
        tokio::select! {
            biased;
            () = self.cancelled() => Err(CartError::Cancelled),
            result = request => result,
        }
    }
}

impl Default for ViewScope {
    fn default() -> Self {
        Self::detached()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_detached_scope_runs_request() {
        let scope = ViewScope::detached();
        let result = scope.run(async { Ok::<_, CartError>(7) }).await;
        assert_eq!(result.unwrap(), 7);
        assert!(!scope.is_cancelled());
    }

    #[tokio::test]
    async fn test_dropped_guard_cancels() {
        let (guard, scope) = ViewScope::new();
        drop(guard);

        assert!(scope.is_cancelled());
        let result = scope.run(async { Ok::<_, CartError>(()) }).await;
        assert!(matches!(result, Err(CartError::Cancelled)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts_pending_request() {
        let (guard, scope) = ViewScope::new();

        let task = tokio::spawn(async move {
            scope
                .run(async {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok::<_, CartError>(())
                })
                .await
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        guard.cancel();

        let result = task.await.unwrap();
        assert!(matches!(result, Err(CartError::Cancelled)));
    }
}
