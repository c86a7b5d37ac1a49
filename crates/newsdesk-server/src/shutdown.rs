//! Process-wide shutdown signal shared between the HTTP layer and `main`.

use std::sync::Arc;

use tokio::sync::watch;

/// Cloneable handle to a one-way shutdown flag.
///
/// Once triggered the flag stays set; every waiter, including ones that
/// subscribe afterwards, observes it.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Requests shutdown. Calling this more than once has no further effect.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    #[must_use]
    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Completes once [`ShutdownHandle::trigger`] has been called.
    pub async fn requested(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|requested| *requested).await;
    }
}

impl Default for ShutdownHandle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn new_handle_is_not_triggered() {
        assert!(!ShutdownHandle::new().is_triggered());
    }

    #[tokio::test]
    async fn requested_completes_after_trigger_from_clone() {
        let handle = ShutdownHandle::new();
        let waiter = handle.clone();
        let task = tokio::spawn(async move { waiter.requested().await });

        handle.trigger();

        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("waiter should wake")
            .expect("task should not panic");
        assert!(handle.is_triggered());
    }

    #[tokio::test]
    async fn requested_completes_immediately_when_already_triggered() {
        let handle = ShutdownHandle::new();
        handle.trigger();
        handle.trigger();

        tokio::time::timeout(Duration::from_secs(1), handle.requested())
            .await
            .expect("already-triggered handle should not block");
    }
}
