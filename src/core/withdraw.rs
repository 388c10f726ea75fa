//! # Withdraw signal.
//!
//! Shared on/off switch observed by every stage worker. While it is on, workers
//! discard queued tasks instead of routing them.
//!
//! Built on [`tokio::sync::watch`] so that a worker parked on an empty queue is
//! woken as soon as the mode flips. There is no acknowledgement from workers;
//! the quiescence barrier confirms the drain.

use tokio::sync::watch;

/// Idempotent withdraw switch (no reference counting).
#[derive(Debug)]
pub(crate) struct WithdrawSignal {
    tx: watch::Sender<bool>,
}

impl WithdrawSignal {
    pub(crate) fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    /// Switches withdraw mode on. Returns `true` if it was off before.
    pub(crate) fn enter(&self) -> bool {
        !self.tx.send_replace(true)
    }

    /// Switches withdraw mode off. Returns `true` if it was on before.
    pub(crate) fn exit(&self) -> bool {
        self.tx.send_replace(false)
    }

    pub(crate) fn is_active(&self) -> bool {
        *self.tx.borrow()
    }

    /// Receiver for one worker.
    pub(crate) fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enter_and_exit_are_idempotent() {
        let signal = WithdrawSignal::new();
        assert!(!signal.is_active());

        assert!(signal.enter());
        assert!(!signal.enter());
        assert!(signal.is_active());

        assert!(signal.exit());
        assert!(!signal.exit());
        assert!(!signal.is_active());
    }

    #[tokio::test]
    async fn test_receiver_wakes_on_enter() {
        let signal = WithdrawSignal::new();
        let mut rx = signal.subscribe();
        assert!(!*rx.borrow_and_update());

        signal.enter();
        rx.changed().await.expect("sender alive");
        assert!(*rx.borrow_and_update());
    }
}
