//! Zero-capacity, multi-consumer work channel
//!
//! A send only completes once a receiver is parked waiting for an item, so the
//! producer can never run ahead of the consumers. Each waiting receiver registers
//! a one-shot slot with the producer; `send` hands its item to the oldest slot.
//!
//! Dropping (or [`WorkSender::close`]-ing) the sender closes the channel: every
//! parked and future `recv` returns `None`.

use tokio::sync::{mpsc, oneshot};

/// Create a rendezvous channel
pub fn channel<T>() -> (WorkSender<T>, WorkReceiver<T>) {
    let (ready_tx, ready_rx) = mpsc::unbounded_channel();
    (
        WorkSender { ready: ready_rx },
        WorkReceiver { ready: ready_tx },
    )
}

/// The item could not be delivered because every receiver is gone
#[derive(Debug, PartialEq, Eq)]
pub struct SendError<T>(pub T);

impl<T> std::fmt::Display for SendError<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "all receivers have been dropped")
    }
}

impl<T: std::fmt::Debug> std::error::Error for SendError<T> {}

/// Producer half; there is exactly one
pub struct WorkSender<T> {
    ready: mpsc::UnboundedReceiver<oneshot::Sender<T>>,
}

impl<T> WorkSender<T> {
    /// Hand `item` to a waiting receiver, suspending until one is ready
    pub async fn send(&mut self, mut item: T) -> Result<(), SendError<T>> {
        loop {
            let Some(slot) = self.ready.recv().await else {
                return Err(SendError(item));
            };
            match slot.send(item) {
                Ok(()) => return Ok(()),
                // that receiver went away while parked, try the next one
                Err(returned) => item = returned,
            }
        }
    }

    /// Close the channel; parked receivers wake up with `None`
    pub fn close(self) {}
}

/// Consumer half; clone it once per worker
pub struct WorkReceiver<T> {
    ready: mpsc::UnboundedSender<oneshot::Sender<T>>,
}

impl<T> Clone for WorkReceiver<T> {
    fn clone(&self) -> Self {
        Self {
            ready: self.ready.clone(),
        }
    }
}

impl<T> WorkReceiver<T> {
    /// Wait for the next item; `None` once the sender is closed
    pub async fn recv(&self) -> Option<T> {
        let (slot_tx, slot_rx) = oneshot::channel();
        self.ready.send(slot_tx).ok()?;
        slot_rx.await.ok()
    }

    /// True once the sender has been closed
    pub fn is_closed(&self) -> bool {
        self.ready.is_closed()
    }
}
