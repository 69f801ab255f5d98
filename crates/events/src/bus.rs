//! Publish/subscribe abstraction (mechanics only).
//!
//! Subscribers each receive their own copy of every published message
//! (broadcast semantics). The bus is for distribution, not storage: the
//! publisher's own state stays the source of truth and a message is only a
//! notification that it changed.
//!
//! Unsubscribing is dropping the [`Subscription`]; the bus prunes closed
//! channels on its next publish.

use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvError, RecvTimeoutError, TryRecvError};
use std::time::Duration;

/// A subscription to a message stream.
///
/// ## Usage Pattern
///
/// ```ignore
/// let subscription = repository.subscribe();
///
/// loop {
///     match subscription.recv_timeout(Duration::from_millis(250)) {
///         Ok(snapshot) => render(snapshot),
///         Err(RecvTimeoutError::Timeout) => continue,  // Check for shutdown
///         Err(RecvTimeoutError::Disconnected) => break, // Publisher gone
///     }
/// }
/// ```
///
/// Subscriptions are designed for single-threaded consumption. Messages arrive
/// in the order the bus published them.
#[derive(Debug)]
pub struct Subscription<M> {
    receiver: Receiver<M>,
}

impl<M> Subscription<M> {
    pub fn new(receiver: Receiver<M>) -> Self {
        Self { receiver }
    }

    /// Block until the next message is available.
    pub fn recv(&self) -> Result<M, RecvError> {
        self.receiver.recv()
    }

    /// Try to receive a message without blocking.
    pub fn try_recv(&self) -> Result<M, TryRecvError> {
        self.receiver.try_recv()
    }

    /// Block for up to `timeout` waiting for a message.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<M, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Drain everything queued right now and return only the newest message.
    ///
    /// Snapshot streams only care about the latest state; intermediate
    /// snapshots can be skipped by consumers that fell behind.
    pub fn latest(&self) -> Option<M> {
        let mut last = None;
        while let Ok(msg) = self.receiver.try_recv() {
            last = Some(msg);
        }
        last
    }
}

/// Transport-agnostic pub/sub bus.
///
/// `publish()` can fail (e.g. poisoned lock in the in-memory bus). Failures are
/// surfaced to the caller; they are never retried by the bus itself.
///
/// The trait requires `Send + Sync`: multiple threads may publish concurrently.
pub trait EventBus<M>: Send + Sync {
    type Error: core::fmt::Debug + Send + Sync + 'static;

    fn publish(&self, message: M) -> Result<(), Self::Error>;

    fn subscribe(&self) -> Subscription<M>;
}

impl<M, B> EventBus<M> for Arc<B>
where
    B: EventBus<M> + ?Sized,
{
    type Error = B::Error;

    fn publish(&self, message: M) -> Result<(), Self::Error> {
        (**self).publish(message)
    }

    fn subscribe(&self) -> Subscription<M> {
        (**self).subscribe()
    }
}
