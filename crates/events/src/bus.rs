//! Typed pub/sub: the [`EventBus`] trait and the [`Subscription`] handle.
//!
//! This module provides the **event bus pattern**: a pub/sub mechanism for
//! distributing typed events to any number of independent consumers.
//!
//! ## Delivery
//!
//! - **Broadcast**: every live subscription receives its own copy of each message.
//! - **Ordered per publisher**: messages are delivered in publish order.
//! - **No persistence**: a subscription only sees messages published after it was created.
//!
//! ## Lifecycle
//!
//! A [`Subscription`] is an explicit capability. Consumers either drop it or call
//! [`Subscription::unsubscribe`]; after that the bus prunes the subscriber on the next
//! publish and no further messages are delivered.

use std::sync::Arc;

use tokio::sync::mpsc::{UnboundedReceiver, error::TryRecvError};

/// Receiving end of one subscriber.
///
/// ## Example
///
/// ```ignore
/// let mut subscription = bus.subscribe();
/// while let Some(event) = subscription.recv().await {
///     handle(event);
/// }
/// // `None` means the bus was dropped or the subscription was closed.
/// ```
///
/// Subscriptions are designed for single-task consumption.
#[derive(Debug)]
pub struct Subscription<M> {
    receiver: UnboundedReceiver<M>,
}

impl<M> Subscription<M> {
    pub fn new(receiver: UnboundedReceiver<M>) -> Self {
        Self { receiver }
    }

    /// Wait for the next message. Returns `None` once the subscription is closed
    /// and drained, or when the bus has gone away.
    pub async fn recv(&mut self) -> Option<M> {
        self.receiver.recv().await
    }

    /// Try to receive a message without waiting.
    pub fn try_recv(&mut self) -> Result<M, TryRecvError> {
        self.receiver.try_recv()
    }

    /// Stop receiving. Messages already buffered can still be drained with
    /// `recv`/`try_recv`; nothing published afterwards is delivered.
    pub fn unsubscribe(&mut self) {
        self.receiver.close();
    }
}

/// Broadcasts each published message to every open [`Subscription`].
///
/// `publish()` can fail (e.g. internal lock poisoning in the in-memory bus, network
/// errors in a brokered one). Failures are surfaced to the caller, which decides
/// whether the event is best-effort.
///
/// The trait requires `Send + Sync` so a bus can be shared across tasks.
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
