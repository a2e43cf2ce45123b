//! Change notification bus.
//!
//! One bus is created per application and shared by `Arc` with every
//! component that emits or listens. Delivery is multicast, in registration
//! order, without replay: a subscription only sees changes emitted after it
//! was created. Each subscriber owns an unbounded queue, so a slow or dead
//! subscriber never blocks the emitter or the other subscribers.

use std::{
  pin::Pin,
  sync::{Mutex, PoisonError},
  task::{Context, Poll},
};

use futures::Stream;
use labo_core::change::ResourceChange;
use tokio::sync::mpsc;

#[derive(Default)]
pub struct ChangeBus {
  subscribers: Mutex<Vec<mpsc::UnboundedSender<ResourceChange>>>,
}

impl ChangeBus {
  pub fn new() -> Self { Self::default() }

  /// Deliver `change` to every live subscriber and return how many received
  /// it. Subscriptions that were dropped are pruned here.
  pub fn emit(&self, change: ResourceChange) -> usize {
    let mut subscribers =
      self.subscribers.lock().unwrap_or_else(PoisonError::into_inner);
    subscribers.retain(|tx| tx.send(change.clone()).is_ok());
    tracing::debug!(
      kind = %change.kind,
      members = ?change.member_ids,
      delivered = subscribers.len(),
      "resource change emitted"
    );
    subscribers.len()
  }

  pub fn subscribe(&self) -> Subscription {
    let (tx, rx) = mpsc::unbounded_channel();
    self
      .subscribers
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .push(tx);
    Subscription { rx }
  }
}

/// A live feed of changes. Dropping it unsubscribes.
pub struct Subscription {
  rx: mpsc::UnboundedReceiver<ResourceChange>,
}

impl Subscription {
  /// Wait for the next change. `None` once the bus itself is gone.
  pub async fn recv(&mut self) -> Option<ResourceChange> { self.rx.recv().await }

  /// The next already-delivered change, if any.
  pub fn try_recv(&mut self) -> Option<ResourceChange> { self.rx.try_recv().ok() }
}

impl Stream for Subscription {
  type Item = ResourceChange;

  fn poll_next(
    mut self: Pin<&mut Self>,
    cx: &mut Context<'_>,
  ) -> Poll<Option<Self::Item>> {
    self.rx.poll_recv(cx)
  }
}
