//! Change notifications for tiles and zones.
//!
//! Tiles and zones own a [`Subscribers`] list. Interested parties (a renderer,
//! a property pane) call `subscribe()` and get a `crossbeam_channel`
//! [`Receiver`]; every change is pushed as a cloned event to each live
//! receiver. Dropping the receiver unsubscribes. Retiring the owner drops its
//! senders, so receivers observe a disconnect.
//!
//! Delivery is synchronous with the mutation and never blocks (channels are
//! unbounded). A subscriber must not feed a change back into the same
//! property from its handling code while the mutation is in progress.
//!
//! Submodules:
//! - [`tile`] – [`TileEvent`](tile::TileEvent) raised by a single tile
//! - [`zone`] – [`ZoneEvent`](zone::ZoneEvent) raised by a zone's layers

pub mod tile;
pub mod zone;

use std::fmt;

use crossbeam_channel::{Receiver, Sender, unbounded};

/// Fan-out list of event subscribers.
///
/// Cloning yields an empty list: subscriptions are never copied along with
/// the data they observe.
pub struct Subscribers<E> {
    senders: Vec<Sender<E>>,
}

impl<E: Clone> Subscribers<E> {
    pub fn new() -> Self {
        Self {
            senders: Vec::new(),
        }
    }

    /// Register a new subscriber and return its receiving end.
    pub fn subscribe(&mut self) -> Receiver<E> {
        let (tx, rx) = unbounded();
        self.senders.push(tx);
        rx
    }

    /// Deliver `event` to every live subscriber, pruning disconnected ones.
    pub fn notify(&mut self, event: &E) {
        self.senders.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Detach all subscribers.
    pub fn clear(&mut self) {
        self.senders.clear();
    }

    pub fn len(&self) -> usize {
        self.senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }
}

impl<E: Clone> Default for Subscribers<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Clone> Clone for Subscribers<E> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for Subscribers<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscribers")
            .field("count", &self.senders.len())
            .finish()
    }
}
