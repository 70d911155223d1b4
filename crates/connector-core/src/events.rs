//! Connector events and the subscription hub.
//!
//! Every connector owns a [`ConnectorEvents`] hub. The session manager
//! subscribes while the connector is attached and unsubscribes when it is
//! replaced, so events emitted by a detached connector are never observed.
//!
//! # Design Principles
//!
//! - Events are delivered in emission order per subscriber
//! - Emitting never blocks; subscribers drain at their own pace
//! - Dropped subscribers are removed on the next emit

use crate::{ConnectorError, ConnectorUpdate};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};
use tracing::debug;

/// Identifier of one subscription on a hub.
pub type SubscriptionId = u64;

/// A change reported by a connector outside of an explicit call.
#[derive(Debug, Clone)]
pub enum ConnectorEvent {
    /// Partial state change (account switch, chain switch, ...)
    Update(ConnectorUpdate),
    /// The backend hit an error
    Error(ConnectorError),
    /// The backend ended the session on its own
    Deactivate,
}

impl ConnectorEvent {
    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ConnectorEvent::Update(_) => "update",
            ConnectorEvent::Error(_) => "error",
            ConnectorEvent::Deactivate => "deactivate",
        }
    }
}

/// A live subscription to a connector's events.
pub struct EventSubscription {
    id: SubscriptionId,
    receiver: UnboundedReceiver<ConnectorEvent>,
}

impl EventSubscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Wait for the next event. Returns `None` once unsubscribed.
    pub async fn recv(&mut self) -> Option<ConnectorEvent> {
        self.receiver.recv().await
    }

    /// Take an already-delivered event without waiting.
    pub fn try_recv(&mut self) -> Option<ConnectorEvent> {
        match self.receiver.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    pub fn into_parts(self) -> (SubscriptionId, UnboundedReceiver<ConnectorEvent>) {
        (self.id, self.receiver)
    }
}

/// Broadcast hub for one connector's events.
#[derive(Debug, Default)]
pub struct ConnectorEvents {
    subscribers: Mutex<Vec<(SubscriptionId, UnboundedSender<ConnectorEvent>)>>,
    next_id: AtomicU64,
}

impl ConnectorEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber. Events emitted before this call are not seen.
    pub fn subscribe(&self) -> EventSubscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::unbounded_channel();
        self.subscribers.lock().push((id, sender));
        EventSubscription { id, receiver }
    }

    /// Remove a subscriber and close its channel.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.subscribers.lock().retain(|(sub_id, _)| *sub_id != id);
    }

    pub fn emit_update(&self, update: ConnectorUpdate) {
        debug!(?update, "Connector emitted update");
        self.emit(ConnectorEvent::Update(update));
    }

    pub fn emit_error(&self, error: ConnectorError) {
        debug!(%error, "Connector emitted error");
        self.emit(ConnectorEvent::Error(error));
    }

    pub fn emit_deactivate(&self) {
        debug!("Connector emitted deactivate");
        self.emit(ConnectorEvent::Deactivate);
    }

    fn emit(&self, event: ConnectorEvent) {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|(_, sender)| sender.send(event.clone()).is_ok());
    }

    /// Number of registered subscribers. May include dropped ones not yet
    /// cleaned up by an emit.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}
