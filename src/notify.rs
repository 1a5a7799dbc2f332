use dashmap::DashMap;
use tokio::sync::broadcast;
use ulid::Ulid;

use crate::model::AuditKind;

const CHANNEL_CAPACITY: usize = 256;

/// Summary of one committed mutation, broadcast per therapist so embedding
/// UIs can refresh without polling. Dropping a receiver discards events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreEvent {
    pub store_version: u64,
    pub appointment_id: Ulid,
    pub therapist_id: Ulid,
    pub kind: AuditKind,
}

/// Broadcast hub keyed by therapist id.
pub struct NotifyHub {
    channels: DashMap<Ulid, broadcast::Sender<StoreEvent>>,
}

impl Default for NotifyHub {
    fn default() -> Self {
        Self::new()
    }
}

impl NotifyHub {
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
        }
    }

    /// Subscribe to commits touching one therapist. Creates the channel if needed.
    pub fn subscribe(&self, therapist_id: Ulid) -> broadcast::Receiver<StoreEvent> {
        let sender = self
            .channels
            .entry(therapist_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);
        sender.subscribe()
    }

    /// Send a notification. No-op if nobody is listening.
    pub fn send(&self, event: StoreEvent) {
        if let Some(sender) = self.channels.get(&event.therapist_id) {
            let _ = sender.send(event);
        }
    }
}
