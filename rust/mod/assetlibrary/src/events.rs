//! Change-event publication.
//!
//! Emitters are fire-and-forget: the service reports a failed publish in the
//! log and carries on.

use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::model::ChangeEvent;
use crate::service::AssetLibraryError;

/// Sink for change events.
pub trait EventEmitter: Send + Sync {
    /// Publish one event to `topic`. Must not block.
    fn publish(&self, topic: &str, event: &ChangeEvent) -> Result<(), AssetLibraryError>;
}

/// Writes every event to the log as a structured record.
pub struct LogEmitter;

impl EventEmitter for LogEmitter {
    fn publish(&self, topic: &str, event: &ChangeEvent) -> Result<(), AssetLibraryError> {
        let message = serde_json::to_string(event)
            .map_err(|e| AssetLibraryError::Internal(e.to_string()))?;
        info!(target: "assetlibrary::events", topic, %message, "event published");
        Ok(())
    }
}

/// An event together with the topic it was published to.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedEvent {
    pub topic: String,
    pub event: ChangeEvent,
}

/// In-process fan-out to any number of subscribers.
///
/// Slow subscribers lag and lose the oldest events; the publisher never waits.
pub struct ChannelEmitter {
    tx: broadcast::Sender<PublishedEvent>,
}

impl ChannelEmitter {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PublishedEvent> {
        self.tx.subscribe()
    }
}

impl EventEmitter for ChannelEmitter {
    fn publish(&self, topic: &str, event: &ChangeEvent) -> Result<(), AssetLibraryError> {
        let published = PublishedEvent {
            topic: topic.to_string(),
            event: event.clone(),
        };
        // A send error only means nobody is subscribed.
        match self.tx.send(published) {
            Ok(receivers) => debug!(topic, receivers, "event fanned out"),
            Err(_) => debug!(topic, "event dropped, no subscribers"),
        }
        Ok(())
    }
}
