//! The publishing side of the bus.

use crate::events::PhaseChangeEvent;
use crate::subscriber::Subscription;
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::debug;

/// Trait the round driver publishes through.
///
/// A seam for testing: the driver is generic over this, so tests count
/// broadcasts with a mock instead of a live channel.
#[async_trait]
pub trait PhasePublisher: Send + Sync {
    /// Publish an event to all current subscribers.
    ///
    /// Returns the number of subscribers the event was handed to.
    /// Must never block on subscriber progress.
    async fn publish(&self, event: PhaseChangeEvent) -> usize;
}

/// In-memory fan-out broadcaster over `tokio::sync::broadcast`.
pub struct PhaseBroadcaster {
    sender: broadcast::Sender<PhaseChangeEvent>,
    events_published: AtomicU64,
}

impl PhaseBroadcaster {
    /// Broadcaster with the default per-subscriber buffer.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Broadcaster with an explicit per-subscriber buffer.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            events_published: AtomicU64::new(0),
        }
    }

    /// Open a subscription receiving every event published from now on.
    pub fn subscribe(&self) -> Subscription {
        debug!("new phase subscription");
        Subscription::new(self.sender.subscribe())
    }

    /// Number of currently attached subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Total events published over the broadcaster's lifetime.
    pub fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }
}

impl Default for PhaseBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PhasePublisher for PhaseBroadcaster {
    async fn publish(&self, event: PhaseChangeEvent) -> usize {
        self.events_published.fetch_add(1, Ordering::Relaxed);

        // send() only fails when no receiver exists; a phase change with
        // nobody listening is not an error.
        match self.sender.send(event) {
            Ok(receivers) => {
                debug!(receivers, "phase change broadcast");
                receivers
            }
            Err(_) => {
                debug!("phase change broadcast with no subscribers");
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_without_subscribers() {
        let bus = PhaseBroadcaster::new();
        assert_eq!(bus.publish(PhaseChangeEvent::entered("Signing")).await, 0);
        assert_eq!(bus.events_published(), 1);
    }

    #[tokio::test]
    async fn test_fan_out_to_all_subscribers() {
        let bus = PhaseBroadcaster::new();
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        let delivered = bus
            .publish(PhaseChangeEvent::entered("OutputRegistration"))
            .await;
        assert_eq!(delivered, 2);

        assert_eq!(a.recv().await.unwrap().new_phase, "OutputRegistration");
        assert_eq!(b.recv().await.unwrap().new_phase, "OutputRegistration");
    }

    #[tokio::test]
    async fn test_lagging_subscriber_drops_oldest() {
        let bus = PhaseBroadcaster::with_capacity(1);
        let mut sub = bus.subscribe();

        bus.publish(PhaseChangeEvent::entered("InputRegistration"))
            .await;
        bus.publish(PhaseChangeEvent::entered("InputConfirmation"))
            .await;

        // Buffer held one event; the older one was dropped, recv skips the gap.
        assert_eq!(sub.recv().await.unwrap().new_phase, "InputConfirmation");
    }
}
