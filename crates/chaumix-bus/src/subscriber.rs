//! The subscribing side of the bus.

use crate::events::PhaseChangeEvent;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::debug;

/// Errors from subscription operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The broadcaster was dropped.
    #[error("phase bus closed")]
    Closed,
}

/// A handle receiving phase-change events.
pub struct Subscription {
    receiver: broadcast::Receiver<PhaseChangeEvent>,
}

impl Subscription {
    pub(crate) fn new(receiver: broadcast::Receiver<PhaseChangeEvent>) -> Self {
        Self { receiver }
    }

    /// Receive the next event.
    ///
    /// Returns `None` when the broadcaster is gone. A lagged subscriber
    /// skips the dropped events and keeps receiving.
    pub async fn recv(&mut self) -> Option<PhaseChangeEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    debug!(lagged = count, "subscriber lagged, events dropped");
                    continue;
                }
            }
        }
    }

    /// Receive without blocking.
    pub fn try_recv(&mut self) -> Result<Option<PhaseChangeEvent>, SubscriptionError> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Ok(Some(event)),
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Err(SubscriptionError::Closed)
                }
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publisher::{PhaseBroadcaster, PhasePublisher};

    #[tokio::test]
    async fn test_recv_none_after_bus_drop() {
        let bus = PhaseBroadcaster::new();
        let mut sub = bus.subscribe();
        drop(bus);
        assert!(sub.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_try_recv_empty_then_event() {
        let bus = PhaseBroadcaster::new();
        let mut sub = bus.subscribe();
        assert_eq!(sub.try_recv(), Ok(None));

        bus.publish(PhaseChangeEvent::entered("Signing")).await;
        assert_eq!(
            sub.try_recv().unwrap().map(|e| e.new_phase),
            Some("Signing".to_string())
        );
    }
}
