//! # chaumix-bus: Phase-Change Broadcasting
//!
//! Fan-out delivery of round phase-change events to subscribers.
//!
//! The round driver publishes; the API layer and any number of internal
//! observers subscribe. Delivery must never block the driver and a slow
//! or faulty subscriber must never stall a round, so the bus is built on
//! `tokio::sync::broadcast`: lagging subscribers drop events instead of
//! back-pressuring the publisher.

pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::PhaseChangeEvent;
pub use publisher::{PhaseBroadcaster, PhasePublisher};
pub use subscriber::{Subscription, SubscriptionError};

/// Events buffered per subscriber before the oldest are dropped.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;
