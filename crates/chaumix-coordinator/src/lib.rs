//! # chaumix-coordinator: Round State Machine
//!
//! Drives one mixing round through its four phases indefinitely:
//!
//! ```text
//! InputRegistration → InputConfirmation → OutputRegistration → Signing ─┐
//!        ↑                                                              │
//!        └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! On every entry into InputRegistration the driver recomputes the round
//! parameters: the denomination (optionally pegged to a fiat target via
//! an exchange-rate lookup, with a static fallback) and the target
//! anonymity set, which hill-climbs on how quickly the previous round
//! filled. Every phase boundary is announced on the phase bus.
//!
//! The driver task exclusively owns all mutable round state. External
//! influence is limited to the early-advance signal, manual phase
//! updates, and reads of the published snapshot.

pub mod config;
pub mod domain;
pub mod ports;
pub mod service;
pub mod state;
pub mod timer;

// Re-exports
pub use config::{ConfigError, CoordinatorConfig};
pub use domain::{Amount, DenominationAlgorithm, Phase, RoundSnapshot};
pub use ports::{ExchangeRate, ExchangeRateProvider, RateError};
pub use service::{RoundError, RoundStateMachine};
pub use state::RoundState;
