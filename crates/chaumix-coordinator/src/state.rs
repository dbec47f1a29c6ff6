//! Published round state.
//!
//! The round driver is the only writer; everyone else reads through
//! [`RoundState::snapshot`] or the individual getters.

use crate::config::CoordinatorConfig;
use crate::domain::{Amount, Phase, RoundSnapshot};
use parking_lot::RwLock;
use std::time::Duration;

/// Encapsulates the mutable state of one perpetual mixing round.
pub struct RoundState {
    phase: RwLock<Phase>,
    denomination: RwLock<Amount>,
    anonymity_set: RwLock<u32>,
    time_spent_in_input_registration: RwLock<Duration>,
}

impl RoundState {
    /// Initial state per the configuration.
    ///
    /// The time-spent value is preseeded to one second *above* the
    /// average target, so the first real round's adaptive calculation
    /// holds the anonymity set steady instead of spuriously growing it.
    pub fn new(config: &CoordinatorConfig) -> Self {
        Self {
            phase: RwLock::new(Phase::InputRegistration),
            denomination: RwLock::new(Amount::ZERO),
            anonymity_set: RwLock::new(config.minimum_anonymity_set),
            time_spent_in_input_registration: RwLock::new(
                config.average_input_registration() + Duration::from_secs(1),
            ),
        }
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        *self.phase.read()
    }

    pub(crate) fn set_phase(&self, phase: Phase) {
        *self.phase.write() = phase;
    }

    /// Current round denomination.
    pub fn denomination(&self) -> Amount {
        *self.denomination.read()
    }

    pub(crate) fn set_denomination(&self, denomination: Amount) {
        *self.denomination.write() = denomination;
    }

    /// Current target anonymity set.
    pub fn anonymity_set(&self) -> u32 {
        *self.anonymity_set.read()
    }

    pub(crate) fn set_anonymity_set(&self, anonymity_set: u32) {
        *self.anonymity_set.write() = anonymity_set;
    }

    /// Observed duration of the previous InputRegistration phase.
    pub fn time_spent_in_input_registration(&self) -> Duration {
        *self.time_spent_in_input_registration.read()
    }

    pub(crate) fn set_time_spent_in_input_registration(&self, elapsed: Duration) {
        *self.time_spent_in_input_registration.write() = elapsed;
    }

    /// Read-only view for the API layer.
    pub fn snapshot(&self) -> RoundSnapshot {
        RoundSnapshot {
            phase: self.phase(),
            denomination: self.denomination(),
            anonymity_set: self.anonymity_set(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_holds_first_round_steady() {
        let config = CoordinatorConfig::default();
        let state = RoundState::new(&config);

        assert_eq!(state.phase(), Phase::InputRegistration);
        assert_eq!(state.anonymity_set(), config.minimum_anonymity_set);
        assert!(state.time_spent_in_input_registration() > config.average_input_registration());
    }

    #[test]
    fn test_snapshot_reflects_state() {
        let state = RoundState::new(&CoordinatorConfig::default());
        state.set_phase(Phase::Signing);
        state.set_denomination(Amount::from_sat(42));
        state.set_anonymity_set(7);

        let snapshot = state.snapshot();
        assert_eq!(snapshot.phase, Phase::Signing);
        assert_eq!(snapshot.denomination, Amount::from_sat(42));
        assert_eq!(snapshot.anonymity_set, 7);
    }
}
