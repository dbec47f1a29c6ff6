//! Round driver.
//!
//! One long-lived task owns the round: it computes round parameters on
//! entry into InputRegistration, waits out each phase (cancellably), and
//! announces every boundary on the phase bus. A fault inside a phase
//! body is logged and swallowed; the loop continues from the same phase,
//! so a single bad round can never take the coordinator down.

use crate::config::CoordinatorConfig;
use crate::domain::{Amount, DenominationAlgorithm, Phase};
use crate::ports::{ExchangeRateProvider, RateError};
use crate::state::RoundState;
use crate::timer::PhaseGate;
use chaumix_bus::{PhaseChangeEvent, PhasePublisher};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Faults a phase body can raise.
///
/// These are logged and swallowed by the driver loop, never fatal.
#[derive(Debug, Error)]
pub enum RoundError {
    /// Configured denomination does not convert to a valid amount
    #[error("invalid denomination: {0} BTC")]
    InvalidDenomination(f64),

    /// Exchange-rate failure that escaped the local fallback
    #[error(transparent)]
    Rate(#[from] RateError),
}

/// Drives the mixing round through its phase cycle indefinitely.
pub struct RoundStateMachine<P: PhasePublisher> {
    state: Arc<RoundState>,
    config: CoordinatorConfig,
    rates: Arc<dyn ExchangeRateProvider>,
    bus: Arc<P>,
    gate: PhaseGate,
}

impl<P: PhasePublisher> RoundStateMachine<P> {
    /// New driver in the initial round state.
    pub fn new(
        config: CoordinatorConfig,
        rates: Arc<dyn ExchangeRateProvider>,
        bus: Arc<P>,
    ) -> Self {
        Self {
            state: Arc::new(RoundState::new(&config)),
            config,
            rates,
            bus,
            gate: PhaseGate::new(),
        }
    }

    /// The published round state, for the API layer.
    pub fn state(&self) -> Arc<RoundState> {
        Arc::clone(&self.state)
    }

    /// Switch to `phase`: no-op when already there, otherwise store the
    /// phase, wake any in-progress wait, and broadcast the transition.
    pub async fn update_phase(&self, phase: Phase) {
        if phase == self.state.phase() {
            return;
        }

        self.state.set_phase(phase);
        self.gate.interrupt();
        let delivered = self
            .bus
            .publish(PhaseChangeEvent::entered(phase.as_str()))
            .await;
        info!(%phase, subscribers = delivered, "entered new phase");
    }

    /// Move to the deterministic successor of the current phase.
    pub async fn advance_phase(&self) {
        self.update_phase(self.state.phase().next()).await;
    }

    /// Cut the current phase's wait short; the driver then advances as
    /// if the timeout had fired.
    pub fn advance_early(&self) {
        self.gate.interrupt();
    }

    /// Run the driver until `shutdown` signals.
    ///
    /// Phase-body faults are logged and the loop continues from the
    /// current phase on the next iteration.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(phase = %self.state.phase(), "round driver started");
        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    info!("round driver stopping");
                    return;
                }
                result = self.execute_phase() => {
                    if let Err(error) = result {
                        warn!(%error, phase = %self.state.phase(), "ignoring round fault");
                    }
                }
            }
        }
    }

    /// One phase body: recompute parameters when entering
    /// InputRegistration, then wait out the phase and advance.
    async fn execute_phase(&self) -> Result<(), RoundError> {
        let entered = self.state.phase();

        if entered == Phase::InputRegistration {
            self.select_denomination().await?;
            self.adapt_anonymity_set();
        }

        let outcome = self.gate.wait(self.config.phase_timeout(entered)).await;

        if entered == Phase::InputRegistration {
            self.state.set_time_spent_in_input_registration(outcome.elapsed);
        }

        // A manual update_phase() already moved the round on; advancing
        // again here would skip a phase.
        if self.state.phase() == entered {
            self.advance_phase().await;
        }
        Ok(())
    }

    /// Choose this round's denomination.
    ///
    /// The fiat peg falls back to the static BTC denomination on any
    /// lookup failure; the failure is never surfaced.
    async fn select_denomination(&self) -> Result<(), RoundError> {
        let denomination = match self.config.denomination_algorithm {
            DenominationAlgorithm::FixedBtc => self.static_denomination()?,
            DenominationAlgorithm::FixedFiat => match self.fiat_denomination().await {
                Ok(amount) => amount,
                Err(error) => {
                    debug!(%error, "exchange-rate lookup failed, using static denomination");
                    self.static_denomination()?
                }
            },
        };
        self.state.set_denomination(denomination);
        Ok(())
    }

    fn static_denomination(&self) -> Result<Amount, RoundError> {
        Amount::from_btc(self.config.denomination_btc)
            .ok_or(RoundError::InvalidDenomination(self.config.denomination_btc))
    }

    /// BTC equivalent of the configured fiat target at the current rate.
    async fn fiat_denomination(&self) -> Result<Amount, RoundError> {
        let code = &self.config.fiat_currency_code;
        let rates = self.rates.exchange_rates().await?;
        let rate = rates
            .into_iter()
            .find(|entry| &entry.code == code)
            .ok_or_else(|| RateError::MissingCurrency(code.clone()))?;
        if !(rate.rate.is_finite() && rate.rate > 0.0) {
            return Err(RateError::UnusableRate {
                code: code.clone(),
                rate: rate.rate,
            }
            .into());
        }
        let btc = self.config.denomination_fiat / rate.rate;
        Amount::from_btc(btc).ok_or(RoundError::InvalidDenomination(btc))
    }

    /// Hill-climb the target anonymity set on the previous round's
    /// InputRegistration duration: shrink when the round dragged past
    /// the average target, grow when it filled fast.
    fn adapt_anonymity_set(&self) {
        let min = self.config.minimum_anonymity_set;
        let max = self.config.maximum_anonymity_set;
        let current = self.state.anonymity_set();

        let adapted = if self.state.time_spent_in_input_registration()
            > self.config.average_input_registration()
        {
            current.saturating_sub(1).max(min)
        } else {
            current.saturating_add(1).min(max)
        };

        if adapted != current {
            debug!(from = current, to = adapted, "anonymity set adapted");
        }
        self.state.set_anonymity_set(adapted);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{ExchangeRate, StaticRateProvider};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Counts broadcasts instead of delivering them.
    struct MockBus {
        published: AtomicUsize,
        phases: parking_lot::Mutex<Vec<String>>,
    }

    impl MockBus {
        fn new() -> Self {
            Self {
                published: AtomicUsize::new(0),
                phases: parking_lot::Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PhasePublisher for MockBus {
        async fn publish(&self, event: PhaseChangeEvent) -> usize {
            self.published.fetch_add(1, Ordering::SeqCst);
            self.phases.lock().push(event.new_phase);
            0
        }
    }

    struct FailingRateProvider;

    #[async_trait]
    impl ExchangeRateProvider for FailingRateProvider {
        async fn exchange_rates(&self) -> Result<Vec<ExchangeRate>, RateError> {
            Err(RateError::Transport("connection refused".into()))
        }
    }

    fn usd(rate: f64) -> Arc<StaticRateProvider> {
        Arc::new(StaticRateProvider::new(vec![ExchangeRate {
            code: "USD".into(),
            rate,
        }]))
    }

    fn machine_with(
        config: CoordinatorConfig,
        rates: Arc<dyn ExchangeRateProvider>,
    ) -> RoundStateMachine<MockBus> {
        RoundStateMachine::new(config, rates, Arc::new(MockBus::new()))
    }

    #[tokio::test]
    async fn test_phase_cycle_broadcasts_each_transition() {
        let machine = machine_with(CoordinatorConfig::default(), usd(50_000.0));
        let state = machine.state();

        let mut visited = Vec::new();
        for _ in 0..4 {
            machine.advance_phase().await;
            visited.push(state.phase());
        }

        assert_eq!(
            visited,
            vec![
                Phase::InputConfirmation,
                Phase::OutputRegistration,
                Phase::Signing,
                Phase::InputRegistration,
            ]
        );
        assert_eq!(machine.bus.published.load(Ordering::SeqCst), 4);
        assert_eq!(
            *machine.bus.phases.lock(),
            vec![
                "InputConfirmation",
                "OutputRegistration",
                "Signing",
                "InputRegistration",
            ]
        );
    }

    #[tokio::test]
    async fn test_update_to_current_phase_is_silent() {
        let machine = machine_with(CoordinatorConfig::default(), usd(50_000.0));
        machine.update_phase(Phase::InputRegistration).await;
        assert_eq!(machine.bus.published.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_slow_round_shrinks_anonymity_set_to_floor() {
        let config = CoordinatorConfig {
            minimum_anonymity_set: 3,
            maximum_anonymity_set: 10,
            ..Default::default()
        };
        let machine = machine_with(config.clone(), usd(50_000.0));
        let state = machine.state();

        // Previous round dragged past the average target.
        state.set_time_spent_in_input_registration(
            config.average_input_registration() + Duration::from_secs(1),
        );
        machine.adapt_anonymity_set();
        assert_eq!(state.anonymity_set(), 3, "floored at the minimum");

        state.set_anonymity_set(5);
        machine.adapt_anonymity_set();
        assert_eq!(state.anonymity_set(), 4);
    }

    #[tokio::test]
    async fn test_fast_round_grows_anonymity_set_to_cap() {
        let config = CoordinatorConfig {
            minimum_anonymity_set: 3,
            maximum_anonymity_set: 5,
            ..Default::default()
        };
        let machine = machine_with(config.clone(), usd(50_000.0));
        let state = machine.state();

        state.set_time_spent_in_input_registration(
            config.average_input_registration() - Duration::from_secs(1),
        );
        machine.adapt_anonymity_set();
        assert_eq!(state.anonymity_set(), 4);

        state.set_anonymity_set(5);
        machine.adapt_anonymity_set();
        assert_eq!(state.anonymity_set(), 5, "capped at the maximum");
    }

    #[tokio::test]
    async fn test_fiat_denomination_from_rate() {
        let config = CoordinatorConfig {
            denomination_algorithm: DenominationAlgorithm::FixedFiat,
            denomination_fiat: 100.0,
            fiat_currency_code: "USD".into(),
            ..Default::default()
        };
        let machine = machine_with(config, usd(50_000.0));

        machine.select_denomination().await.unwrap();
        // 100 USD at 50_000 USD/BTC = 0.002 BTC
        assert_eq!(
            machine.state().denomination(),
            Amount::from_btc(0.002).unwrap()
        );
    }

    #[tokio::test]
    async fn test_rate_failure_falls_back_to_static_denomination() {
        let config = CoordinatorConfig {
            denomination_algorithm: DenominationAlgorithm::FixedFiat,
            denomination_btc: 0.1,
            ..Default::default()
        };
        let machine = machine_with(config, Arc::new(FailingRateProvider));

        machine.select_denomination().await.unwrap();
        assert_eq!(
            machine.state().denomination(),
            Amount::from_btc(0.1).unwrap()
        );
    }

    #[tokio::test]
    async fn test_missing_currency_falls_back() {
        let config = CoordinatorConfig {
            denomination_algorithm: DenominationAlgorithm::FixedFiat,
            fiat_currency_code: "EUR".into(),
            denomination_btc: 0.25,
            ..Default::default()
        };
        let machine = machine_with(config, usd(50_000.0));

        machine.select_denomination().await.unwrap();
        assert_eq!(
            machine.state().denomination(),
            Amount::from_btc(0.25).unwrap()
        );
    }

    #[tokio::test]
    async fn test_fixed_btc_skips_lookup() {
        let config = CoordinatorConfig {
            denomination_algorithm: DenominationAlgorithm::FixedBtc,
            denomination_btc: 0.5,
            ..Default::default()
        };
        // A failing provider proves the lookup is never consulted.
        let machine = machine_with(config, Arc::new(FailingRateProvider));

        machine.select_denomination().await.unwrap();
        assert_eq!(
            machine.state().denomination(),
            Amount::from_btc(0.5).unwrap()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_driver_cycles_through_timeouts() {
        let config = CoordinatorConfig {
            input_registration_timeout_secs: 1,
            input_confirmation_timeout_secs: 1,
            output_registration_timeout_secs: 1,
            signing_timeout_secs: 1,
            denomination_algorithm: DenominationAlgorithm::FixedBtc,
            ..Default::default()
        };
        let machine = Arc::new(machine_with(config, usd(50_000.0)));
        let state = machine.state();

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let driver = {
            let machine = Arc::clone(&machine);
            tokio::spawn(async move { machine.run(shutdown_rx).await })
        };

        // Paused clock auto-advances through the four 1s phase waits.
        let deadline = tokio::time::Instant::now() + Duration::from_secs(60);
        while machine.bus.published.load(Ordering::SeqCst) < 4 {
            assert!(tokio::time::Instant::now() < deadline, "driver stalled");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert!(state.time_spent_in_input_registration() <= Duration::from_secs(2));

        shutdown_tx.send(true).unwrap();
        driver.await.unwrap();
    }

    #[tokio::test]
    async fn test_external_update_skips_duplicate_advance() {
        let machine = machine_with(CoordinatorConfig::default(), usd(50_000.0));
        let state = machine.state();

        // Simulate the API forcing a transition mid-wait.
        machine.update_phase(Phase::OutputRegistration).await;
        assert_eq!(state.phase(), Phase::OutputRegistration);

        // The wait the driver would have been blocked in reports an
        // interrupt; execute_phase must not advance again.
        assert_eq!(machine.bus.published.load(Ordering::SeqCst), 1);
    }
}
