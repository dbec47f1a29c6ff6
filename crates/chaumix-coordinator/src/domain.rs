//! Round domain types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The four phases of a mixing round, cycled indefinitely.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Peers register blinded outputs alongside their inputs.
    InputRegistration,
    /// Peers confirm their registered inputs are still available.
    InputConfirmation,
    /// Peers reveal unblinded, signed outputs over fresh connections.
    OutputRegistration,
    /// Peers sign the final CoinJoin transaction.
    Signing,
}

impl Phase {
    /// Deterministic successor in the round cycle.
    ///
    /// The match is total: there is no unreachable phase value.
    pub fn next(self) -> Self {
        match self {
            Phase::InputRegistration => Phase::InputConfirmation,
            Phase::InputConfirmation => Phase::OutputRegistration,
            Phase::OutputRegistration => Phase::Signing,
            Phase::Signing => Phase::InputRegistration,
        }
    }

    /// Stable name used in events and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::InputRegistration => "InputRegistration",
            Phase::InputConfirmation => "InputConfirmation",
            Phase::OutputRegistration => "OutputRegistration",
            Phase::Signing => "Signing",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the round denomination is chosen at InputRegistration entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DenominationAlgorithm {
    /// Use the configured BTC amount directly.
    FixedBtc,
    /// Peg to a fiat target via the exchange-rate lookup; fall back to
    /// the configured BTC amount when the lookup fails.
    FixedFiat,
}

/// Bitcoin amount in satoshis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Amount(u64);

/// Satoshis per bitcoin.
pub const SATS_PER_BTC: u64 = 100_000_000;

impl Amount {
    /// Zero satoshis.
    pub const ZERO: Amount = Amount(0);

    /// Amount from a satoshi count.
    pub fn from_sat(satoshis: u64) -> Self {
        Self(satoshis)
    }

    /// Amount from a BTC value, rounded to the nearest satoshi.
    ///
    /// Returns `None` for non-finite, negative, or overflowing values.
    pub fn from_btc(btc: f64) -> Option<Self> {
        if !btc.is_finite() || btc < 0.0 {
            return None;
        }
        let sats = (btc * SATS_PER_BTC as f64).round();
        if sats > u64::MAX as f64 {
            return None;
        }
        Some(Self(sats as u64))
    }

    /// Satoshi count.
    pub fn as_sat(self) -> u64 {
        self.0
    }

    /// BTC value (lossy above 2^53 satoshis).
    pub fn as_btc(self) -> f64 {
        self.0 as f64 / SATS_PER_BTC as f64
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.8} BTC", self.as_btc())
    }
}

/// Read-only view of the current round, exposed to the API layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundSnapshot {
    /// Current phase.
    pub phase: Phase,
    /// Amount every participant mixes this round.
    pub denomination: Amount,
    /// Target participant count this round.
    pub anonymity_set: u32,
}
