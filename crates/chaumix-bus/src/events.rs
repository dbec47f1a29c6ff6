//! Event payloads carried by the bus.

use serde::{Deserialize, Serialize};

/// Announcement of a round phase transition.
///
/// Delivered to all current subscribers at every transition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseChangeEvent {
    /// Name of the phase just entered.
    pub new_phase: String,
    /// Free-text detail, may be empty.
    pub message: String,
}

impl PhaseChangeEvent {
    /// Event for entering `new_phase` with no extra detail.
    pub fn entered(new_phase: impl Into<String>) -> Self {
        Self {
            new_phase: new_phase.into(),
            message: String::new(),
        }
    }

    /// Event for entering `new_phase` with a free-text message.
    pub fn with_message(new_phase: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            new_phase: new_phase.into(),
            message: message.into(),
        }
    }
}
