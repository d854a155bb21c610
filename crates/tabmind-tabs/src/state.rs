//! Suspension State Machine
//!
//! ```text
//! Active
//!   ↓ idle-eligible (background, not essential, auto-suspend on)
//! Idle
//!   ↓ suspend delay elapsed
//! Suspended
//!   ↓ activated
//! Active
//! ```
//!
//! A manual suspend request may move a background tab straight from
//! Active to Suspended.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuspensionState {
    /// Tab is loaded and has no pending idle timer
    #[default]
    Active,
    /// Tab is loaded and its idle timer is pending
    Idle,
    /// Tab's page was replaced by the placeholder; a snapshot is persisted
    Suspended,
}

impl SuspensionState {
    /// Check if transition to another state is valid
    pub fn can_transition_to(&self, target: SuspensionState) -> bool {
        match (self, target) {
            (SuspensionState::Active, SuspensionState::Idle) => true,
            (SuspensionState::Active, SuspensionState::Suspended) => true,
            (SuspensionState::Idle, SuspensionState::Active) => true,
            (SuspensionState::Idle, SuspensionState::Suspended) => true,
            (SuspensionState::Suspended, SuspensionState::Active) => true,
            // Same state is always valid (timer restart, repeated activation)
            (a, b) if *a == b => true,
            _ => false,
        }
    }

    pub fn is_suspended(&self) -> bool {
        matches!(self, SuspensionState::Suspended)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SuspensionState::Active => "active",
            SuspensionState::Idle => "idle",
            SuspensionState::Suspended => "suspended",
        }
    }
}

impl std::fmt::Display for SuspensionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
