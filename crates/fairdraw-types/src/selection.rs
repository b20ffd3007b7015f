//! Selection status for the deferred shuffle.
//!
//! Selection is decided once the entry window closes:
//! **NOT_REQUIRED** when entries fit within supply, otherwise
//! **IDLE → AWAITING_ENTROPY → IN_PROGRESS → COMPLETE**.
//!
//! `IN_PROGRESS` covers both "entropy received, cursor at zero" and
//! "some batches applied"; the cursor distinguishes them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where the winner selection procedure stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SelectionStatus {
    /// Entries do not exceed supply; every ticket wins.
    NotRequired,
    /// Selection is needed but no entropy has been requested.
    Idle,
    /// Entropy requested, delivery pending.
    AwaitingEntropy,
    /// Entropy received; cursor below available supply.
    InProgress,
    /// Cursor reached available supply; winners are final.
    Complete,
}

impl SelectionStatus {
    /// Whether claims may proceed.
    #[must_use]
    pub fn is_final(self) -> bool {
        matches!(self, Self::NotRequired | Self::Complete)
    }
}

impl fmt::Display for SelectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotRequired => write!(f, "NOT_REQUIRED"),
            Self::Idle => write!(f, "IDLE"),
            Self::AwaitingEntropy => write!(f, "AWAITING_ENTROPY"),
            Self::InProgress => write!(f, "IN_PROGRESS"),
            Self::Complete => write!(f, "COMPLETE"),
        }
    }
}
