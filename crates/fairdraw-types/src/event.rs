//! Notifications emitted by successful operations.
//!
//! The engine appends one [`DrawEvent`] per state change so that
//! indexers and auditors can replay what happened.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{MetadataRange, ParticipantId, RandomnessPurpose, RequestId};

/// One recorded state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawEvent {
    /// Tickets were purchased.
    EntryRecorded {
        participant: ParticipantId,
        count: usize,
    },
    /// A randomness request was accepted by the provider.
    RandomnessRequested {
        request_id: RequestId,
        purpose: RandomnessPurpose,
        fee: Decimal,
    },
    /// The selection entropy arrived.
    SelectionEntropyReceived { request_id: RequestId },
    /// A shuffle batch was applied.
    ShuffleProgress { cursor: usize, batch: usize },
    /// A claim settled some tickets.
    TicketsClaimed {
        participant: ParticipantId,
        minted: usize,
        refunded: usize,
        refund: Decimal,
    },
    /// Reveal entropy was applied to a new range.
    MetadataRevealed {
        request_id: RequestId,
        range: MetadataRange,
    },
    /// The owner withdrew sale proceeds.
    ProceedsWithdrawn { to: ParticipantId, amount: Decimal },
    /// The owner changed the randomness fee.
    RandomnessFeeUpdated { old: Decimal, new: Decimal },
}

impl DrawEvent {
    /// Stable event name for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EntryRecorded { .. } => "ENTRY_RECORDED",
            Self::RandomnessRequested { .. } => "RANDOMNESS_REQUESTED",
            Self::SelectionEntropyReceived { .. } => "SELECTION_ENTROPY_RECEIVED",
            Self::ShuffleProgress { .. } => "SHUFFLE_PROGRESS",
            Self::TicketsClaimed { .. } => "TICKETS_CLAIMED",
            Self::MetadataRevealed { .. } => "METADATA_REVEALED",
            Self::ProceedsWithdrawn { .. } => "PROCEEDS_WITHDRAWN",
            Self::RandomnessFeeUpdated { .. } => "RANDOMNESS_FEE_UPDATED",
        }
    }
}

impl fmt::Display for DrawEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind())
    }
}
