//! Error types for the fairdraw allocation engine.
//!
//! All errors use the `FD_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by failure class:
//! - 1xx: Timing errors (operation outside its valid window)
//! - 2xx: Authorization errors
//! - 3xx: Payment errors
//! - 4xx: Capacity errors (participant cap, batch bounds)
//! - 5xx: Ordering / state errors (prerequisite missing or already done)
//! - 6xx: Ownership / range errors (ticket lookups)
//! - 7xx: Settlement-transfer errors
//! - 8xx: Randomness delivery errors
//! - 9xx: General / internal errors
//!
//! Every operation checks all of its preconditions before mutating
//! anything, so receiving any of these errors means nothing changed.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::{ParticipantId, RandomnessPurpose, RequestId, SelectionStatus};

/// Central error enum for all fairdraw operations.
#[derive(Debug, Error)]
pub enum FairdrawError {
    // =================================================================
    // Timing Errors (1xx)
    // =================================================================
    /// Entries are only accepted inside the inclusive `[start, end]` window.
    #[error("FD_ERR_100: Entry window is not open at {now} (window {start} .. {end})")]
    WindowNotOpen {
        now: DateTime<Utc>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// The operation needs the entry window to have closed.
    #[error("FD_ERR_101: Entry window still open until {end}")]
    WindowStillOpen { end: DateTime<Utc> },

    /// The ledger was sealed when the window closed; no further entries.
    #[error("FD_ERR_102: Entry ledger sealed at close ({entries} entries)")]
    LedgerSealed { entries: usize },

    // =================================================================
    // Authorization Errors (2xx)
    // =================================================================
    /// The caller is not the configured owner.
    #[error("FD_ERR_200: Caller {caller} is not authorized")]
    Unauthorized { caller: ParticipantId },

    // =================================================================
    // Payment Errors (3xx)
    // =================================================================
    /// Payment must equal `count × unit_price` exactly.
    #[error("FD_ERR_300: Payment mismatch: expected {expected}, got {supplied}")]
    PaymentMismatch { expected: Decimal, supplied: Decimal },

    /// A fee or price value was negative.
    #[error("FD_ERR_301: Invalid amount: {reason}")]
    InvalidAmount { reason: String },

    // =================================================================
    // Capacity Errors (4xx)
    // =================================================================
    /// The participant would exceed the per-participant ticket cap.
    #[error("FD_ERR_400: Participant cap exceeded: {held} held + {requested} requested > {cap}")]
    ParticipantCapExceeded {
        held: usize,
        requested: usize,
        cap: usize,
    },

    /// An entry must purchase at least one ticket.
    #[error("FD_ERR_401: Entry count must be positive")]
    EmptyEntry,

    /// A shuffle batch must be between 1 and the remaining positions.
    #[error("FD_ERR_402: Invalid shuffle batch size {requested} (remaining {remaining})")]
    InvalidBatchSize { requested: usize, remaining: usize },

    // =================================================================
    // Ordering / State Errors (5xx)
    // =================================================================
    /// Entries do not exceed supply, so no selection runs.
    #[error("FD_ERR_500: Selection not required: entries do not exceed supply")]
    SelectionNotRequired,

    /// The selection procedure is not in the state this operation needs.
    #[error("FD_ERR_501: Wrong selection status: expected {expected}, got {actual}")]
    WrongSelectionStatus {
        expected: SelectionStatus,
        actual: SelectionStatus,
    },

    /// Claims wait until winners are final.
    #[error("FD_ERR_502: Selection not finalized (status {0})")]
    SelectionNotFinalized(SelectionStatus),

    /// A reveal needs minted items beyond the revealed watermark.
    #[error("FD_ERR_503: Nothing to reveal: settled {settled}, revealed {revealed}")]
    NothingToReveal { settled: u64, revealed: u64 },

    /// A randomness request of this purpose is already outstanding.
    #[error("FD_ERR_504: Randomness request already outstanding for {0}")]
    RequestAlreadyOutstanding(RandomnessPurpose),

    /// Proceeds can only be withdrawn once.
    #[error("FD_ERR_505: Proceeds already withdrawn")]
    ProceedsAlreadyWithdrawn,

    /// The ticket has already been settled.
    #[error("FD_ERR_506: Ticket {0} already claimed")]
    TicketAlreadyClaimed(usize),

    /// Ticket order may only change between close and the first claim.
    #[error("FD_ERR_507: Ledger cannot be reordered: {reason}")]
    ReorderNotAllowed { reason: String },

    // =================================================================
    // Ownership / Range Errors (6xx)
    // =================================================================
    /// The ticket index lies outside the ledger.
    #[error("FD_ERR_600: Ticket index {index} out of range (ledger length {len})")]
    TicketOutOfRange { index: usize, len: usize },

    /// The ticket belongs to somebody else.
    #[error("FD_ERR_601: Ticket {index} is not owned by {caller}")]
    NotTicketOwner { index: usize, caller: ParticipantId },

    // =================================================================
    // Settlement-Transfer Errors (7xx)
    // =================================================================
    /// Value transfer to a participant failed.
    #[error("FD_ERR_700: Value transfer failed: {reason}")]
    TransferFailed { reason: String },

    /// Item issuance failed.
    #[error("FD_ERR_701: Item issuance failed: {reason}")]
    IssuanceFailed { reason: String },

    // =================================================================
    // Randomness Delivery Errors (8xx)
    // =================================================================
    /// No outstanding request carries this id (unknown or already fulfilled).
    #[error("FD_ERR_800: Unknown randomness request: {0}")]
    UnknownRequest(RequestId),

    /// The oracle proof on a fulfillment did not verify.
    #[error("FD_ERR_801: Randomness proof rejected: {reason}")]
    InvalidRandomnessProof { reason: String },

    /// The provider refused to accept a request.
    #[error("FD_ERR_802: Randomness provider rejected request: {reason}")]
    ProviderRejected { reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("FD_ERR_900: Internal error: {0}")]
    Internal(String),

    /// An accounting invariant broke. Critical safety alert.
    #[error("FD_ERR_901: Conservation invariant violation: {reason}")]
    ConservationViolation { reason: String },

    /// Serialization / deserialization error.
    #[error("FD_ERR_902: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config file, bad values, etc.).
    #[error("FD_ERR_903: Configuration error: {0}")]
    Configuration(String),

    /// I/O error.
    #[error("FD_ERR_904: I/O error: {0}")]
    Io(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, FairdrawError>;

impl From<std::io::Error> for FairdrawError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for FairdrawError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
