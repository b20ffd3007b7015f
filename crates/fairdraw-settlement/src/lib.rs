//! # fairdraw-settlement
//!
//! **Finality plane**: converts tickets into items or refunds, exactly
//! once, and releases sale proceeds to the owner.
//!
//! ## Architecture
//!
//! 1. Validates claimability (range, ownership, not yet claimed)
//! 2. Splits tickets into winners and losers by position
//! 3. Checks projected conservation totals
//! 4. Issues items and transfers the refund inside one sink transaction
//! 5. Marks tickets claimed only after the sink commits
//!
//! Proceeds leave through the same sink, guarded by a write-once flag.

pub mod claim;
pub mod conservation;
pub mod proceeds;
pub mod sink;

pub use claim::{ClaimOutcome, ClaimProcessor};
pub use conservation::SettlementConservation;
pub use proceeds::ProceedsVault;
pub use sink::{InMemorySink, SettlementSink};
