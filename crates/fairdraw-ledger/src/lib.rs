//! # fairdraw-ledger
//!
//! **Entry phase**: ticket purchases during the open window.
//!
//! ## Components
//!
//! 1. **EntryWindow**: inclusive `[start, end]` guard; post-sale operations
//!    require `now > end`
//! 2. **EntryLedger**: append-only ticket arena with per-participant counters,
//!    cap enforcement, and exact-payment checks
//!
//! ## Entry Flow
//!
//! ```text
//! enter(participant, count, payment, now)
//!     → count > 0 → not sealed → window open → cap → payment == count × price
//!     → append `count` slots → bump counter
//! ```
//!
//! The first post-sale operation seals the ledger; from then on only the
//! selection procedure may reorder it, and only until the first claim.

pub mod entry_ledger;
pub mod window;

pub use entry_ledger::{EntryLedger, EntryReceipt};
pub use window::EntryWindow;
