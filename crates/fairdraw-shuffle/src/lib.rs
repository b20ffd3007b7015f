//! # fairdraw-shuffle
//!
//! **Selection plane**: deterministic, resumable winner selection.
//!
//! Runs only when more tickets were sold than items exist. A single
//! externally supplied [`Entropy`](fairdraw_types::Entropy) drives a
//! partial Fisher–Yates shuffle over the first `available_supply`
//! ledger positions, split across as many bounded calls as needed.
//!
//! - [`DeferredShuffle`]: explicit NOT_REQUIRED / IDLE / AWAITING_ENTROPY /
//!   IN_PROGRESS / COMPLETE state machine with a persisted cursor
//! - [`compute_ordering_root`]: SHA-256 commitment to the final winners
//!   for cross-run verification

pub mod determinism;
pub mod shuffle;

pub use determinism::{compute_ordering_root, verify_ordering_root};
pub use shuffle::{DeferredShuffle, ShuffleProgress, step_target};
