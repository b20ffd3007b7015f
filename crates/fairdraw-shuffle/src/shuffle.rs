//! Resumable partial Fisher–Yates over the entry ledger.
//!
//! ```text
//! for i in cursor .. cursor + batch:
//!     j = i + (entropy mod (total_entries - i))
//!     swap(ledger[i], ledger[j])
//! ```
//!
//! ## Batch Invariance
//!
//! Step `i` depends only on the absolute index `i`, the fixed entropy and
//! the ledger contents left by steps `0..i`. Splitting `0..supply` into
//! batches therefore cannot change the outcome: one call of size `supply`
//! and any sequence of smaller calls perform the identical swap sequence.
//!
//! After the cursor reaches `available_supply`, positions below it are
//! winners and the rest are losers.

use fairdraw_ledger::EntryLedger;
use fairdraw_types::{Entropy, FairdrawError, Result, SelectionStatus};

use crate::determinism::compute_ordering_root;

/// Swap partner for absolute step `i`.
///
/// # Panics
/// Panics if `i >= total_entries`.
#[must_use]
pub fn step_target(i: usize, total_entries: usize, entropy: &Entropy) -> usize {
    i + entropy.modulo(total_entries - i)
}

/// Result of one `advance` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShuffleProgress {
    /// Cursor before the batch.
    pub from: usize,
    /// Cursor after the batch.
    pub to: usize,
    /// Whether winners are now final.
    pub complete: bool,
}

/// State machine for the deferred winner selection.
#[derive(Debug, Clone)]
pub struct DeferredShuffle {
    status: SelectionStatus,
    total_entries: usize,
    supply: usize,
    /// Number of leading positions finalized.
    cursor: usize,
    /// Write-once selection entropy.
    entropy: Option<Entropy>,
}

impl DeferredShuffle {
    /// Decide whether selection is needed for a closed ledger.
    #[must_use]
    pub fn new(total_entries: usize, supply: usize) -> Self {
        let status = if total_entries > supply {
            SelectionStatus::Idle
        } else {
            SelectionStatus::NotRequired
        };
        Self {
            status,
            total_entries,
            supply,
            cursor: 0,
            entropy: None,
        }
    }

    #[must_use]
    pub fn status(&self) -> SelectionStatus {
        self.status
    }

    #[must_use]
    pub fn is_required(&self) -> bool {
        self.status != SelectionStatus::NotRequired
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn entropy(&self) -> Option<Entropy> {
        self.entropy
    }

    #[must_use]
    pub fn total_entries(&self) -> usize {
        self.total_entries
    }

    #[must_use]
    pub fn supply(&self) -> usize {
        self.supply
    }

    /// Positions still to be finalized.
    #[must_use]
    pub fn remaining(&self) -> usize {
        if self.is_required() {
            self.supply - self.cursor
        } else {
            0
        }
    }

    /// Number of winning positions once selection is final.
    #[must_use]
    pub fn winner_count(&self) -> usize {
        self.total_entries.min(self.supply)
    }

    fn expect_status(&self, expected: SelectionStatus) -> Result<()> {
        if !self.is_required() {
            return Err(FairdrawError::SelectionNotRequired);
        }
        if self.status != expected {
            return Err(FairdrawError::WrongSelectionStatus {
                expected,
                actual: self.status,
            });
        }
        Ok(())
    }

    /// Check that selection entropy may be requested now.
    pub fn check_request(&self) -> Result<()> {
        self.expect_status(SelectionStatus::Idle)
    }

    /// Record that the entropy request went out.
    pub fn mark_requested(&mut self) -> Result<()> {
        self.check_request()?;
        self.status = SelectionStatus::AwaitingEntropy;
        Ok(())
    }

    /// Check that delivered entropy may be accepted now.
    pub fn check_accept(&self) -> Result<()> {
        self.expect_status(SelectionStatus::AwaitingEntropy)
    }

    /// Store the write-once selection entropy.
    pub fn accept_entropy(&mut self, entropy: Entropy) -> Result<()> {
        self.check_accept()?;
        self.entropy = Some(entropy);
        self.status = SelectionStatus::InProgress;
        tracing::info!(entropy = %entropy, "Selection entropy received");
        Ok(())
    }

    /// Apply the next `batch_size` shuffle steps to `ledger`.
    ///
    /// # Errors
    /// - `SelectionNotRequired` if entries fit within supply
    /// - `WrongSelectionStatus` unless entropy is in and the cursor is short
    ///   of supply
    /// - `InvalidBatchSize` unless `1 <= batch_size <= remaining`
    /// - `ReorderNotAllowed` unless the ledger is sealed and unclaimed
    /// - `Internal` if the ledger length changed after close
    pub fn advance(&mut self, ledger: &mut EntryLedger, batch_size: usize) -> Result<ShuffleProgress> {
        self.expect_status(SelectionStatus::InProgress)?;
        let remaining = self.remaining();
        if batch_size == 0 || batch_size > remaining {
            return Err(FairdrawError::InvalidBatchSize {
                requested: batch_size,
                remaining,
            });
        }
        ledger.check_reorderable()?;
        if ledger.len() != self.total_entries {
            return Err(FairdrawError::Internal(format!(
                "ledger length {} changed after close (expected {})",
                ledger.len(),
                self.total_entries
            )));
        }
        let Some(entropy) = self.entropy else {
            return Err(FairdrawError::Internal(
                "selection in progress without entropy".to_string(),
            ));
        };

        let from = self.cursor;
        let to = from + batch_size;
        for i in from..to {
            let j = step_target(i, self.total_entries, &entropy);
            ledger.swap(i, j)?;
        }
        self.cursor = to;

        let complete = self.cursor == self.supply;
        if complete {
            self.status = SelectionStatus::Complete;
            tracing::info!(
                winners = self.supply,
                entries = self.total_entries,
                ordering_root = hex::encode(compute_ordering_root(&ledger.owners()[..self.supply])),
                "Selection complete"
            );
        } else {
            tracing::debug!(from, to, supply = self.supply, "Shuffle batch applied");
        }

        Ok(ShuffleProgress { from, to, complete })
    }
}
