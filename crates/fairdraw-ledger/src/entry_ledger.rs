//! Append-only ticket ledger.
//!
//! Each ticket is one slot in an arena addressed by its index. During the
//! entry window slots are only appended; afterwards the selection
//! procedure may swap owners, and settlement flips claimed flags from
//! `false` to `true`. Nothing else mutates the ledger.
//!
//! Closing the window seals the ledger: its length is frozen from then on,
//! whatever timestamp later callers present. Reordering is only possible
//! while sealed and before the first claim.
//!
//! ## Entry checks
//!
//! `enter` evaluates every precondition before touching state:
//! 1. count is positive
//! 2. the ledger is not sealed and the window is open
//! 3. the participant stays within the per-participant cap
//! 4. payment equals `count × unit_price` exactly, with no overflow

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use fairdraw_types::{DrawConfig, FairdrawError, ParticipantId, Result};
use rust_decimal::Decimal;

use crate::window::EntryWindow;

/// Outcome of a successful entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryReceipt {
    pub participant: ParticipantId,
    /// Index of the first ticket appended by this entry.
    pub first_index: usize,
    pub count: usize,
}

impl EntryReceipt {
    /// Ticket indices appended by this entry (valid until selection reorders).
    #[must_use]
    pub fn indices(&self) -> std::ops::Range<usize> {
        self.first_index..self.first_index + self.count
    }
}

/// The ticket arena plus per-participant counters.
#[derive(Debug, Clone)]
pub struct EntryLedger {
    /// Ticket owner by index.
    owners: Vec<ParticipantId>,
    /// Claimed flag by index (monotonic false → true).
    claimed: Vec<bool>,
    /// Tickets purchased per participant.
    counts: HashMap<ParticipantId, usize>,
    window: EntryWindow,
    unit_price: Decimal,
    max_per_participant: usize,
    /// Sum of all accepted payments.
    total_paid: Decimal,
    /// Set once when the window closes.
    sealed: bool,
    /// Tickets settled so far.
    claimed_count: usize,
}

impl EntryLedger {
    /// Create an empty ledger for the given draw.
    #[must_use]
    pub fn new(config: &DrawConfig) -> Self {
        Self {
            owners: Vec::new(),
            claimed: Vec::new(),
            counts: HashMap::new(),
            window: EntryWindow::from_config(config),
            unit_price: config.unit_price,
            max_per_participant: config.max_per_participant,
            total_paid: Decimal::ZERO,
            sealed: false,
            claimed_count: 0,
        }
    }

    /// Record `count` tickets for `participant`.
    ///
    /// # Errors
    /// - `EmptyEntry` if `count` is zero
    /// - `LedgerSealed` once the window has been closed
    /// - `WindowNotOpen` outside `[start, end]`
    /// - `ParticipantCapExceeded` if the running total would pass the cap
    /// - `PaymentMismatch` unless `payment == count × unit_price`
    /// - `InvalidAmount` if the price or running total overflows
    pub fn enter(
        &mut self,
        participant: ParticipantId,
        count: usize,
        payment: Decimal,
        now: DateTime<Utc>,
    ) -> Result<EntryReceipt> {
        if count == 0 {
            return Err(FairdrawError::EmptyEntry);
        }
        if self.sealed {
            return Err(FairdrawError::LedgerSealed {
                entries: self.owners.len(),
            });
        }
        self.window.check_open(now)?;

        let held = self.entries_of(participant);
        let within_cap = held
            .checked_add(count)
            .is_some_and(|total| total <= self.max_per_participant);
        if !within_cap {
            return Err(FairdrawError::ParticipantCapExceeded {
                held,
                requested: count,
                cap: self.max_per_participant,
            });
        }

        let expected = self
            .unit_price
            .checked_mul(Decimal::from(count))
            .ok_or_else(|| FairdrawError::InvalidAmount {
                reason: format!("{count} × {} overflows", self.unit_price),
            })?;
        if payment != expected {
            return Err(FairdrawError::PaymentMismatch {
                expected,
                supplied: payment,
            });
        }
        let total_paid = self.total_paid.checked_add(payment).ok_or_else(|| {
            FairdrawError::InvalidAmount {
                reason: format!("total paid {} + {payment} overflows", self.total_paid),
            }
        })?;

        let first_index = self.owners.len();
        self.owners.extend(std::iter::repeat_n(participant, count));
        self.claimed.resize(self.owners.len(), false);
        *self.counts.entry(participant).or_insert(0) += count;
        self.total_paid = total_paid;

        tracing::info!(
            participant = %participant,
            count,
            first_index,
            total = self.owners.len(),
            "Entry recorded"
        );

        Ok(EntryReceipt {
            participant,
            first_index,
            count,
        })
    }

    /// Total tickets sold.
    #[must_use]
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    /// Owner of the ticket at `index`.
    pub fn owner_of(&self, index: usize) -> Result<ParticipantId> {
        self.owners
            .get(index)
            .copied()
            .ok_or(FairdrawError::TicketOutOfRange {
                index,
                len: self.owners.len(),
            })
    }

    /// Whether the ticket at `index` has been settled.
    pub fn is_claimed(&self, index: usize) -> Result<bool> {
        self.claimed
            .get(index)
            .copied()
            .ok_or(FairdrawError::TicketOutOfRange {
                index,
                len: self.claimed.len(),
            })
    }

    /// Tickets purchased by `participant` so far.
    #[must_use]
    pub fn entries_of(&self, participant: ParticipantId) -> usize {
        self.counts.get(&participant).copied().unwrap_or(0)
    }

    /// Current indices of every ticket owned by `participant`.
    #[must_use]
    pub fn tickets_of(&self, participant: ParticipantId) -> Vec<usize> {
        self.owners
            .iter()
            .enumerate()
            .filter(|(_, owner)| **owner == participant)
            .map(|(index, _)| index)
            .collect()
    }

    /// Read-only view of the owner sequence.
    #[must_use]
    pub fn owners(&self) -> &[ParticipantId] {
        &self.owners
    }

    /// Sum of all accepted payments.
    #[must_use]
    pub fn total_paid(&self) -> Decimal {
        self.total_paid
    }

    #[must_use]
    pub fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    #[must_use]
    pub fn window(&self) -> &EntryWindow {
        &self.window
    }

    /// Freeze the ledger length. Idempotent.
    pub fn seal(&mut self) {
        if !self.sealed {
            self.sealed = true;
            tracing::info!(entries = self.owners.len(), "Entry ledger sealed");
        }
    }

    #[must_use]
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Check that ticket order may still change.
    ///
    /// # Errors
    /// `ReorderNotAllowed` before sealing or after any claim.
    pub fn check_reorderable(&self) -> Result<()> {
        if !self.sealed {
            return Err(FairdrawError::ReorderNotAllowed {
                reason: "ledger not sealed".to_string(),
            });
        }
        if self.claimed_count > 0 {
            return Err(FairdrawError::ReorderNotAllowed {
                reason: format!("{} tickets already claimed", self.claimed_count),
            });
        }
        Ok(())
    }

    /// Check that `participant` may settle the ticket at `index`.
    ///
    /// # Errors
    /// - `TicketOutOfRange` if `index` is past the end
    /// - `TicketAlreadyClaimed` if already settled
    /// - `NotTicketOwner` if someone else owns it
    pub fn check_claimable(&self, index: usize, participant: ParticipantId) -> Result<()> {
        if self.is_claimed(index)? {
            return Err(FairdrawError::TicketAlreadyClaimed(index));
        }
        if self.owners[index] != participant {
            return Err(FairdrawError::NotTicketOwner {
                index,
                caller: participant,
            });
        }
        Ok(())
    }

    /// Flip the claimed flag. Callers validate with
    /// [`check_claimable`](Self::check_claimable) first.
    ///
    /// # Errors
    /// `TicketOutOfRange` or `TicketAlreadyClaimed`.
    pub fn mark_claimed(&mut self, index: usize) -> Result<()> {
        if self.is_claimed(index)? {
            return Err(FairdrawError::TicketAlreadyClaimed(index));
        }
        self.claimed[index] = true;
        self.claimed_count += 1;
        Ok(())
    }

    /// Exchange the owners of two tickets during winner selection.
    ///
    /// # Errors
    /// - `ReorderNotAllowed` unless sealed and nothing is claimed
    /// - `TicketOutOfRange` for either index past the end
    pub fn swap(&mut self, a: usize, b: usize) -> Result<()> {
        self.check_reorderable()?;
        let len = self.owners.len();
        if let Some(&index) = [a, b].iter().find(|&&i| i >= len) {
            return Err(FairdrawError::TicketOutOfRange { index, len });
        }
        self.owners.swap(a, b);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn ledger() -> EntryLedger {
        EntryLedger::new(&DrawConfig::dummy(10, 6))
    }

    fn open() -> DateTime<Utc> {
        DrawConfig::dummy_start() + Duration::hours(1)
    }

    #[test]
    fn enter_appends_and_counts() {
        let mut l = ledger();
        let alice = ParticipantId::new();
        let receipt = l.enter(alice, 3, Decimal::new(3, 0), open()).unwrap();
        assert_eq!(receipt.indices(), 0..3);
        assert_eq!(l.len(), 3);
        assert_eq!(l.entries_of(alice), 3);

        let receipt = l.enter(alice, 2, Decimal::new(2, 0), open()).unwrap();
        assert_eq!(receipt.first_index, 3);
        assert_eq!(l.len(), 5);
        assert_eq!(l.entries_of(alice), 5);
        assert_eq!(l.total_paid(), Decimal::new(5, 0));
        assert_eq!(l.tickets_of(alice), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn cap_exceeded_leaves_no_trace() {
        let mut l = ledger();
        let alice = ParticipantId::new();
        l.enter(alice, 5, Decimal::new(5, 0), open()).unwrap();
        let err = l.enter(alice, 2, Decimal::new(2, 0), open()).unwrap_err();
        assert!(matches!(
            err,
            FairdrawError::ParticipantCapExceeded { held: 5, requested: 2, cap: 6 }
        ));
        assert_eq!(l.len(), 5);
        assert_eq!(l.entries_of(alice), 5);
    }

    #[test]
    fn exact_payment_required() {
        let mut l = ledger();
        let alice = ParticipantId::new();
        let under = l.enter(alice, 2, Decimal::ONE, open()).unwrap_err();
        let over = l.enter(alice, 2, Decimal::new(3, 0), open()).unwrap_err();
        assert!(matches!(under, FairdrawError::PaymentMismatch { .. }));
        assert!(matches!(over, FairdrawError::PaymentMismatch { .. }));
        assert!(l.is_empty());
        assert_eq!(l.entries_of(alice), 0);
    }

    #[test]
    fn outside_window_rejected() {
        let mut l = ledger();
        let alice = ParticipantId::new();
        let before = DrawConfig::dummy_start() - Duration::seconds(1);
        let after = DrawConfig::dummy_end() + Duration::seconds(1);
        assert!(matches!(
            l.enter(alice, 1, Decimal::ONE, before).unwrap_err(),
            FairdrawError::WindowNotOpen { .. }
        ));
        assert!(matches!(
            l.enter(alice, 1, Decimal::ONE, after).unwrap_err(),
            FairdrawError::WindowNotOpen { .. }
        ));
        assert!(l.enter(alice, 1, Decimal::ONE, DrawConfig::dummy_end()).is_ok());
    }

    #[test]
    fn zero_count_rejected() {
        let mut l = ledger();
        let err = l
            .enter(ParticipantId::new(), 0, Decimal::ZERO, open())
            .unwrap_err();
        assert!(matches!(err, FairdrawError::EmptyEntry));
    }

    #[test]
    fn claim_checks() {
        let mut l = ledger();
        let alice = ParticipantId::new();
        let bob = ParticipantId::new();
        l.enter(alice, 1, Decimal::ONE, open()).unwrap();

        assert!(matches!(
            l.check_claimable(1, alice).unwrap_err(),
            FairdrawError::TicketOutOfRange { index: 1, len: 1 }
        ));
        assert!(matches!(
            l.check_claimable(0, bob).unwrap_err(),
            FairdrawError::NotTicketOwner { index: 0, .. }
        ));
        l.check_claimable(0, alice).unwrap();
        l.mark_claimed(0).unwrap();
        assert!(l.is_claimed(0).unwrap());
        assert!(matches!(
            l.check_claimable(0, alice).unwrap_err(),
            FairdrawError::TicketAlreadyClaimed(0)
        ));
        assert!(l.mark_claimed(0).is_err());
    }

    #[test]
    fn swap_exchanges_owners() {
        let mut l = ledger();
        let alice = ParticipantId::new();
        let bob = ParticipantId::new();
        l.enter(alice, 1, Decimal::ONE, open()).unwrap();
        l.enter(bob, 1, Decimal::ONE, open()).unwrap();
        assert!(matches!(
            l.swap(0, 1).unwrap_err(),
            FairdrawError::ReorderNotAllowed { .. }
        ));

        l.seal();
        l.swap(0, 1).unwrap();
        assert_eq!(l.owner_of(0).unwrap(), bob);
        assert_eq!(l.owner_of(1).unwrap(), alice);
        // Counters are per participant, not per position.
        assert_eq!(l.entries_of(alice), 1);
        assert!(matches!(
            l.swap(0, 2).unwrap_err(),
            FairdrawError::TicketOutOfRange { index: 2, len: 2 }
        ));

        l.mark_claimed(0).unwrap();
        assert!(matches!(
            l.swap(0, 1).unwrap_err(),
            FairdrawError::ReorderNotAllowed { .. }
        ));
        assert_eq!(l.owner_of(0).unwrap(), bob);
    }

    #[test]
    fn sealed_ledger_rejects_in_window_entries() {
        let mut l = ledger();
        let alice = ParticipantId::new();
        l.enter(alice, 2, Decimal::new(2, 0), open()).unwrap();
        l.seal();
        l.seal();
        let err = l.enter(alice, 1, Decimal::ONE, open()).unwrap_err();
        assert!(matches!(err, FairdrawError::LedgerSealed { entries: 2 }));
        assert_eq!(l.len(), 2);
        assert_eq!(l.entries_of(alice), 2);
        assert_eq!(l.total_paid(), Decimal::new(2, 0));
    }

    #[test]
    fn price_overflow_is_an_error() {
        let mut cfg = DrawConfig::dummy(10, 6);
        cfg.unit_price = Decimal::MAX;
        let mut l = EntryLedger::new(&cfg);
        let alice = ParticipantId::new();
        let err = l.enter(alice, 2, Decimal::ONE, open()).unwrap_err();
        assert!(matches!(err, FairdrawError::InvalidAmount { .. }));

        // A single ticket fits, but a second payment overflows the total.
        l.enter(alice, 1, Decimal::MAX, open()).unwrap();
        let err = l.enter(alice, 1, Decimal::MAX, open()).unwrap_err();
        assert!(matches!(err, FairdrawError::InvalidAmount { .. }));
        assert_eq!(l.len(), 1);
        assert_eq!(l.entries_of(alice), 1);
    }
}
