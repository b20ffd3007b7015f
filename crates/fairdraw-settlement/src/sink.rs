//! Settlement sink: where issued items and value transfers land.
//!
//! Item ownership and the payment rail live outside this workspace. The
//! claim processor drives them through [`SettlementSink`], bracketing
//! each claim in `begin` / `commit`, and calling `rollback` if any
//! instruction fails so that no partial settlement survives.

use std::collections::{BTreeMap, HashMap, HashSet};

use fairdraw_types::{FairdrawError, ItemId, ParticipantId, Result};
use rust_decimal::Decimal;

/// External collaborator that issues items and moves value.
pub trait SettlementSink {
    /// Open a settlement transaction.
    fn begin(&mut self) {}

    /// Issue `item` to `to`.
    fn issue_item(&mut self, to: ParticipantId, item: ItemId) -> Result<()>;

    /// Transfer `amount` of payment value to `to`.
    fn transfer_value(&mut self, to: ParticipantId, amount: Decimal) -> Result<()>;

    /// Make everything since `begin` permanent.
    fn commit(&mut self) {}

    /// Undo everything since `begin`.
    fn rollback(&mut self) {}
}

/// One applied instruction, kept until commit for rollback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SinkOp {
    Issued(ItemId),
    Transferred(ParticipantId, Decimal),
}

/// Journaled in-memory sink with failure injection.
///
/// Used by simulations and tests as the reference implementation of the
/// all-or-nothing contract.
#[derive(Debug, Default)]
pub struct InMemorySink {
    /// Issued items and their holders.
    items: BTreeMap<ItemId, ParticipantId>,
    /// Value received per participant.
    balances: HashMap<ParticipantId, Decimal>,
    /// Instructions applied since `begin`; `None` outside a transaction.
    journal: Option<Vec<SinkOp>>,
    /// Participants whose incoming transfers fail.
    failing_transfers: HashSet<ParticipantId>,
    /// Whether every issuance fails.
    failing_issuance: bool,
}

impl InMemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every transfer to `participant` fail until cleared.
    pub fn fail_transfers_to(&mut self, participant: ParticipantId) {
        self.failing_transfers.insert(participant);
    }

    /// Make every issuance fail until cleared.
    pub fn fail_issuance(&mut self) {
        self.failing_issuance = true;
    }

    /// Remove all injected failures.
    pub fn clear_failures(&mut self) {
        self.failing_transfers.clear();
        self.failing_issuance = false;
    }

    #[must_use]
    pub fn holder_of(&self, item: ItemId) -> Option<ParticipantId> {
        self.items.get(&item).copied()
    }

    #[must_use]
    pub fn items_of(&self, participant: ParticipantId) -> Vec<ItemId> {
        self.items
            .iter()
            .filter(|(_, holder)| **holder == participant)
            .map(|(item, _)| *item)
            .collect()
    }

    #[must_use]
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn balance_of(&self, participant: ParticipantId) -> Decimal {
        self.balances.get(&participant).copied().unwrap_or(Decimal::ZERO)
    }

    #[must_use]
    pub fn total_transferred(&self) -> Decimal {
        self.balances.values().copied().sum()
    }

    fn record(&mut self, op: SinkOp) {
        if let Some(journal) = self.journal.as_mut() {
            journal.push(op);
        }
    }
}

impl SettlementSink for InMemorySink {
    fn begin(&mut self) {
        self.journal = Some(Vec::new());
    }

    fn issue_item(&mut self, to: ParticipantId, item: ItemId) -> Result<()> {
        if self.failing_issuance {
            return Err(FairdrawError::IssuanceFailed {
                reason: format!("issuance disabled for {item}"),
            });
        }
        if self.items.contains_key(&item) {
            return Err(FairdrawError::IssuanceFailed {
                reason: format!("{item} already issued"),
            });
        }
        self.items.insert(item, to);
        self.record(SinkOp::Issued(item));
        Ok(())
    }

    fn transfer_value(&mut self, to: ParticipantId, amount: Decimal) -> Result<()> {
        if self.failing_transfers.contains(&to) {
            return Err(FairdrawError::TransferFailed {
                reason: format!("recipient {to} rejected {amount}"),
            });
        }
        *self.balances.entry(to).or_insert(Decimal::ZERO) += amount;
        self.record(SinkOp::Transferred(to, amount));
        Ok(())
    }

    fn commit(&mut self) {
        self.journal = None;
    }

    fn rollback(&mut self) {
        let Some(journal) = self.journal.take() else {
            return;
        };
        for op in journal.into_iter().rev() {
            match op {
                SinkOp::Issued(item) => {
                    self.items.remove(&item);
                }
                SinkOp::Transferred(to, amount) => {
                    if let Some(balance) = self.balances.get_mut(&to) {
                        *balance -= amount;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_and_transfer() {
        let mut sink = InMemorySink::new();
        let alice = ParticipantId::new();
        sink.issue_item(alice, ItemId(1)).unwrap();
        sink.transfer_value(alice, Decimal::new(5, 0)).unwrap();
        assert_eq!(sink.holder_of(ItemId(1)), Some(alice));
        assert_eq!(sink.items_of(alice), vec![ItemId(1)]);
        assert_eq!(sink.balance_of(alice), Decimal::new(5, 0));
    }

    #[test]
    fn duplicate_issue_rejected() {
        let mut sink = InMemorySink::new();
        let alice = ParticipantId::new();
        sink.issue_item(alice, ItemId(1)).unwrap();
        let err = sink.issue_item(alice, ItemId(1)).unwrap_err();
        assert!(matches!(err, FairdrawError::IssuanceFailed { .. }));
    }

    #[test]
    fn rollback_undoes_transaction_only() {
        let mut sink = InMemorySink::new();
        let alice = ParticipantId::new();
        sink.issue_item(alice, ItemId(1)).unwrap();

        sink.begin();
        sink.issue_item(alice, ItemId(2)).unwrap();
        sink.transfer_value(alice, Decimal::new(3, 0)).unwrap();
        sink.rollback();

        assert_eq!(sink.item_count(), 1);
        assert_eq!(sink.balance_of(alice), Decimal::ZERO);
    }

    #[test]
    fn commit_keeps_changes() {
        let mut sink = InMemorySink::new();
        let alice = ParticipantId::new();
        sink.begin();
        sink.issue_item(alice, ItemId(1)).unwrap();
        sink.commit();
        sink.rollback();
        assert_eq!(sink.item_count(), 1);
    }

    #[test]
    fn injected_failures() {
        let mut sink = InMemorySink::new();
        let alice = ParticipantId::new();
        sink.fail_transfers_to(alice);
        sink.fail_issuance();
        assert!(matches!(
            sink.transfer_value(alice, Decimal::ONE).unwrap_err(),
            FairdrawError::TransferFailed { .. }
        ));
        assert!(sink.issue_item(alice, ItemId(1)).is_err());
        sink.clear_failures();
        assert!(sink.transfer_value(alice, Decimal::ONE).is_ok());
        assert!(sink.issue_item(alice, ItemId(1)).is_ok());
    }
}
