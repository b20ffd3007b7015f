//! Claim processing: exactly-once settlement per ticket.
//!
//! Once winners are final, each ticket settles exactly once:
//! 1. Validate every index (in range, unclaimed, owned by caller, not
//!    repeated within the call)
//! 2. Plan: winners (`index < available_supply`) get the next item ids,
//!    losers accumulate one unit-price refund each
//! 3. Check the projected conservation totals
//! 4. Issue items and transfer the summed refund inside one sink
//!    transaction; on failure, roll back and leave the ledger untouched
//! 5. Mark tickets claimed and advance the settled counter
//!
//! Whether selection is final and whether the window has closed are
//! checked by the caller before entering here.

use std::collections::HashSet;

use fairdraw_ledger::EntryLedger;
use fairdraw_types::{DrawConfig, FairdrawError, ItemId, ParticipantId, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::conservation::SettlementConservation;
use crate::sink::SettlementSink;

/// What one claim call settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimOutcome {
    pub participant: ParticipantId,
    /// Winning tickets and the item each produced.
    pub minted: Vec<(usize, ItemId)>,
    /// Losing tickets refunded.
    pub refunded: Vec<usize>,
    /// Total value transferred back.
    pub refund: Decimal,
}

/// Settles tickets into items or refunds.
#[derive(Debug, Clone)]
pub struct ClaimProcessor {
    unit_price: Decimal,
    supply: usize,
    /// Items issued so far; the next item is `ItemId::after(settled)`.
    settled: u64,
    conservation: SettlementConservation,
}

impl ClaimProcessor {
    #[must_use]
    pub fn new(config: &DrawConfig) -> Self {
        Self {
            unit_price: config.unit_price,
            supply: config.available_supply,
            settled: 0,
            conservation: SettlementConservation::new(),
        }
    }

    /// Items issued so far.
    #[must_use]
    pub fn settled(&self) -> u64 {
        self.settled
    }

    /// Tickets refunded so far.
    #[must_use]
    pub fn refunded(&self) -> u64 {
        self.conservation.refunded()
    }

    #[must_use]
    pub fn conservation(&self) -> &SettlementConservation {
        &self.conservation
    }

    /// Whether the ticket at `index` is a winning position.
    #[must_use]
    pub fn is_winning_index(&self, index: usize) -> bool {
        index < self.supply
    }

    /// Settle `indices` for `participant`.
    ///
    /// # Errors
    /// - `TicketOutOfRange`, `TicketAlreadyClaimed`, `NotTicketOwner` from validation
    /// - `InvalidAmount` if the refund total overflows
    /// - `IssuanceFailed` / `TransferFailed` from the sink (everything rolled back)
    /// - `ConservationViolation` if the projected totals break an invariant
    pub fn claim<S: SettlementSink>(
        &mut self,
        ledger: &mut EntryLedger,
        participant: ParticipantId,
        indices: &[usize],
        sink: &mut S,
    ) -> Result<ClaimOutcome> {
        // 1. Validate
        let mut seen = HashSet::with_capacity(indices.len());
        for &index in indices {
            ledger.check_claimable(index, participant)?;
            if !seen.insert(index) {
                return Err(FairdrawError::TicketAlreadyClaimed(index));
            }
        }

        // 2. Plan
        let mut minted = Vec::new();
        let mut refunded = Vec::new();
        for &index in indices {
            if self.is_winning_index(index) {
                let item = ItemId::after(self.settled + minted.len() as u64);
                minted.push((index, item));
            } else {
                refunded.push(index);
            }
        }
        let refund = self
            .unit_price
            .checked_mul(Decimal::from(refunded.len()))
            .ok_or_else(|| FairdrawError::InvalidAmount {
                reason: format!("refund {} × {} overflows", self.unit_price, refunded.len()),
            })?;

        // 3. Projected conservation
        let mut projected = self.conservation.clone();
        projected.record_claim(
            indices.len() as u64,
            minted.len() as u64,
            refunded.len() as u64,
            refund,
        );
        projected.verify(self.supply as u64, self.unit_price)?;

        // 4. Execute atomically
        sink.begin();
        if let Err(err) = Self::execute(sink, participant, &minted, refund) {
            sink.rollback();
            tracing::warn!(
                participant = %participant,
                tickets = indices.len(),
                error = %err,
                "Claim rolled back"
            );
            return Err(err);
        }
        sink.commit();

        // 5. Commit local state
        for &index in indices {
            ledger.mark_claimed(index)?;
        }
        self.settled += minted.len() as u64;
        self.conservation = projected;

        tracing::info!(
            participant = %participant,
            minted = minted.len(),
            refunded = refunded.len(),
            %refund,
            settled = self.settled,
            "Tickets claimed"
        );

        Ok(ClaimOutcome {
            participant,
            minted,
            refunded,
            refund,
        })
    }

    fn execute<S: SettlementSink>(
        sink: &mut S,
        participant: ParticipantId,
        minted: &[(usize, ItemId)],
        refund: Decimal,
    ) -> Result<()> {
        for &(_, item) in minted {
            sink.issue_item(participant, item)?;
        }
        if refund > Decimal::ZERO {
            sink.transfer_value(participant, refund)?;
        }
        Ok(())
    }
}
