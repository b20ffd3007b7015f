//! Settlement conservation invariant checker.
//!
//! Invariants enforced after every claim:
//! ```text
//! minted + refunded == claimed
//! minted            <= available_supply
//! refund_value      == refunded × unit_price
//! refund_value + proceeds_withdrawn <= total_paid
//! ```
//!
//! A violation means settlement logic is broken; the enclosing operation
//! aborts with [`FairdrawError::ConservationViolation`].

use fairdraw_types::{FairdrawError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Running settlement totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementConservation {
    /// Distinct tickets settled.
    claimed: u64,
    /// Tickets that produced an item.
    minted: u64,
    /// Tickets that produced a refund.
    refunded: u64,
    /// Value paid back to losing tickets.
    refund_value: Decimal,
}

impl SettlementConservation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one claim's outcome.
    pub fn record_claim(&mut self, claimed: u64, minted: u64, refunded: u64, refund_value: Decimal) {
        self.claimed += claimed;
        self.minted += minted;
        self.refunded += refunded;
        self.refund_value += refund_value;
    }

    #[must_use]
    pub fn claimed(&self) -> u64 {
        self.claimed
    }

    #[must_use]
    pub fn minted(&self) -> u64 {
        self.minted
    }

    #[must_use]
    pub fn refunded(&self) -> u64 {
        self.refunded
    }

    #[must_use]
    pub fn refund_value(&self) -> Decimal {
        self.refund_value
    }

    /// Verify ticket-level conservation.
    ///
    /// # Errors
    /// Returns [`FairdrawError::ConservationViolation`] naming the broken law.
    pub fn verify(&self, supply: u64, unit_price: Decimal) -> Result<()> {
        if self.minted + self.refunded != self.claimed {
            return Err(FairdrawError::ConservationViolation {
                reason: format!(
                    "minted {} + refunded {} != claimed {}",
                    self.minted, self.refunded, self.claimed
                ),
            });
        }
        if self.minted > supply {
            return Err(FairdrawError::ConservationViolation {
                reason: format!("minted {} exceeds supply {supply}", self.minted),
            });
        }
        let expected = unit_price.checked_mul(Decimal::from(self.refunded));
        if expected != Some(self.refund_value) {
            return Err(FairdrawError::ConservationViolation {
                reason: format!(
                    "refund value {} != refunded {} × price {unit_price}",
                    self.refund_value, self.refunded
                ),
            });
        }
        Ok(())
    }

    /// Verify that outflows never exceed what was paid in.
    pub fn verify_funds(&self, total_paid: Decimal, proceeds_withdrawn: Decimal) -> Result<()> {
        let outflow = self.refund_value.checked_add(proceeds_withdrawn);
        if outflow.is_none_or(|out| out > total_paid) {
            return Err(FairdrawError::ConservationViolation {
                reason: format!(
                    "outflow (refunds {} + proceeds {proceeds_withdrawn}) exceeds paid {total_paid}",
                    self.refund_value
                ),
            });
        }
        Ok(())
    }
}
