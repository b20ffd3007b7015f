//! Write-once proceeds withdrawal.
//!
//! After the window closes the owner may collect
//! `unit_price × min(total_entries, available_supply)` exactly once.
//! Refund value for losing tickets stays behind for claimants.

use fairdraw_types::{FairdrawError, ParticipantId, Result};
use rust_decimal::Decimal;

use crate::sink::SettlementSink;

/// Tracks whether sale proceeds have left the pool.
#[derive(Debug, Clone, Default)]
pub struct ProceedsVault {
    /// Write-once flag.
    withdrawn: bool,
    /// Amount paid out (zero until withdrawn).
    amount: Decimal,
}

impl ProceedsVault {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_withdrawn(&self) -> bool {
        self.withdrawn
    }

    /// Amount withdrawn so far.
    #[must_use]
    pub fn withdrawn_amount(&self) -> Decimal {
        self.amount
    }

    /// Guard a withdrawal attempt.
    pub fn check_withdraw(&self) -> Result<()> {
        if self.withdrawn {
            Err(FairdrawError::ProceedsAlreadyWithdrawn)
        } else {
            Ok(())
        }
    }

    /// Transfer `amount` to `owner` through `sink`, once.
    ///
    /// # Errors
    /// - `ProceedsAlreadyWithdrawn` on a second attempt
    /// - the sink's transfer error, in which case the flag stays clear
    pub fn withdraw<S: SettlementSink>(
        &mut self,
        owner: ParticipantId,
        amount: Decimal,
        sink: &mut S,
    ) -> Result<Decimal> {
        self.check_withdraw()?;

        sink.begin();
        if let Err(err) = sink.transfer_value(owner, amount) {
            sink.rollback();
            tracing::warn!(owner = %owner, %amount, error = %err, "Proceeds transfer failed");
            return Err(err);
        }
        sink.commit();

        self.withdrawn = true;
        self.amount = amount;
        tracing::info!(owner = %owner, %amount, "Proceeds withdrawn");
        Ok(amount)
    }
}
