//! Configuration for one allocation draw.

use std::path::Path;

use chrono::{DateTime, Utc};
use ed25519_dalek::VerifyingKey;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_MAX_PER_PARTICIPANT, DEFAULT_SHUFFLE_BATCH};
use crate::{FairdrawError, ParticipantId, Result};

fn default_max_per_participant() -> usize {
    DEFAULT_MAX_PER_PARTICIPANT
}

fn default_shuffle_batch() -> usize {
    DEFAULT_SHUFFLE_BATCH
}

/// Parameters fixed when a draw is created.
///
/// Only `randomness_fee` may change afterwards (owner-gated).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawConfig {
    /// Participant allowed to withdraw proceeds and adjust the fee.
    pub owner: ParticipantId,
    /// First instant entries are accepted (inclusive).
    pub start: DateTime<Utc>,
    /// Last instant entries are accepted (inclusive).
    pub end: DateTime<Utc>,
    /// Price of one ticket.
    pub unit_price: Decimal,
    /// Maximum tickets any one participant may hold.
    #[serde(default = "default_max_per_participant")]
    pub max_per_participant: usize,
    /// Maximum number of items that can ever be issued.
    pub available_supply: usize,
    /// Fee paid to the randomness provider per request.
    pub randomness_fee: Decimal,
    /// Steps applied by one `advance_shuffle_step` call.
    #[serde(default = "default_shuffle_batch")]
    pub shuffle_batch: usize,
    /// Hex-encoded ed25519 public key of the randomness oracle.
    /// Without it, fulfillments are accepted unsigned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oracle_key: Option<String>,
}

impl DrawConfig {
    /// Check internal consistency.
    ///
    /// # Errors
    /// Returns [`FairdrawError::Configuration`] naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        if self.end < self.start {
            return Err(FairdrawError::Configuration(format!(
                "window end {} precedes start {}",
                self.end, self.start
            )));
        }
        if self.available_supply == 0 {
            return Err(FairdrawError::Configuration(
                "available_supply must be > 0".to_string(),
            ));
        }
        if self.max_per_participant == 0 {
            return Err(FairdrawError::Configuration(
                "max_per_participant must be > 0".to_string(),
            ));
        }
        if self.unit_price <= Decimal::ZERO {
            return Err(FairdrawError::Configuration(format!(
                "unit_price must be positive, got {}",
                self.unit_price
            )));
        }
        let largest_lot = self.max_per_participant.max(self.available_supply);
        if self.unit_price.checked_mul(Decimal::from(largest_lot)).is_none() {
            return Err(FairdrawError::Configuration(format!(
                "unit_price {} × {largest_lot} overflows",
                self.unit_price
            )));
        }
        if self.shuffle_batch == 0 {
            return Err(FairdrawError::Configuration(
                "shuffle_batch must be > 0".to_string(),
            ));
        }
        if self.randomness_fee.is_sign_negative() {
            return Err(FairdrawError::Configuration(format!(
                "randomness_fee must not be negative, got {}",
                self.randomness_fee
            )));
        }
        self.oracle_verifying_key()?;
        Ok(())
    }

    /// Decode the configured oracle key, if any.
    ///
    /// # Errors
    /// Returns [`FairdrawError::Configuration`] if the key is not 32 bytes
    /// of hex or not a valid curve point.
    pub fn oracle_verifying_key(&self) -> Result<Option<VerifyingKey>> {
        let Some(encoded) = &self.oracle_key else {
            return Ok(None);
        };
        let bytes = hex::decode(encoded)
            .map_err(|e| FairdrawError::Configuration(format!("oracle_key is not hex: {e}")))?;
        let bytes: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| {
            FairdrawError::Configuration(format!("oracle_key must be 32 bytes, got {}", b.len()))
        })?;
        VerifyingKey::from_bytes(&bytes)
            .map(Some)
            .map_err(|e| FairdrawError::Configuration(format!("oracle_key rejected: {e}")))
    }

    /// Proceeds owed to the owner once the window closes:
    /// `unit_price × min(total_entries, available_supply)`.
    ///
    /// # Errors
    /// `InvalidAmount` if the product overflows.
    pub fn proceeds_for(&self, total_entries: usize) -> Result<Decimal> {
        let sold = total_entries.min(self.available_supply);
        self.unit_price
            .checked_mul(Decimal::from(sold))
            .ok_or_else(|| FairdrawError::InvalidAmount {
                reason: format!("proceeds {} × {sold} overflow", self.unit_price),
            })
    }

    /// Parse and validate a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl DrawConfig {
    /// Window start used by [`DrawConfig::dummy`]: 2026-01-01T00:00:00Z.
    pub fn dummy_start() -> DateTime<Utc> {
        DateTime::from_timestamp(1_767_225_600, 0).expect("valid timestamp")
    }

    /// Window end used by [`DrawConfig::dummy`]: one day after start.
    pub fn dummy_end() -> DateTime<Utc> {
        Self::dummy_start() + chrono::Duration::days(1)
    }

    /// A valid config with unit price 1, fee 0, no oracle key.
    pub fn dummy(available_supply: usize, max_per_participant: usize) -> Self {
        Self {
            owner: ParticipantId::from_bytes([0xAA; 16]),
            start: Self::dummy_start(),
            end: Self::dummy_end(),
            unit_price: Decimal::ONE,
            max_per_participant,
            available_supply,
            randomness_fee: Decimal::ZERO,
            shuffle_batch: DEFAULT_SHUFFLE_BATCH,
            oracle_key: None,
        }
    }
}
