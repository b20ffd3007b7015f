//! Tagged randomness requests and fulfillments.
//!
//! Every request carries its [`RandomnessPurpose`], and every fulfillment
//! names the request it answers. Deliveries are routed by request id, so
//! a selection value can never be consumed as reveal entropy (or the
//! reverse) no matter how deliveries interleave.
//!
//! When an oracle key is configured, fulfillments must carry an ed25519
//! signature over `FULFILLMENT_DOMAIN || request_id || value`.

use std::fmt;

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Entropy, FairdrawError, RequestId, Result, constants};

/// What a randomness request is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RandomnessPurpose {
    /// The single value that drives winner selection.
    Selection,
    /// One value per metadata reveal batch.
    Reveal,
}

impl RandomnessPurpose {
    /// Byte tag mixed into request ids.
    #[must_use]
    pub fn tag(self) -> u8 {
        match self {
            Self::Selection => 0,
            Self::Reveal => 1,
        }
    }
}

impl fmt::Display for RandomnessPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Selection => write!(f, "SELECTION"),
            Self::Reveal => write!(f, "REVEAL"),
        }
    }
}

/// An outbound request for one random value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomnessRequest {
    pub id: RequestId,
    pub purpose: RandomnessPurpose,
    /// Position in the draw's request sequence (0-based).
    pub sequence: u64,
    /// Fee paid to the provider for this request.
    pub fee: Decimal,
}

impl RandomnessRequest {
    #[must_use]
    pub fn new(purpose: RandomnessPurpose, sequence: u64, fee: Decimal) -> Self {
        Self {
            id: RequestId::deterministic(purpose.tag(), sequence),
            purpose,
            sequence,
            fee,
        }
    }
}

/// An inbound random value answering one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fulfillment {
    pub request_id: RequestId,
    pub value: Entropy,
    /// Oracle signature; empty when the draw runs without an oracle key.
    pub proof: Vec<u8>,
}

impl Fulfillment {
    /// An unsigned fulfillment.
    #[must_use]
    pub fn unsigned(request_id: RequestId, value: Entropy) -> Self {
        Self {
            request_id,
            value,
            proof: Vec::new(),
        }
    }

    /// A fulfillment signed by the oracle key.
    #[must_use]
    pub fn signed(request_id: RequestId, value: Entropy, key: &SigningKey) -> Self {
        let message = Self::signing_bytes_for(&request_id, &value);
        let signature = key.sign(&message);
        Self {
            request_id,
            value,
            proof: signature.to_bytes().to_vec(),
        }
    }

    /// Bytes covered by the oracle signature.
    #[must_use]
    pub fn signing_bytes(&self) -> Vec<u8> {
        Self::signing_bytes_for(&self.request_id, &self.value)
    }

    fn signing_bytes_for(request_id: &RequestId, value: &Entropy) -> Vec<u8> {
        let mut message = Vec::with_capacity(constants::FULFILLMENT_DOMAIN.len() + 16 + 32);
        message.extend_from_slice(constants::FULFILLMENT_DOMAIN);
        message.extend_from_slice(request_id.as_bytes());
        message.extend_from_slice(value.as_bytes());
        message
    }

    /// Verify the oracle signature.
    ///
    /// # Errors
    /// Returns [`FairdrawError::InvalidRandomnessProof`] if the proof is
    /// malformed or does not verify under `key`.
    pub fn verify(&self, key: &VerifyingKey) -> Result<()> {
        let signature = Signature::from_slice(&self.proof).map_err(|e| {
            FairdrawError::InvalidRandomnessProof {
                reason: format!("malformed signature: {e}"),
            }
        })?;
        key.verify(&self.signing_bytes(), &signature)
            .map_err(|e| FairdrawError::InvalidRandomnessProof {
                reason: format!("signature mismatch for {}: {e}", self.request_id),
            })
    }
}
