//! Randomness provider interface and request routing.
//!
//! Requests are accepted synchronously by a [`RandomnessProvider`] and
//! fulfilled later through a separate call carrying the request id. The
//! [`RandomnessRouter`] remembers the purpose of every outstanding request
//! and routes each delivery by id alone:
//!
//! ```text
//! issue(purpose) ──▶ provider.request_random(req)      (sync accept)
//!        ⋮
//! deliver(fulfillment) ──▶ lookup(req.id) ──▶ purpose ──▶ selection | reveal
//! ```
//!
//! At most one request per purpose is outstanding. A request that is
//! never fulfilled blocks its purpose indefinitely; there is no timeout
//! or cancellation path.

use std::collections::HashMap;

use ed25519_dalek::VerifyingKey;
use fairdraw_types::{
    FairdrawError, Fulfillment, RandomnessPurpose, RandomnessRequest, RequestId, Result,
};
use rust_decimal::Decimal;

/// External collaborator that produces unpredictable values.
pub trait RandomnessProvider {
    /// Accept a request for later fulfillment.
    ///
    /// # Errors
    /// Implementations return `ProviderRejected` when they refuse the request.
    fn request_random(&mut self, request: &RandomnessRequest) -> Result<()>;
}

/// In-memory provider that records every accepted request.
///
/// The holder fulfills requests by building [`Fulfillment`]s for the
/// recorded ids and feeding them back into the engine.
#[derive(Debug, Default)]
pub struct RecordingProvider {
    requests: Vec<RandomnessRequest>,
    rejecting: bool,
}

impl RecordingProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse (or accept again) subsequent requests.
    pub fn set_rejecting(&mut self, rejecting: bool) {
        self.rejecting = rejecting;
    }

    #[must_use]
    pub fn requests(&self) -> &[RandomnessRequest] {
        &self.requests
    }

    #[must_use]
    pub fn last(&self) -> Option<&RandomnessRequest> {
        self.requests.last()
    }
}

impl RandomnessProvider for RecordingProvider {
    fn request_random(&mut self, request: &RandomnessRequest) -> Result<()> {
        if self.rejecting {
            return Err(FairdrawError::ProviderRejected {
                reason: format!("provider offline for {}", request.id),
            });
        }
        self.requests.push(request.clone());
        Ok(())
    }
}

/// Tracks outstanding requests and validates deliveries.
#[derive(Debug)]
pub struct RandomnessRouter {
    outstanding: HashMap<RequestId, RandomnessRequest>,
    /// Sequence number for the next request.
    next_sequence: u64,
    /// Fees paid across all accepted requests.
    fees_paid: Decimal,
    /// Oracle key; when set, every fulfillment must carry a valid proof.
    oracle: Option<VerifyingKey>,
}

impl RandomnessRouter {
    #[must_use]
    pub fn new(oracle: Option<VerifyingKey>) -> Self {
        Self {
            outstanding: HashMap::new(),
            next_sequence: 0,
            fees_paid: Decimal::ZERO,
            oracle,
        }
    }

    /// The outstanding request for `purpose`, if any.
    #[must_use]
    pub fn outstanding_for(&self, purpose: RandomnessPurpose) -> Option<&RandomnessRequest> {
        self.outstanding.values().find(|r| r.purpose == purpose)
    }

    #[must_use]
    pub fn outstanding_count(&self) -> usize {
        self.outstanding.len()
    }

    #[must_use]
    pub fn fees_paid(&self) -> Decimal {
        self.fees_paid
    }

    /// Check that a request for `purpose` may be issued.
    pub fn check_issue(&self, purpose: RandomnessPurpose) -> Result<()> {
        if self.outstanding_for(purpose).is_some() {
            return Err(FairdrawError::RequestAlreadyOutstanding(purpose));
        }
        Ok(())
    }

    /// Build a request, hand it to `provider`, and track it once accepted.
    ///
    /// Nothing is recorded if the provider refuses.
    pub fn issue<P: RandomnessProvider>(
        &mut self,
        purpose: RandomnessPurpose,
        fee: Decimal,
        provider: &mut P,
    ) -> Result<RandomnessRequest> {
        self.check_issue(purpose)?;
        let fees_paid = self
            .fees_paid
            .checked_add(fee)
            .ok_or_else(|| FairdrawError::InvalidAmount {
                reason: format!("fee total {} + {fee} overflows", self.fees_paid),
            })?;
        let request = RandomnessRequest::new(purpose, self.next_sequence, fee);
        provider.request_random(&request)?;

        self.next_sequence += 1;
        self.fees_paid = fees_paid;
        self.outstanding.insert(request.id, request.clone());
        tracing::info!(
            request_id = %request.id,
            purpose = %purpose,
            %fee,
            "Randomness requested"
        );
        Ok(request)
    }

    /// Resolve the purpose of a delivery without consuming it.
    ///
    /// # Errors
    /// - `UnknownRequest` if the id is not outstanding (never issued or
    ///   already fulfilled)
    /// - `InvalidRandomnessProof` if an oracle key is set and the proof fails
    pub fn check_fulfillment(&self, fulfillment: &Fulfillment) -> Result<RandomnessPurpose> {
        let request = self
            .outstanding
            .get(&fulfillment.request_id)
            .ok_or(FairdrawError::UnknownRequest(fulfillment.request_id))?;
        if let Some(key) = &self.oracle {
            fulfillment.verify(key)?;
        }
        Ok(request.purpose)
    }

    /// Retire a fulfilled request.
    pub fn complete(&mut self, request_id: RequestId) -> Result<RandomnessRequest> {
        self.outstanding
            .remove(&request_id)
            .ok_or(FairdrawError::UnknownRequest(request_id))
    }
}
