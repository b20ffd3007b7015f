//! Audit hash over the finalized winner ordering.
//!
//! Anyone holding the starting ledger and the selection entropy can rerun
//! the shuffle, in any batch split, and compare roots. The root commits
//! to the owners of positions `0..available_supply` in order.

use fairdraw_types::{ParticipantId, constants};
use sha2::{Digest, Sha256};

/// Compute the ordering root over the winning prefix.
#[must_use]
pub fn compute_ordering_root(winners: &[ParticipantId]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(constants::ORDERING_ROOT_DOMAIN);
    hasher.update((winners.len() as u64).to_le_bytes());

    for owner in winners {
        hasher.update(owner.as_bytes());
    }

    let result = hasher.finalize();
    let mut root = [0u8; 32];
    root.copy_from_slice(&result);
    root
}

/// Recompute and compare against an expected root.
#[must_use]
pub fn verify_ordering_root(winners: &[ParticipantId], expected_root: &[u8; 32]) -> bool {
    compute_ordering_root(winners) == *expected_root
}
