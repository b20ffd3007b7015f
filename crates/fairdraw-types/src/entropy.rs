//! Unpredictable values delivered by the randomness provider.
//!
//! An [`Entropy`] is treated as a 256-bit unsigned big-endian integer.
//! Selection reduces it modulo the number of remaining candidates at
//! every shuffle step; reveal embeds it unchanged in item content.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A 256-bit random value, big-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entropy(pub [u8; 32]);

impl Entropy {
    #[must_use]
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Embed a small value in the low-order bytes.
    #[must_use]
    pub fn from_u64(value: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&value.to_be_bytes());
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Exact `self mod modulus` over the full 256-bit value.
    ///
    /// # Panics
    /// Panics if `modulus` is zero.
    #[must_use]
    pub fn modulo(&self, modulus: usize) -> usize {
        assert!(modulus > 0, "Entropy modulus must be > 0");
        let m = modulus as u128;
        // rem < m <= 2^64, so (rem << 8) stays below 2^72.
        let rem = self
            .0
            .iter()
            .fold(0u128, |rem, &byte| ((rem << 8) | u128::from(byte)) % m);
        usize::try_from(rem).expect("remainder is below a usize modulus")
    }

    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Entropy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Entropy {
    pub fn random() -> Self {
        Self(rand::random::<[u8; 32]>())
    }
}
