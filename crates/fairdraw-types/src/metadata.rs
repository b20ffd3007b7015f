//! Metadata ranges assigned by batched reveals.
//!
//! Each reveal covers the items minted since the previous reveal with
//! one entropy value. Ranges are half-open `[start, end)` over item ids,
//! contiguous, and together cover exactly `[1, watermark]`.

use serde::{Deserialize, Serialize};

use crate::{Entropy, ItemId};

/// A contiguous block of items sharing one reveal entropy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRange {
    /// First item id covered (inclusive).
    pub start: u64,
    /// One past the last item id covered (exclusive).
    pub end: u64,
    pub entropy: Entropy,
}

impl MetadataRange {
    #[must_use]
    pub fn contains(&self, item: ItemId) -> bool {
        item.0 >= self.start && item.0 < self.end
    }

    /// Number of items covered.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }
}

/// Result of looking up one item's metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemMetadata {
    /// The item falls in a revealed range.
    Revealed { range_index: usize, entropy: Entropy },
    /// No range covers the item yet.
    Unrevealed,
}

impl ItemMetadata {
    #[must_use]
    pub fn is_revealed(&self) -> bool {
        matches!(self, Self::Revealed { .. })
    }
}
