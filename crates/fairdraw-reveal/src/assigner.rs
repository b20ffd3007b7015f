//! Batched metadata assignment.
//!
//! Each applied reveal value covers every item minted since the previous
//! reveal:
//!
//! ```text
//! range    = [watermark + 1, settled + 1)
//! watermark := settled
//! ```
//!
//! Ranges are append-only and contiguous, so together they always cover
//! exactly `[1, watermark]`, and `watermark <= settled` holds because
//! `settled` never decreases.

use fairdraw_types::{Entropy, FairdrawError, ItemId, ItemMetadata, MetadataRange, Result};

/// Append-only list of revealed ranges plus the revealed watermark.
#[derive(Debug, Clone, Default)]
pub struct MetadataAssigner {
    ranges: Vec<MetadataRange>,
    /// Highest item id covered by a range (0 before the first reveal).
    watermark: u64,
}

impl MetadataAssigner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn watermark(&self) -> u64 {
        self.watermark
    }

    #[must_use]
    pub fn ranges(&self) -> &[MetadataRange] {
        &self.ranges
    }

    /// Check that minted items exist beyond the watermark.
    ///
    /// # Errors
    /// Returns `NothingToReveal` if `settled <= watermark`.
    pub fn check_reveal(&self, settled: u64) -> Result<()> {
        if settled > self.watermark {
            Ok(())
        } else {
            Err(FairdrawError::NothingToReveal {
                settled,
                revealed: self.watermark,
            })
        }
    }

    /// Cover items `watermark + 1 ..= settled` with `entropy`.
    pub fn apply(&mut self, entropy: Entropy, settled: u64) -> Result<MetadataRange> {
        self.check_reveal(settled)?;
        let range = MetadataRange {
            start: self.watermark + 1,
            end: settled + 1,
            entropy,
        };
        self.ranges.push(range);
        self.watermark = settled;
        tracing::info!(
            start = range.start,
            end = range.end,
            items = range.len(),
            watermark = self.watermark,
            "Metadata range revealed"
        );
        Ok(range)
    }

    /// Look up the range holding `item`. Read-only; safe to repeat.
    #[must_use]
    pub fn query(&self, item: ItemId) -> ItemMetadata {
        // Ranges are sorted and contiguous: first range ending past `item`.
        let idx = self.ranges.partition_point(|r| r.end <= item.0);
        match self.ranges.get(idx) {
            Some(range) if range.contains(item) => ItemMetadata::Revealed {
                range_index: idx,
                entropy: range.entropy,
            },
            _ => ItemMetadata::Unrevealed,
        }
    }

    /// Whether ranges cover exactly `[1, watermark]` without gaps or overlap.
    #[must_use]
    pub fn is_contiguous(&self) -> bool {
        let mut next = 1;
        for range in &self.ranges {
            if range.start != next || range.is_empty() {
                return false;
            }
            next = range.end;
        }
        next == self.watermark + 1
    }
}
