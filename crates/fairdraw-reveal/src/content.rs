//! Item content rendering.
//!
//! Produces the JSON document served for an item: revealed items embed
//! their range entropy as a hex seed, unrevealed items embed the fixed
//! placeholder marker.

use fairdraw_types::{ItemId, ItemMetadata, Result, constants};
use serde::{Deserialize, Serialize};

/// Rendered content for one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemContent {
    pub name: String,
    pub item_id: u64,
    pub revealed: bool,
    /// Hex entropy, or [`constants::NOT_REVEALED_MARKER`].
    pub seed: String,
}

impl ItemContent {
    #[must_use]
    pub fn new(item: ItemId, metadata: &ItemMetadata) -> Self {
        let (revealed, seed) = match metadata {
            ItemMetadata::Revealed { entropy, .. } => (true, entropy.to_hex()),
            ItemMetadata::Unrevealed => (false, constants::NOT_REVEALED_MARKER.to_string()),
        };
        Self {
            name: format!("{} #{}", constants::COLLECTION_NAME, item.0),
            item_id: item.0,
            revealed,
            seed,
        }
    }
}

/// Render the JSON content for `item`.
pub fn render_content(item: ItemId, metadata: &ItemMetadata) -> Result<String> {
    Ok(serde_json::to_string(&ItemContent::new(item, metadata))?)
}

#[cfg(test)]
mod tests {
    use fairdraw_types::Entropy;

    use super::*;

    #[test]
    fn unrevealed_uses_marker() {
        let json = render_content(ItemId(4), &ItemMetadata::Unrevealed).unwrap();
        let content: ItemContent = serde_json::from_str(&json).unwrap();
        assert!(!content.revealed);
        assert_eq!(content.seed, "unrevealed");
        assert_eq!(content.name, "Fairdraw Item #4");
    }

    #[test]
    fn revealed_embeds_entropy() {
        let meta = ItemMetadata::Revealed {
            range_index: 0,
            entropy: Entropy::from_u64(0xBEEF),
        };
        let json = render_content(ItemId(1), &meta).unwrap();
        let content: ItemContent = serde_json::from_str(&json).unwrap();
        assert!(content.revealed);
        assert!(content.seed.ends_with("beef"));
        assert_eq!(content.item_id, 1);
    }
}
