//! # fairdraw-reveal
//!
//! **Reveal plane**: assigns randomized attributes to minted items in
//! batches, one entropy value per batch.
//!
//! - [`MetadataAssigner`]: append-only contiguous ranges and the revealed
//!   watermark
//! - [`render_content`]: JSON content with the range seed or the
//!   placeholder marker

pub mod assigner;
pub mod content;

pub use assigner::MetadataAssigner;
pub use content::{ItemContent, render_content};
