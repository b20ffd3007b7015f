//! # fairdraw-types
//!
//! Shared types, errors, and configuration for the **fairdraw** allocation
//! engine.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`ParticipantId`], [`ItemId`], [`RequestId`]
//! - **Randomness**: [`Entropy`], [`RandomnessPurpose`], [`RandomnessRequest`], [`Fulfillment`]
//! - **Selection**: [`SelectionStatus`]
//! - **Metadata**: [`MetadataRange`], [`ItemMetadata`]
//! - **Notifications**: [`DrawEvent`]
//! - **Configuration**: [`DrawConfig`]
//! - **Errors**: [`FairdrawError`] with `FD_ERR_` prefix codes
//! - **Constants**: system-wide defaults and domain separators

pub mod config;
pub mod constants;
pub mod entropy;
pub mod error;
pub mod event;
pub mod ids;
pub mod metadata;
pub mod randomness;
pub mod selection;

// Re-export all primary types at crate root for ergonomic imports:
//   use fairdraw_types::{DrawConfig, Entropy, ParticipantId, ...};

pub use config::*;
pub use entropy::*;
pub use error::*;
pub use event::*;
pub use ids::*;
pub use metadata::*;
pub use randomness::*;
pub use selection::*;

// Constants are accessed via `fairdraw_types::constants::FOO`
// (not re-exported to avoid name collisions).
