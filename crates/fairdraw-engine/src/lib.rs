//! # fairdraw-engine
//!
//! The allocation state machine for a fixed-supply draw. It glues the
//! entry ledger, deferred shuffle, claim settlement and batched reveal
//! behind one transaction boundary.
//!
//! ## Lifecycle
//!
//! ```text
//! enter* ─▶ [window closes] ─▶ provide_selection_entropy ─▶ delivery
//!        ─▶ advance_shuffle* ─▶ claim* ─▶ request_reveal ─▶ delivery ─▶ …
//! ```
//!
//! Randomness is requested from a [`RandomnessProvider`] and delivered
//! later as a [`Fulfillment`](fairdraw_types::Fulfillment); the
//! [`RandomnessRouter`] routes each delivery by its request id.

pub mod engine;
pub mod randomness;
pub mod telemetry;

pub use engine::AllocationEngine;
pub use randomness::{RandomnessProvider, RandomnessRouter, RecordingProvider};
pub use telemetry::LogFormat;
