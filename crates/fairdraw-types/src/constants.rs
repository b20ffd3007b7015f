//! System-wide constants for the fairdraw allocation engine.

/// Default per-participant ticket cap.
pub const DEFAULT_MAX_PER_PARTICIPANT: usize = 10;

/// Default shuffle batch size used by operators driving selection in steps.
pub const DEFAULT_SHUFFLE_BATCH: usize = 500;

/// Marker embedded in item content before its range is revealed.
pub const NOT_REVEALED_MARKER: &str = "unrevealed";

/// Collection name used when rendering item content.
pub const COLLECTION_NAME: &str = "Fairdraw Item";

/// Domain separator for randomness request ids.
pub const REQUEST_ID_DOMAIN: &[u8] = b"fairdraw:request_id:v1:";

/// Domain separator for oracle fulfillment signatures.
pub const FULFILLMENT_DOMAIN: &[u8] = b"fairdraw:fulfillment:v1:";

/// Domain separator for the winner ordering root.
pub const ORDERING_ROOT_DOMAIN: &[u8] = b"fairdraw:ordering_root:v1:";

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "fairdraw";
