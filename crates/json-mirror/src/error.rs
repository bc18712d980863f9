//! Boundary errors.
//!
//! The change-detection and reconciliation core itself has no fatal
//! conditions: every comparison and mutation path is total over JSON-shaped
//! values. Errors exist only at the boundary where text enters or leaves the
//! document, or where a non-mapping is offered as a root.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocumentError {
    /// Malformed candidate text, surfaced to the reload collaborator.
    #[error("PARSE: {0}")]
    Parse(#[source] serde_json::Error),
    /// The backing root could not be serialized.
    #[error("SERIALIZE: {0}")]
    Serialize(#[source] serde_json::Error),
    /// A document root must be a mapping.
    #[error("NOT_A_MAPPING")]
    NotAMapping,
}
