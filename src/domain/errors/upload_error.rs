//! Upload queue error types.

use thiserror::Error;

/// Errors raised by the upload queue itself.
///
/// Failures of individual transfers are not represented here; those are
/// recorded on the affected item and never abort the rest of the queue.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The item is currently being transferred and cannot be removed.
    #[error("item is currently uploading")]
    InFlight,

    /// The queue cannot be cleared while a run is active.
    #[error("an upload run is in progress")]
    RunActive,

    /// No item with the given id exists in the queue.
    #[error("unknown upload item")]
    UnknownItem,

    /// The file does not look like an image.
    #[error("not an image file: {name}")]
    NotAnImage { name: String },

    /// Staging the file into the spool failed.
    #[error("failed to stage file: {0}")]
    Stage(#[from] std::io::Error),
}
