//! Upload queue entities.

use std::path::Path;

use tempfile::NamedTempFile;

/// Identifier of one queued upload. Ids are unique per queue instance, so
/// duplicate file names remain distinct items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UploadItemId(pub u64);

impl std::fmt::Display for UploadItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle of one queued upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadStatus {
    /// Waiting for the next run.
    #[default]
    Pending,
    /// Transfer in progress.
    Uploading,
    /// Transfer succeeded.
    Done,
    /// Transfer failed; eligible for the next run.
    Error,
}

impl UploadStatus {
    /// Whether the next run should pick this item up.
    #[must_use]
    pub const fn is_eligible(&self) -> bool {
        matches!(self, Self::Pending | Self::Error)
    }
}

/// The staged copy of a queued file.
///
/// Staging snapshots the bytes at enqueue time; the spool file is the one
/// externally allocated resource per item and is released exactly once, on
/// item removal or queue clear. A second release is a no-op.
#[derive(Debug)]
pub struct SpoolFile {
    file: Option<NamedTempFile>,
}

impl SpoolFile {
    /// Wraps a staged temp file.
    #[must_use]
    pub const fn new(file: NamedTempFile) -> Self {
        Self { file: Some(file) }
    }

    /// Path of the staged copy; `None` once released.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.file.as_ref().map(NamedTempFile::path)
    }

    /// Deletes the staged copy. Returns whether this call performed the
    /// release.
    pub fn release(&mut self) -> bool {
        self.file.take().is_some()
    }

    /// Whether the staged copy has already been released.
    #[must_use]
    pub const fn is_released(&self) -> bool {
        self.file.is_none()
    }
}

/// One entry of the upload queue.
#[derive(Debug)]
pub struct UploadItem {
    /// Queue-unique id.
    pub id: UploadItemId,
    /// Original file name, sent to the server.
    pub file_name: String,
    /// Size of the staged copy in bytes.
    pub size_bytes: u64,
    /// Current lifecycle state.
    pub status: UploadStatus,
    /// Failure message from the last attempt, if any.
    pub error: Option<String>,
    /// Staged bytes to transfer.
    pub spool: SpoolFile,
}

impl UploadItem {
    /// Read-only snapshot for rendering.
    #[must_use]
    pub fn view(&self) -> UploadItemView {
        UploadItemView {
            id: self.id,
            file_name: self.file_name.clone(),
            size_bytes: self.size_bytes,
            status: self.status,
            error: self.error.clone(),
        }
    }
}

/// Cloneable snapshot of an [`UploadItem`] without the spool resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadItemView {
    /// Queue-unique id.
    pub id: UploadItemId,
    /// Original file name.
    pub file_name: String,
    /// Size of the staged copy in bytes.
    pub size_bytes: u64,
    /// Current lifecycle state.
    pub status: UploadStatus,
    /// Failure message from the last attempt, if any.
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spool_release_is_exactly_once() {
        let tmp = NamedTempFile::new().expect("temp file");
        let path = tmp.path().to_path_buf();
        let mut spool = SpoolFile::new(tmp);

        assert!(path.exists());
        assert!(spool.release());
        assert!(!path.exists());

        // Second release must be inert.
        assert!(!spool.release());
        assert!(spool.is_released());
        assert!(spool.path().is_none());
    }

    #[test]
    fn test_eligibility() {
        assert!(UploadStatus::Pending.is_eligible());
        assert!(UploadStatus::Error.is_eligible());
        assert!(!UploadStatus::Uploading.is_eligible());
        assert!(!UploadStatus::Done.is_eligible());
    }
}
