//! Catalog image entities.

use chrono::{DateTime, Utc};

/// Unique identifier of a catalog image.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageId(pub String);

impl ImageId {
    /// Creates a new `ImageId` from any string-like input.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the inner string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ImageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ImageId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ImageId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Metadata of one catalog image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageMeta {
    /// Catalog identifier.
    pub id: ImageId,
    /// Display name.
    pub name: String,
    /// Storage path on the server.
    pub path: String,
    /// Thumbnail storage path, if one was generated.
    pub thumb: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
    /// Free-form lowercase tags.
    pub tags: Vec<String>,
    /// Id of the uploading user, when known.
    pub uploaded_by: Option<String>,
}

impl ImageMeta {
    /// File extension derived from the storage path, if any.
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        self.path.rsplit_once('.').map(|(_, ext)| ext)
    }
}

/// One result row: image metadata plus the similarity score present on
/// search and similar-lookup responses.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageHit {
    /// The image.
    pub meta: ImageMeta,
    /// Cosine similarity in `[0, 1]`; `None` on plain listings.
    pub similarity: Option<f64>,
}

/// One page of catalog results.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePage {
    /// 1-based page number.
    pub page: u32,
    /// Requested page size.
    pub page_size: u16,
    /// Total matching images on the server.
    pub count: u64,
    /// Rows on this page.
    pub items: Vec<ImageHit>,
}

impl ImagePage {
    /// A full page implies at least one further page may exist.
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.items.len() == usize::from(self.page_size)
    }
}

/// Fields of an image that can be edited in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImagePatch {
    /// New display name, when changed.
    pub name: Option<String>,
    /// Replacement tag set, when changed.
    pub tags: Option<Vec<String>>,
}

impl ImagePatch {
    /// Returns whether the patch changes anything at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.tags.is_none()
    }
}

/// Server acknowledgement of a completed upload.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadReceipt {
    /// Id assigned to the new image.
    pub image_id: ImageId,
    /// Storage path of the new image.
    pub path: String,
}

/// Server acknowledgement of a deletion.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteReceipt {
    /// Human-readable confirmation.
    pub message: String,
}
