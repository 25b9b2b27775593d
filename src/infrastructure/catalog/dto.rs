//! Wire DTOs for the catalog REST surface.
//!
//! Field names mirror the server's JSON; docs live on the domain entities
//! these convert into.
#![allow(missing_docs)]

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::domain::entities::{
    DeleteReceipt, ImageHit, ImageId, ImageMeta, ImagePage, UploadReceipt, UserProfile, UserRole,
};

/// Handles timestamps that arrive either as RFC 3339 or as naive ISO
/// values without an offset; naive values are taken as UTC.
pub mod flexible_timestamp {
    use chrono::NaiveDateTime;
    use serde::Deserializer;

    use super::{DateTime, Deserialize, Utc};

    /// Deserializes a `DateTime<Utc>` from either timestamp form.
    ///
    /// # Errors
    /// Returns an error when the value matches neither form.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .or_else(|_| {
                NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
                    .map(|naive| naive.and_utc())
            })
            .map_err(serde::de::Error::custom)
    }
}

/// One image record as served by list, search, and similar responses.
#[derive(Debug, Deserialize)]
pub struct ImageMetaDto {
    pub id: String,
    pub name: String,
    pub path: String,
    pub thumb: Option<String>,
    #[serde(with = "flexible_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "flexible_timestamp")]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub uploaded_by: Option<String>,
    /// Present on search and similar responses only.
    #[serde(default)]
    pub similarity: Option<f64>,
}

impl ImageMetaDto {
    /// Converts into the domain entity, dropping the similarity score.
    #[must_use]
    pub fn into_meta(self) -> ImageMeta {
        ImageMeta {
            id: ImageId::new(self.id),
            name: self.name,
            path: self.path,
            thumb: self.thumb,
            created_at: self.created_at,
            updated_at: self.updated_at,
            tags: self.tags,
            uploaded_by: self.uploaded_by,
        }
    }

    /// Converts into a result row, keeping the similarity score.
    #[must_use]
    pub fn into_hit(self) -> ImageHit {
        let similarity = self.similarity;
        ImageHit { meta: self.into_meta(), similarity }
    }
}

/// One page of list, search, or similar results.
#[derive(Debug, Deserialize)]
pub struct PageDto {
    pub page: u32,
    pub page_size: u16,
    pub count: u64,
    pub items: Vec<ImageMetaDto>,
}

impl From<PageDto> for ImagePage {
    fn from(dto: PageDto) -> Self {
        Self {
            page: dto.page,
            page_size: dto.page_size,
            count: dto.count,
            items: dto.items.into_iter().map(ImageMetaDto::into_hit).collect(),
        }
    }
}

/// Acknowledgement of a completed upload.
#[derive(Debug, Deserialize)]
pub struct UploadReceiptDto {
    pub image_id: String,
    pub path: String,
}

impl From<UploadReceiptDto> for UploadReceipt {
    fn from(dto: UploadReceiptDto) -> Self {
        Self {
            image_id: ImageId::new(dto.image_id),
            path: dto.path,
        }
    }
}

/// Acknowledgement of a deletion.
#[derive(Debug, Deserialize)]
pub struct DeleteReceiptDto {
    pub message: String,
}

impl From<DeleteReceiptDto> for DeleteReceipt {
    fn from(dto: DeleteReceiptDto) -> Self {
        Self { message: dto.message }
    }
}

/// The signed-in user as served by `/auth/me`.
#[derive(Debug, Deserialize)]
pub struct UserDto {
    pub id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub provider: String,
    pub role: String,
}

impl From<UserDto> for UserProfile {
    fn from(dto: UserDto) -> Self {
        Self {
            id: dto.id,
            email: dto.email,
            name: dto.name,
            avatar_url: dto.avatar_url,
            provider: dto.provider,
            role: UserRole::parse(&dto.role),
        }
    }
}

/// Error envelope: `detail` is either a message or a list of field errors.
#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub detail: Detail,
}

/// The two shapes `detail` can take.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Detail {
    /// A plain message.
    Message(String),
    /// Per-field validation errors.
    Fields(Vec<FieldDetail>),
}

/// One field error; extra members like `loc` are ignored.
#[derive(Debug, Deserialize)]
pub struct FieldDetail {
    pub msg: String,
}

impl ErrorEnvelope {
    /// The message to surface: the string itself, or the first field
    /// error's message.
    #[must_use]
    pub fn message(&self) -> String {
        match &self.detail {
            Detail::Message(message) => message.clone(),
            Detail::Fields(fields) => fields
                .first()
                .map_or_else(|| "request failed".to_owned(), |f| f.msg.clone()),
        }
    }

    /// Whether the envelope carries field-level validation errors.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self.detail, Detail::Fields(_))
    }
}
