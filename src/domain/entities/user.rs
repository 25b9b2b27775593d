//! Authenticated user entities.

use super::ImageMeta;

/// Access level granted to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UserRole {
    /// Browse and search only.
    #[default]
    Read,
    /// May upload and edit own images.
    Write,
    /// May edit and delete any image.
    Admin,
}

impl UserRole {
    /// Parses the wire representation, defaulting to read-only on
    /// unrecognized values.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "WRITE" => Self::Write,
            "ADMIN" => Self::Admin,
            _ => Self::Read,
        }
    }
}

/// Profile of the signed-in user as reported by `/auth/me`.
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    /// Stable user id.
    pub id: String,
    /// Email, when the OAuth provider shares it.
    pub email: Option<String>,
    /// Display name, when the OAuth provider shares it.
    pub name: Option<String>,
    /// Avatar URL.
    pub avatar_url: Option<String>,
    /// OAuth provider that authenticated this session.
    pub provider: String,
    /// Access level.
    pub role: UserRole,
}

impl UserProfile {
    /// Best available human-readable name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or(&self.id)
    }

    /// Whether this user may edit or delete the given image.
    #[must_use]
    pub fn can_modify(&self, image: &ImageMeta) -> bool {
        self.role == UserRole::Admin
            || image.uploaded_by.as_deref() == Some(self.id.as_str())
    }
}
