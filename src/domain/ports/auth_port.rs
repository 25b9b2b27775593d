//! Authentication port definition.

use async_trait::async_trait;

use crate::domain::entities::UserProfile;
use crate::domain::errors::ApiError;

/// OAuth providers the catalog service can redirect to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthProvider {
    /// Sign in with Google.
    Google,
    /// Sign in with GitHub.
    Github,
}

impl std::fmt::Display for OAuthProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Google => write!(f, "google"),
            Self::Github => write!(f, "github"),
        }
    }
}

/// Port for session operations against the catalog service.
#[async_trait]
pub trait AuthPort: Send + Sync {
    /// Fetches the signed-in user, or `None` when the session is missing or
    /// expired (a 401 from the server is not an error here).
    async fn current_user(&self) -> Result<Option<UserProfile>, ApiError>;

    /// Invalidates the server-side session.
    async fn logout(&self) -> Result<(), ApiError>;

    /// Browser entry point that starts the OAuth dance for `provider`.
    fn login_url(&self, provider: OAuthProvider) -> String;
}
