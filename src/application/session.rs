//! Session state and the guard protecting authenticated screens.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use super::cache::{CacheReader, CacheStatus, Fetch, RemoteCache};
use crate::domain::entities::UserProfile;
use crate::domain::errors::ApiError;
use crate::domain::ports::AuthPort;

/// Cache key of the single session entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SessionKey;

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "/auth/me")
    }
}

/// The cached session: the signed-in user, or `None`.
pub type SessionCache = RemoteCache<SessionKey, Option<UserProfile>>;

/// Subscription to the session entry.
pub type SessionReader = CacheReader<SessionKey, Option<UserProfile>>;

struct SessionFetcher {
    auth: Arc<dyn AuthPort>,
}

#[async_trait]
impl Fetch<SessionKey, Option<UserProfile>> for SessionFetcher {
    async fn fetch(&self, _key: &SessionKey) -> Result<Option<UserProfile>, ApiError> {
        self.auth.current_user().await
    }
}

/// What a protected screen should do right now.
#[derive(Debug, Clone, PartialEq)]
pub enum Gate {
    /// Session still resolving; withhold content, show a loading indicator.
    Loading,
    /// Signed in; render the protected content.
    Allow(UserProfile),
    /// Not signed in; go to the login entry point.
    Login,
}

/// Gates protected screens on the cached session entry.
///
/// The session lives in the shared cache like any other entry: the first
/// subscriber triggers the `/auth/me` fetch, later subscribers share it.
pub struct SessionGuard {
    auth: Arc<dyn AuthPort>,
    cache: SessionCache,
}

impl SessionGuard {
    /// Creates a guard over the authentication port.
    #[must_use]
    pub fn new(auth: Arc<dyn AuthPort>) -> Self {
        let cache = RemoteCache::new(Arc::new(SessionFetcher { auth: Arc::clone(&auth) }));
        Self { auth, cache }
    }

    /// Subscribes to the session entry, fetching it if needed.
    #[must_use]
    pub fn subscribe(&self) -> SessionReader {
        self.cache.read(&SessionKey)
    }

    /// Maps the session entry state to a gate decision.
    ///
    /// A failed session fetch reads as signed-out rather than as a separate
    /// error screen.
    #[must_use]
    pub fn decide(status: &CacheStatus<Option<UserProfile>>) -> Gate {
        match status {
            CacheStatus::Pending => Gate::Loading,
            CacheStatus::Resolved(Some(user)) => Gate::Allow(user.clone()),
            CacheStatus::Resolved(None) | CacheStatus::Error(_) => Gate::Login,
        }
    }

    /// Signs out: hits the logout endpoint, then force-clears the cached
    /// session without an immediate re-fetch. Subscribers observe the
    /// cleared entry and redirect from there.
    pub async fn logout(&self) -> Result<(), ApiError> {
        debug!("logging out");
        self.auth.logout().await?;
        self.cache.write(&SessionKey, None);
        info!("session cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::mocks::MockAuth;
    use tokio_test::assert_ok;

    #[tokio::test(start_paused = true)]
    async fn test_gate_resolves_to_allow_for_active_session() {
        let auth = Arc::new(MockAuth::signed_in("u1"));
        let guard = SessionGuard::new(auth.clone());

        let mut reader = guard.subscribe();
        assert_eq!(SessionGuard::decide(&reader.snapshot()), Gate::Loading);

        let status = reader.updated().await;
        match SessionGuard::decide(&status) {
            Gate::Allow(user) => assert_eq!(user.id, "u1"),
            other => panic!("expected Allow, got {other:?}"),
        }
        assert_eq!(auth.me_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_session_gates_to_login() {
        let auth = Arc::new(MockAuth::signed_out());
        let guard = SessionGuard::new(auth);

        let mut reader = guard.subscribe();
        let status = reader.updated().await;
        assert_eq!(SessionGuard::decide(&status), Gate::Login);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_error_gates_to_login() {
        let status: CacheStatus<Option<UserProfile>> =
            CacheStatus::Error(ApiError::transient("unreachable"));
        assert_eq!(SessionGuard::decide(&status), Gate::Login);
    }

    #[tokio::test(start_paused = true)]
    async fn test_logout_clears_without_refetch() {
        let auth = Arc::new(MockAuth::signed_in("u1"));
        let guard = SessionGuard::new(auth.clone());

        let mut reader = guard.subscribe();
        let _ = reader.updated().await;
        assert_eq!(auth.me_calls(), 1);

        assert_ok!(guard.logout().await);
        assert_eq!(auth.logout_calls(), 1);

        // The subscriber observes the cleared entry without another
        // round trip to /auth/me.
        let status = reader.updated().await;
        assert_eq!(SessionGuard::decide(&status), Gate::Login);
        assert_eq!(auth.me_calls(), 1);
    }
}
