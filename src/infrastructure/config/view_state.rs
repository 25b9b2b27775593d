//! Persisted view state.

use serde::{Deserialize, Serialize};

/// The slice of UI state that survives restarts.
///
/// `last_location` is the URL-style location string of the browsing
/// screens, e.g. `gallery?page=3&size=50`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ViewState {
    /// Location to restore on the next start.
    pub last_location: Option<String>,
}
