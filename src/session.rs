//! Session identity
//!
//! A single current-session identity shared by independent views. The feed
//! session receives this at construction rather than reading a global, so
//! multiple feeds (or tests) can carry different identities side by side.

/// Identity of the user driving a feed session
#[derive(Debug, Clone, Default)]
pub struct Session {
    /// Current user id, if signed in
    pub user_id: Option<String>,
    /// Whether the user passed authentication
    pub authenticated: bool,
}

impl Session {
    /// Anonymous browsing session
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Signed-in session for a known user
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            authenticated: true,
        }
    }
}
