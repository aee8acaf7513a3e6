use quiz_core::model::UserId;

/// Source of the signed-in user.
pub trait AuthProvider: Send + Sync {
    /// The current user, or `None` when nobody is signed in.
    fn current_identity(&self) -> Option<UserId>;
}

/// Fixed identity, resolved once at startup (CLI flag, config, tests).
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity {
    user: Option<UserId>,
}

impl StaticIdentity {
    #[must_use]
    pub fn signed_in(user: UserId) -> Self {
        Self { user: Some(user) }
    }

    #[must_use]
    pub fn anonymous() -> Self {
        Self { user: None }
    }
}

impl AuthProvider for StaticIdentity {
    fn current_identity(&self) -> Option<UserId> {
        self.user.clone()
    }
}
