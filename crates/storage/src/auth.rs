use async_trait::async_trait;

/// Source of the bearer token for authenticated backend calls.
///
/// Queried immediately before every authenticated request so a refreshed
/// session is picked up without rebuilding the backend.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn access_token(&self) -> Option<String>;
}

/// A session holding a fixed token, or none at all.
#[derive(Clone, Debug, Default)]
pub struct StaticSession {
    token: Option<String>,
}

impl StaticSession {
    /// Blank tokens are treated as no session.
    #[must_use]
    pub fn new(token: Option<String>) -> Self {
        let token = token.filter(|t| !t.trim().is_empty());
        Self { token }
    }

    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionProvider for StaticSession {
    async fn access_token(&self) -> Option<String> {
        self.token.clone()
    }
}
