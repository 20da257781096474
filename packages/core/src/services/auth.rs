//! Caller Authentication Seam
//!
//! Token issuance and verification live outside this crate. The engine
//! only needs one resolution step before any partition operation: token in,
//! owning user id out. Every subsequent ownership check compares against
//! the resolved id.

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

/// Failures raised by an authenticator implementation
#[derive(Error, Debug)]
pub enum AuthError {
    /// Token does not resolve to any user
    #[error("Invalid token")]
    InvalidToken,

    /// Token resolved but is no longer valid
    #[error("Expired token")]
    ExpiredToken,

    /// The authentication backend itself failed
    #[error("Authentication backend failure: {0}")]
    Backend(String),
}

/// Resolves a bearer token to the acting user's id
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, token: &str) -> Result<String, AuthError>;
}

/// Fixed token-to-user table for tests and single-user deployments
#[derive(Debug, Clone, Default)]
pub struct StaticTokenAuthenticator {
    tokens: HashMap<String, String>,
}

impl StaticTokenAuthenticator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one token for one user
    pub fn with_token(mut self, token: impl Into<String>, user_id: impl Into<String>) -> Self {
        self.tokens.insert(token.into(), user_id.into());
        self
    }
}

#[async_trait]
impl Authenticator for StaticTokenAuthenticator {
    async fn authenticate(&self, token: &str) -> Result<String, AuthError> {
        self.tokens
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidToken)
    }
}
