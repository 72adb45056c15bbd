//! Identity gateway.
//!
//! Expected authentication failures (bad credentials, no backend, network
//! trouble) come back as [`AuthOutcome::Failed`] values. Only responses the
//! service should never send surface as [`IdentityError`].

pub mod session;

use std::sync::Arc;

use folio_backend::{AuthUser, BackendError, Credentials, Gateway};
use serde::Serialize;
use thiserror::Error;

pub use session::SessionState;

/// Message returned by every operation when no backend is configured.
pub const NOT_CONFIGURED: &str = "backend not configured";

/// Opaque handle to a signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserHandle {
    pub id: String,
    pub email: Option<String>,
}

impl From<AuthUser> for UserHandle {
    fn from(user: AuthUser) -> Self {
        Self {
            id: user.id,
            email: user.email,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Authenticated(UserHandle),
    /// Accepted, but the service returned no user yet (e.g. awaiting email confirmation).
    PendingConfirmation,
    Failed(String),
}

impl AuthOutcome {
    pub fn user(&self) -> Option<&UserHandle> {
        match self {
            AuthOutcome::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            AuthOutcome::Failed(message) => Some(message),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignOutOutcome {
    SignedOut,
    Failed(String),
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("unexpected auth service failure: {0}")]
    Unexpected(#[source] BackendError),
}

/// Stateless front for the backend's auth service.
#[derive(Debug, Clone)]
pub struct IdentityGateway {
    gateway: Arc<Gateway>,
}

impl IdentityGateway {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }

    pub async fn sign_in_with_email(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthOutcome, IdentityError> {
        let Some(client) = self.gateway.client() else {
            return Ok(AuthOutcome::Failed(NOT_CONFIGURED.to_string()));
        };

        let credentials = Credentials::new(email, password);
        match client.sign_in_with_password(&credentials).await {
            Ok(user) => {
                tracing::info!(user = %user.id, "sign-in succeeded");
                Ok(AuthOutcome::Authenticated(user.into()))
            }
            Err(err) => failed("sign-in", err),
        }
    }

    pub async fn sign_up_with_email(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthOutcome, IdentityError> {
        let Some(client) = self.gateway.client() else {
            return Ok(AuthOutcome::Failed(NOT_CONFIGURED.to_string()));
        };

        let credentials = Credentials::new(email, password);
        match client.sign_up(&credentials).await {
            Ok(Some(user)) => {
                tracing::info!(user = %user.id, "sign-up succeeded");
                Ok(AuthOutcome::Authenticated(user.into()))
            }
            Ok(None) => Ok(AuthOutcome::PendingConfirmation),
            Err(err) => failed("sign-up", err),
        }
    }

    pub async fn sign_out(&self) -> Result<SignOutOutcome, IdentityError> {
        let Some(client) = self.gateway.client() else {
            return Ok(SignOutOutcome::Failed(NOT_CONFIGURED.to_string()));
        };

        match client.sign_out().await {
            Ok(()) => Ok(SignOutOutcome::SignedOut),
            Err(err) if err.is_expected_auth_failure() => {
                tracing::warn!(error = %err, "sign-out failed");
                Ok(SignOutOutcome::Failed(err.user_message()))
            }
            Err(err) => Err(IdentityError::Unexpected(err)),
        }
    }
}

fn failed(action: &str, err: BackendError) -> Result<AuthOutcome, IdentityError> {
    if err.is_expected_auth_failure() {
        tracing::warn!(action, error = %err, "authentication failed");
        Ok(AuthOutcome::Failed(err.user_message()))
    } else {
        tracing::error!(action, error = %err, "authentication service misbehaved");
        Err(IdentityError::Unexpected(err))
    }
}

#[cfg(test)]
mod tests {
    use folio_backend::testing::{MemoryBackend, Operation};

    use super::*;

    fn identity(backend: &MemoryBackend) -> IdentityGateway {
        IdentityGateway::new(Arc::new(Gateway::with_client(Arc::new(backend.clone()))))
    }

    #[tokio::test]
    async fn unconfigured_backend_fails_every_operation() {
        let identity = IdentityGateway::new(Arc::new(Gateway::unconfigured()));

        let sign_in = identity.sign_in_with_email("a@b.c", "pw").await.unwrap();
        assert_eq!(sign_in, AuthOutcome::Failed(NOT_CONFIGURED.to_string()));
        assert!(sign_in.user().is_none());

        let sign_up = identity.sign_up_with_email("a@b.c", "pw").await.unwrap();
        assert_eq!(sign_up.error(), Some(NOT_CONFIGURED));

        let sign_out = identity.sign_out().await.unwrap();
        assert_eq!(sign_out, SignOutOutcome::Failed(NOT_CONFIGURED.to_string()));
    }

    #[tokio::test]
    async fn wrong_password_is_a_value_not_an_error() {
        let backend = MemoryBackend::new();
        backend.register("reader@email.com", "correct");

        let outcome = identity(&backend)
            .sign_in_with_email("reader@email.com", "wrong")
            .await
            .unwrap();
        assert_eq!(
            outcome,
            AuthOutcome::Failed("Invalid login credentials".to_string())
        );
    }

    #[tokio::test]
    async fn sign_in_returns_user_handle() {
        let backend = MemoryBackend::new();
        let user = backend.register("reader@email.com", "correct");

        let outcome = identity(&backend)
            .sign_in_with_email("reader@email.com", "correct")
            .await
            .unwrap();
        assert_eq!(outcome.user().map(|u| u.id.as_str()), Some(user.id.as_str()));
    }

    #[tokio::test]
    async fn sign_up_then_duplicate_sign_up() {
        let backend = MemoryBackend::new();
        let identity = identity(&backend);

        let first = identity.sign_up_with_email("new@email.com", "pw").await.unwrap();
        assert!(matches!(first, AuthOutcome::Authenticated(_)));

        let second = identity.sign_up_with_email("new@email.com", "pw").await.unwrap();
        assert_eq!(second.error(), Some("User already registered"));
    }

    #[tokio::test]
    async fn network_failure_is_expected() {
        let backend = MemoryBackend::new();
        backend.fail(Operation::SignIn, BackendError::Transport("connection refused".into()));

        let outcome = identity(&backend)
            .sign_in_with_email("reader@email.com", "pw")
            .await
            .unwrap();
        assert_eq!(
            outcome.error(),
            Some("network error: connection refused")
        );
    }

    #[tokio::test]
    async fn malformed_response_propagates() {
        let backend = MemoryBackend::new();
        backend.fail(Operation::SignIn, BackendError::Decode("missing field `user`".into()));

        let err = identity(&backend)
            .sign_in_with_email("reader@email.com", "pw")
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::Unexpected(BackendError::Decode(_))));
    }

    #[tokio::test]
    async fn sign_out_clears_backend_session() {
        let backend = MemoryBackend::new();
        backend.register("reader@email.com", "pw");
        let identity = identity(&backend);

        identity.sign_in_with_email("reader@email.com", "pw").await.unwrap();
        assert!(backend.session().is_some());

        let outcome = identity.sign_out().await.unwrap();
        assert_eq!(outcome, SignOutOutcome::SignedOut);
        assert!(backend.session().is_none());
    }
}
