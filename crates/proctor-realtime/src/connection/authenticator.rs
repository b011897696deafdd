//! Identity verification for registration messages.
//!
//! Identities are client-asserted. Every registration passes through one
//! [`IdentityVerifier`] so a stronger scheme (signed tokens, an exam roster)
//! can be plugged in without touching the router.

use async_trait::async_trait;

use proctor_core::error::AppError;

use super::handle::ConnectionHandle;

/// The identity a connection asks to be registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityClaim<'a> {
    /// `register-admin`
    Admin,
    /// `register-student`
    Student {
        /// Claimed student id.
        id: &'a str,
        /// Claimed display name.
        name: &'a str,
    },
}

/// Decides whether a connection may register under a claimed identity.
#[async_trait]
pub trait IdentityVerifier: Send + Sync + std::fmt::Debug {
    /// Returns `Ok(())` to accept the claim. `conn.credentials` carries
    /// whatever the client presented on upgrade.
    async fn verify(
        &self,
        conn: &ConnectionHandle,
        claim: IdentityClaim<'_>,
    ) -> Result<(), AppError>;
}

/// Accepts every claim as asserted by the client.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClientAssertedIdentity;

#[async_trait]
impl IdentityVerifier for ClientAssertedIdentity {
    async fn verify(
        &self,
        _conn: &ConnectionHandle,
        _claim: IdentityClaim<'_>,
    ) -> Result<(), AppError> {
        Ok(())
    }
}

/// Requires admins to present a shared key as upgrade credentials.
/// Student claims are accepted as asserted.
#[derive(Clone)]
pub struct SharedAdminKey {
    key: String,
}

impl std::fmt::Debug for SharedAdminKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedAdminKey").finish_non_exhaustive()
    }
}

impl SharedAdminKey {
    /// Creates a verifier expecting `key` from admins.
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

#[async_trait]
impl IdentityVerifier for SharedAdminKey {
    async fn verify(
        &self,
        conn: &ConnectionHandle,
        claim: IdentityClaim<'_>,
    ) -> Result<(), AppError> {
        match claim {
            IdentityClaim::Student { .. } => Ok(()),
            IdentityClaim::Admin if conn.credentials.as_deref() == Some(self.key.as_str()) => {
                Ok(())
            }
            IdentityClaim::Admin => Err(AppError::authentication("Invalid admin credentials")),
        }
    }
}
