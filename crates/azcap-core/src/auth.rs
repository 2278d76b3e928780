//! Credential boundary for the capacity API.
//!
//! The engine never acquires credentials itself; it asks a
//! [`TokenCredential`] for a bearer token and refreshes it when the
//! expiry gets close. Production deployments plug in a managed-identity
//! provider; tests and one-shot CLI runs use [`StaticCredential`].

use std::future::Future;
use std::pin::Pin;

use time::{Duration, OffsetDateTime};

use crate::error::CapacityError;

/// Azure Resource Manager token scope used for all capacity calls.
pub const MANAGEMENT_SCOPE: &str = "https://management.azure.com/.default";

/// Tokens expiring within this window are treated as already expired.
pub const EXPIRY_SKEW: Duration = Duration::minutes(2);

/// A bearer token plus its expiry instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: OffsetDateTime,
}

impl AccessToken {
    pub fn new(token: impl Into<String>, expires_at: OffsetDateTime) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }

    pub fn is_expired(&self, skew: Duration) -> bool {
        OffsetDateTime::now_utc() + skew >= self.expires_at
    }
}

/// Credential provider contract.
pub trait TokenCredential: Send + Sync {
    fn get_token<'a>(
        &'a self,
        scope: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<AccessToken, CapacityError>> + Send + 'a>>;
}

/// Fixed-token credential for tests and pre-acquired tokens
/// (e.g. `az account get-access-token`).
#[derive(Debug, Clone)]
pub struct StaticCredential {
    token: String,
    lifetime: Duration,
}

impl StaticCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            lifetime: Duration::hours(1),
        }
    }

    pub fn with_lifetime(token: impl Into<String>, lifetime: Duration) -> Self {
        Self {
            token: token.into(),
            lifetime,
        }
    }
}

impl TokenCredential for StaticCredential {
    fn get_token<'a>(
        &'a self,
        scope: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<AccessToken, CapacityError>> + Send + 'a>> {
        let _ = scope;
        Box::pin(async move {
            if self.token.is_empty() {
                return Err(CapacityError::auth_failed("empty access token", None));
            }
            Ok(AccessToken::new(
                self.token.clone(),
                OffsetDateTime::now_utc() + self.lifetime,
            ))
        })
    }
}
