use std::fmt::{Display, Formatter};

use thiserror::Error;

/// Engine-level error classification.
///
/// `AuthFailed` and `InvalidRequest` are fatal: retrying them cannot help
/// and they surface immediately. `Transport` and `RateLimited` are
/// transient and eligible for retry; `RetriesExhausted` is what a
/// transient failure becomes once the retry budget is spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityErrorKind {
    AuthFailed,
    InvalidRequest,
    Transport,
    RateLimited,
    RetriesExhausted,
    InvalidResponse,
}

/// Structured engine error carrying the failure kind, a human-readable
/// message, and the last HTTP status observed (when there was one).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapacityError {
    kind: CapacityErrorKind,
    message: String,
    status: Option<u16>,
    retryable: bool,
}

impl CapacityError {
    pub fn auth_failed(message: impl Into<String>, status: Option<u16>) -> Self {
        Self {
            kind: CapacityErrorKind::AuthFailed,
            message: message.into(),
            status,
            retryable: false,
        }
    }

    pub fn invalid_request(message: impl Into<String>, status: Option<u16>) -> Self {
        Self {
            kind: CapacityErrorKind::InvalidRequest,
            message: message.into(),
            status,
            retryable: false,
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            kind: CapacityErrorKind::Transport,
            message: message.into(),
            status: None,
            retryable: true,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: CapacityErrorKind::RateLimited,
            message: message.into(),
            status: Some(429),
            retryable: true,
        }
    }

    pub fn retries_exhausted(message: impl Into<String>, status: Option<u16>) -> Self {
        Self {
            kind: CapacityErrorKind::RetriesExhausted,
            message: message.into(),
            status,
            retryable: false,
        }
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self {
            kind: CapacityErrorKind::InvalidResponse,
            message: message.into(),
            status: None,
            retryable: false,
        }
    }

    pub const fn kind(&self) -> CapacityErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn status(&self) -> Option<u16> {
        self.status
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    /// Fatal errors abort the whole batch; everything else degrades to a
    /// per-model partial failure.
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self.kind,
            CapacityErrorKind::AuthFailed | CapacityErrorKind::InvalidRequest
        )
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            CapacityErrorKind::AuthFailed => "capacity.auth_failed",
            CapacityErrorKind::InvalidRequest => "capacity.invalid_request",
            CapacityErrorKind::Transport => "capacity.transport",
            CapacityErrorKind::RateLimited => "capacity.rate_limited",
            CapacityErrorKind::RetriesExhausted => "capacity.retries_exhausted",
            CapacityErrorKind::InvalidResponse => "capacity.invalid_response",
        }
    }
}

impl Display for CapacityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for CapacityError {}

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing or empty configuration field '{field}'")]
    MissingField { field: &'static str },

    #[error("at least one model must be configured")]
    NoModels,

    #[error("color thresholds must satisfy low <= medium <= high (got {low}, {medium}, {high})")]
    InvalidThresholds { low: u64, medium: u64, high: u64 },

    #[error("retry base delay must be positive and no greater than max delay")]
    InvalidRetrySettings,

    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
