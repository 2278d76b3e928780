//! Retrying HTTP client: drives the retry state machine over an inner
//! transport, refreshing the bearer token before each attempt.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::auth::{AccessToken, TokenCredential, EXPIRY_SKEW, MANAGEMENT_SCOPE};
use crate::error::CapacityError;
use crate::http_client::{HttpAuth, HttpClient, HttpRequest, HttpResponse};
use crate::retry::{should_retry_status, AttemptOutcome, RetryConfig, RetryState};

/// Wraps a transport with retry/backoff semantics and token refresh.
///
/// 429 and 5xx responses and retryable transport errors back off
/// exponentially (honoring `Retry-After`); 401/403/404 and other 4xx
/// fail immediately. Exhausting the budget surfaces a
/// `retries_exhausted` error carrying the last status observed.
pub struct RetryingHttpClient {
    transport: Arc<dyn HttpClient>,
    credential: Arc<dyn TokenCredential>,
    config: RetryConfig,
    scope: String,
    token: Mutex<Option<AccessToken>>,
}

impl RetryingHttpClient {
    pub fn new(
        transport: Arc<dyn HttpClient>,
        credential: Arc<dyn TokenCredential>,
        config: RetryConfig,
    ) -> Self {
        Self {
            transport,
            credential,
            config,
            scope: String::from(MANAGEMENT_SCOPE),
            token: Mutex::new(None),
        }
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// Returns a valid bearer token, refreshing through the credential
    /// when the cached one is missing or within the expiry skew window.
    async fn current_token(&self) -> Result<String, CapacityError> {
        let mut slot = self.token.lock().await;
        let needs_refresh = match slot.as_ref() {
            Some(token) => token.is_expired(EXPIRY_SKEW),
            None => true,
        };

        if needs_refresh {
            let token = self.credential.get_token(&self.scope).await?;
            *slot = Some(token);
        }

        Ok(slot.as_ref().map(|t| t.token.clone()).unwrap_or_default())
    }

    /// Executes a request, retrying transient failures per the configured
    /// policy. One structured log event is emitted per attempt.
    pub async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, CapacityError> {
        let mut attempt = 0u32;
        let mut last_status: Option<u16> = None;
        let mut last_error = String::new();

        loop {
            let token = self.current_token().await?;
            let attempt_request = request
                .clone()
                .with_auth(&HttpAuth::BearerToken(token))
                .with_header("content-type", "application/json");

            let outcome = match self.transport.execute(attempt_request).await {
                Ok(response) if response.is_success() => {
                    tracing::debug!(attempt, status = response.status, url = %request.url, "request succeeded");
                    return Ok(response);
                }
                Ok(response) if should_retry_status(response.status) => {
                    last_status = Some(response.status);
                    last_error = format!("server returned status {}", response.status);
                    AttemptOutcome::Transient {
                        retry_after: response.retry_after(),
                    }
                }
                Ok(response) => {
                    tracing::error!(attempt, status = response.status, url = %request.url, "fatal response, not retrying");
                    return Err(fatal_from_status(response.status));
                }
                Err(error) if error.retryable() => {
                    last_status = None;
                    last_error = error.message().to_string();
                    AttemptOutcome::Transient { retry_after: None }
                }
                Err(error) => {
                    tracing::error!(attempt, error = %error, url = %request.url, "fatal transport error");
                    return Err(CapacityError::invalid_request(
                        format!("request could not be sent: {error}"),
                        None,
                    ));
                }
            };

            match self.config.next_state(attempt, outcome) {
                RetryState::Backoff { delay, .. } => {
                    tracing::warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        status = last_status,
                        error = %last_error,
                        "transient failure, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                RetryState::RetriesExhausted => {
                    tracing::error!(
                        attempts = attempt + 1,
                        status = last_status,
                        "retry budget exhausted"
                    );
                    return Err(CapacityError::retries_exhausted(
                        format!(
                            "request failed after {} attempts: {last_error}",
                            attempt + 1
                        ),
                        last_status,
                    ));
                }
                // next_state only returns these for terminal outcomes,
                // which were handled above.
                RetryState::Attempting { .. } | RetryState::Succeeded | RetryState::FatalFailed => {
                    unreachable!("terminal outcomes are handled before the state transition")
                }
            }
        }
    }
}

fn fatal_from_status(status: u16) -> CapacityError {
    match status {
        401 | 403 => CapacityError::auth_failed(
            format!("authentication or authorization failed with status {status}"),
            Some(status),
        ),
        _ => CapacityError::invalid_request(
            format!("server rejected the request with status {status}"),
            Some(status),
        ),
    }
}
