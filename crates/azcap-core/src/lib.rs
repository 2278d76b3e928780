//! # azcap-core
//!
//! Capacity aggregation engine for `azcap`, a read-only monitor of
//! Azure AI model inference capacity. The engine queries the
//! Microsoft.CognitiveServices modelCapacities API, normalizes the
//! per-region records into a dense model x region x SKU matrix, and
//! serves cached, exportable snapshots to presentation consumers.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`aggregate`] | Matrix construction and per-SKU summaries |
//! | [`auth`] | Credential boundary (`TokenCredential`) |
//! | [`classify`] | Severity tiers and color thresholds |
//! | [`client`] | Retrying HTTP client with token refresh |
//! | [`config`] | Engine configuration |
//! | [`error`] | Error taxonomy (fatal / transient / partial) |
//! | [`export`] | CSV and round-trippable JSON export |
//! | [`fetcher`] | Paginated capacity fetch, fail-partial |
//! | [`http_client`] | Transport abstraction (reqwest / no-op) |
//! | [`record`] | Domain types (records, model keys, cells) |
//! | [`retry`] | Backoff math and the retry state machine |
//! | [`snapshot`] | Single-entry TTL snapshot cache |
//!
//! ## Data flow
//!
//! ```text
//! TokenCredential -> RetryingHttpClient -> CapacityFetcher
//!     -> CapacityMatrix::build -> SnapshotCache -> export / classify
//! ```
//!
//! ## Error handling
//!
//! Fatal failures (auth, malformed request) surface immediately;
//! transient failures (429/5xx/transport) retry with capped exponential
//! backoff; a model whose query exhausts its retry budget becomes a
//! partial failure: the batch continues and the model's cells are
//! marked `QueryFailed` instead of silently vanishing.

pub mod aggregate;
pub mod auth;
pub mod classify;
pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod fetcher;
pub mod http_client;
pub mod record;
pub mod retry;
pub mod snapshot;

pub use aggregate::{CapacityMatrix, SkuSummary, SKU_DISPLAY_PRIORITY};
pub use auth::{AccessToken, StaticCredential, TokenCredential, EXPIRY_SKEW, MANAGEMENT_SCOPE};
pub use classify::{ColorClassifier, ColorThresholds, Tier};
pub use client::RetryingHttpClient;
pub use config::{EngineConfig, ModelSpec, RetrySettings};
pub use error::{CapacityError, CapacityErrorKind, ConfigError};
pub use export::{matrix_from_json, to_csv, to_json};
pub use fetcher::{CapacityFetcher, FetchOutcome};
pub use http_client::{
    HttpAuth, HttpClient, HttpError, HttpMethod, HttpRequest, HttpResponse, NoopHttpClient,
    ReqwestHttpClient,
};
pub use record::{CapacityCell, CapacityRecord, ModelKey};
pub use retry::{should_retry_status, AttemptOutcome, Backoff, RetryConfig, RetryState};
pub use snapshot::{Snapshot, SnapshotCache};
