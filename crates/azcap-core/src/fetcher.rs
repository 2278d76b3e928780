//! Capacity fetcher: issues paginated list calls against the
//! Microsoft.CognitiveServices modelCapacities API and normalizes the
//! loosely-typed wire payload into [`CapacityRecord`]s at this boundary.

use serde::Deserialize;

use crate::client::RetryingHttpClient;
use crate::config::{EngineConfig, ModelSpec};
use crate::error::CapacityError;
use crate::http_client::HttpRequest;
use crate::record::{CapacityRecord, ModelKey};

/// Per-call timeout, separate from the retry budget.
const REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Everything one fetch cycle produced: the flattened records plus the
/// models whose queries failed after retries.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    pub records: Vec<CapacityRecord>,
    pub failed_models: Vec<ModelKey>,
}

/// Fetches raw capacity records, one list call per configured model.
///
/// Each `fetch_all` invocation re-issues every request; caching is the
/// snapshot cache's job, not the fetcher's.
pub struct CapacityFetcher {
    client: RetryingHttpClient,
    base_url: String,
    subscription_id: String,
    api_version: String,
    models: Vec<ModelSpec>,
}

impl CapacityFetcher {
    pub fn new(client: RetryingHttpClient, config: &EngineConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            subscription_id: config.subscription_id.clone(),
            api_version: config.api_version.clone(),
            models: config.models.clone(),
        }
    }

    /// Queries every configured model, fail-partial: a model whose query
    /// exhausts retries is logged and recorded in `failed_models`, and
    /// the batch continues. Fatal errors (auth, malformed request) abort
    /// the whole cycle since they would fail every remaining model too.
    pub async fn fetch_all(&self) -> Result<FetchOutcome, CapacityError> {
        let mut outcome = FetchOutcome::default();

        for model in &self.models {
            match self.fetch_model(model).await {
                Ok(records) => {
                    tracing::info!(
                        model = %model.model_name,
                        version = %model.model_version,
                        records = records.len(),
                        "fetched capacity records"
                    );
                    outcome.records.extend(records);
                }
                Err(error) if error.is_fatal() => return Err(error),
                Err(error) => {
                    tracing::error!(
                        model = %model.model_name,
                        version = %model.model_version,
                        error = %error,
                        "capacity query failed, continuing with remaining models"
                    );
                    outcome
                        .failed_models
                        .push(ModelKey::new(&model.model_name, &model.model_version));
                }
            }
        }

        Ok(outcome)
    }

    /// One model's list call, following `nextLink` pagination until the
    /// continuation token runs out.
    async fn fetch_model(&self, model: &ModelSpec) -> Result<Vec<CapacityRecord>, CapacityError> {
        let mut records = Vec::new();
        let mut next_url = Some(self.list_url(model));

        while let Some(url) = next_url {
            let request = HttpRequest::get(&url).with_timeout_ms(REQUEST_TIMEOUT_MS);
            let response = self.client.execute(request).await?;

            let page: CapacityListPage = serde_json::from_str(&response.body).map_err(|e| {
                CapacityError::invalid_response(format!(
                    "malformed capacity list response for model '{}': {e}",
                    model.model_name
                ))
            })?;

            for item in page.value {
                match flatten_item(item) {
                    Some(record) => records.push(record),
                    None => {
                        tracing::debug!(
                            model = %model.model_name,
                            "skipping capacity item without location or SKU"
                        );
                    }
                }
            }

            next_url = page.next_link;
        }

        Ok(records)
    }

    fn list_url(&self, model: &ModelSpec) -> String {
        format!(
            "{}/subscriptions/{}/providers/Microsoft.CognitiveServices/modelCapacities\
             ?api-version={}&modelFormat={}&modelName={}&modelVersion={}",
            self.base_url,
            self.subscription_id,
            urlencoding::encode(&self.api_version),
            urlencoding::encode(&model.model_format),
            urlencoding::encode(&model.model_name),
            urlencoding::encode(&model.model_version),
        )
    }
}

/// Normalizes one wire item. Items without a location or SKU name are
/// unplaceable and dropped; a missing capacity field maps to `None`
/// ("not supported"), never to zero.
fn flatten_item(item: CapacityItem) -> Option<CapacityRecord> {
    let location = item.location?;
    let properties = item.properties?;
    let sku_name = properties.sku_name?;
    let model = properties.model.unwrap_or_default();

    Some(CapacityRecord {
        model_name: model.name.unwrap_or_default(),
        model_format: model.format.unwrap_or_default(),
        model_version: model.version.unwrap_or_default(),
        region: location,
        sku_name,
        available_capacity: properties.available_capacity,
        available_finetune_capacity: properties.available_finetune_capacity,
    })
}

// Wire shapes. Field presence varies by SKU, so everything is optional
// and normalization happens in `flatten_item`.

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CapacityListPage {
    #[serde(default)]
    value: Vec<CapacityItem>,
    #[serde(default)]
    next_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CapacityItem {
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    properties: Option<CapacityProperties>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CapacityProperties {
    #[serde(default)]
    model: Option<WireModel>,
    #[serde(default)]
    sku_name: Option<String>,
    #[serde(default)]
    available_capacity: Option<u64>,
    #[serde(default)]
    available_finetune_capacity: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct WireModel {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    format: Option<String>,
    #[serde(default)]
    version: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticCredential;
    use crate::client::RetryingHttpClient;
    use crate::http_client::NoopHttpClient;
    use crate::retry::RetryConfig;
    use std::sync::Arc;

    fn test_config() -> EngineConfig {
        EngineConfig::from_json(
            r#"{
                "subscription_id": "sub-1",
                "base_url": "https://management.azure.test/",
                "models": [
                    {"model_format": "OpenAI", "model_name": "gpt-4o", "model_version": "2024-05-13"}
                ]
            }"#,
        )
        .expect("valid config")
    }

    fn fetcher() -> CapacityFetcher {
        let client = RetryingHttpClient::new(
            Arc::new(NoopHttpClient),
            Arc::new(StaticCredential::new("t")),
            RetryConfig::default(),
        );
        CapacityFetcher::new(client, &test_config())
    }

    #[test]
    fn list_url_encodes_query_parameters() {
        let fetcher = fetcher();
        let url = fetcher.list_url(&ModelSpec {
            model_format: String::from("OpenAI"),
            model_name: String::from("gpt-4o"),
            model_version: String::from("2024-05-13"),
        });

        assert!(url.starts_with(
            "https://management.azure.test/subscriptions/sub-1/providers/Microsoft.CognitiveServices/modelCapacities?api-version="
        ));
        assert!(url.contains("modelName=gpt-4o"));
        assert!(url.contains("modelVersion=2024-05-13"));
        // Trailing slash on base_url must not double up.
        assert!(!url.contains(".test//"));
    }

    #[test]
    fn missing_capacity_field_is_none_not_zero() {
        let body = r#"{
            "location": "eastus",
            "properties": {
                "model": {"name": "gpt-4o", "format": "OpenAI", "version": "2024-05-13"},
                "skuName": "ProvisionedManaged"
            }
        }"#;
        let item: CapacityItem = serde_json::from_str(body).expect("parses");
        let record = flatten_item(item).expect("placeable");

        assert_eq!(record.available_capacity, None);
        assert_eq!(record.sku_name, "ProvisionedManaged");
    }

    #[test]
    fn zero_capacity_survives_normalization() {
        let body = r#"{
            "location": "eastus",
            "properties": {
                "model": {"name": "gpt-4o"},
                "skuName": "GlobalStandard",
                "availableCapacity": 0
            }
        }"#;
        let item: CapacityItem = serde_json::from_str(body).expect("parses");
        let record = flatten_item(item).expect("placeable");
        assert_eq!(record.available_capacity, Some(0));
    }

    #[test]
    fn items_without_location_or_sku_are_dropped() {
        let no_location: CapacityItem =
            serde_json::from_str(r#"{"properties": {"skuName": "GlobalStandard"}}"#).expect("parses");
        assert!(flatten_item(no_location).is_none());

        let no_sku: CapacityItem =
            serde_json::from_str(r#"{"location": "eastus", "properties": {}}"#).expect("parses");
        assert!(flatten_item(no_sku).is_none());
    }

    #[tokio::test]
    async fn empty_page_yields_no_records() {
        // NoopHttpClient returns "{}", a valid page with no items.
        let outcome = fetcher().fetch_all().await.expect("fetch succeeds");
        assert!(outcome.records.is_empty());
        assert!(outcome.failed_models.is_empty());
    }
}
