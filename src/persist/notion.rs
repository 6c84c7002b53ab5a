// Notion database as the record store.
//   query:  POST {base}/databases/{id}/query   {"start_cursor": "..."}
//   update: PATCH {base}/pages/{id}            {"properties": {"CurrentPrice": {"number": 1.0}}}

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::config::{NotionSettings, PropertyNames};
use crate::persist::{ExternalRecord, RecordPage, RecordStore, StoreError, StoreResult};

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<NotionPage>,
    #[serde(default)]
    next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NotionPage {
    id: String,
    #[serde(default)]
    properties: HashMap<String, PropertyValue>,
}

// Only the property shapes the sync reads; everything else is ignored.
#[derive(Debug, Deserialize)]
struct PropertyValue {
    #[serde(default)]
    title: Option<Vec<RichText>>,
    #[serde(default)]
    rich_text: Option<Vec<RichText>>,
    #[serde(default)]
    select: Option<SelectOption>,
}

#[derive(Debug, Deserialize)]
struct RichText {
    #[serde(default)]
    plain_text: String,
}

#[derive(Debug, Deserialize)]
struct SelectOption {
    name: String,
}

impl PropertyValue {
    fn text(&self) -> Option<String> {
        let fragments = self.title.as_ref().or(self.rich_text.as_ref())?;
        let text: String = fragments.iter().map(|f| f.plain_text.as_str()).collect();
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }

    fn select_name(&self) -> Option<&str> {
        self.select.as_ref().map(|s| s.name.as_str())
    }
}

pub struct NotionStore {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    version: String,
    properties: PropertyNames,
}

impl NotionStore {
    pub fn new(
        api_key: &str,
        notion: &NotionSettings,
        properties: &PropertyNames,
        timeout: Duration,
    ) -> StoreResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Other(format!("could not build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: notion.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            version: notion.version.clone(),
            properties: properties.clone(),
        })
    }

    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder, url: &str) -> StoreResult<T> {
        let response = request
            .bearer_auth(&self.api_key)
            .header("Notion-Version", &self.version)
            .send()
            .await
            .map_err(|source| StoreError::Transport { url: url.to_string(), source })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| StoreError::Transport { url: url.to_string(), source })?;
        if !status.is_success() {
            return Err(StoreError::Http { url: url.to_string(), status: status.as_u16(), body });
        }
        serde_json::from_str(&body).map_err(|source| StoreError::Decode { url: url.to_string(), source })
    }

    fn to_record(&self, page: NotionPage) -> Option<ExternalRecord> {
        let symbol = page.properties.get(&self.properties.symbol).and_then(PropertyValue::text);
        let Some(symbol) = symbol else {
            warn!(page = %page.id, property = %self.properties.symbol, "page has no symbol, skipping");
            return None;
        };
        let exchange = page
            .properties
            .get(&self.properties.exchange)
            .and_then(PropertyValue::select_name)
            .map(str::to_string);
        Some(ExternalRecord { id: page.id, symbol, exchange })
    }
}

#[async_trait]
impl RecordStore for NotionStore {
    async fn query_page(&self, collection: &str, cursor: Option<&str>) -> StoreResult<RecordPage> {
        let url = format!("{}/databases/{}/query", self.base_url, collection);
        let body = match cursor {
            Some(cursor) => json!({ "start_cursor": cursor }),
            None => json!({}),
        };
        debug!(%collection, ?cursor, "querying database page");

        let response: QueryResponse = self.send(self.client.post(&url).json(&body), &url).await?;
        let records = response
            .results
            .into_iter()
            .filter_map(|page| self.to_record(page))
            .collect();
        Ok(RecordPage { records, next_cursor: response.next_cursor })
    }

    async fn update_price(&self, record_id: &str, price: Option<f64>) -> StoreResult<()> {
        let url = format!("{}/pages/{}", self.base_url, record_id);
        let mut properties = serde_json::Map::new();
        properties.insert(self.properties.price.clone(), json!({ "number": price }));
        let body = json!({ "properties": properties });
        let _: serde_json::Value = self.send(self.client.patch(&url).json(&body), &url).await?;
        Ok(())
    }
}
