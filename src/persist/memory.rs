use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::persist::{ExternalRecord, RecordPage, RecordStore, StoreError, StoreResult};

/// In-process store holding pre-paginated collections. Useful for local runs
/// and for exercising the pipeline without a network.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    pages: HashMap<String, Vec<Vec<ExternalRecord>>>,
    failing: HashSet<String>,
    queries: Mutex<Vec<(String, Option<String>)>>,
    prices: Mutex<HashMap<String, Option<f64>>>,
    writes: Mutex<Vec<(String, Option<f64>)>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `collection` as the given pages, served in order.
    pub fn with_collection(mut self, collection: &str, pages: Vec<Vec<ExternalRecord>>) -> Self {
        self.pages.insert(collection.to_string(), pages);
        self
    }

    /// Make every write to `record_id` fail.
    pub fn failing_on(mut self, record_id: &str) -> Self {
        self.failing.insert(record_id.to_string());
        self
    }

    /// `(collection, cursor)` of every page request, in call order.
    pub fn queries(&self) -> Vec<(String, Option<String>)> {
        self.queries.lock().clone()
    }

    /// Every successful write in completion order.
    pub fn writes(&self) -> Vec<(String, Option<f64>)> {
        self.writes.lock().clone()
    }

    /// Current stored price of a record, `None` if never written.
    pub fn price_of(&self, record_id: &str) -> Option<Option<f64>> {
        self.prices.lock().get(record_id).copied()
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn query_page(&self, collection: &str, cursor: Option<&str>) -> StoreResult<RecordPage> {
        self.queries
            .lock()
            .push((collection.to_string(), cursor.map(str::to_string)));

        let pages = self
            .pages
            .get(collection)
            .ok_or_else(|| StoreError::Other(format!("no such collection {collection}")))?;
        // cursors are page indexes rendered as strings
        let index = match cursor {
            None => 0,
            Some(c) => c
                .parse::<usize>()
                .map_err(|_| StoreError::Other(format!("bad cursor {c}")))?,
        };
        let records = pages.get(index).cloned().unwrap_or_default();
        let next_cursor = (index + 1 < pages.len()).then(|| (index + 1).to_string());
        Ok(RecordPage { records, next_cursor })
    }

    async fn update_price(&self, record_id: &str, price: Option<f64>) -> StoreResult<()> {
        if self.failing.contains(record_id) {
            return Err(StoreError::Other(format!("write to {record_id} rejected")));
        }
        tokio::task::yield_now().await;
        self.prices.lock().insert(record_id.to_string(), price);
        self.writes.lock().push((record_id.to_string(), price));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn serves_pages_with_index_cursors() {
        let store = InMemoryStore::new().with_collection(
            "db",
            vec![
                vec![ExternalRecord::new("a", "BTC", None)],
                vec![ExternalRecord::new("b", "ETH", None)],
            ],
        );

        let first = store.query_page("db", None).await.unwrap();
        assert_eq!(first.next_cursor.as_deref(), Some("1"));
        let second = store.query_page("db", Some("1")).await.unwrap();
        assert_eq!(second.records[0].id, "b");
        assert!(second.next_cursor.is_none());
        assert!(store.query_page("other", None).await.is_err());
    }
}
