use async_trait::async_trait;
use tracing::info;

use crate::persist::{RecordPage, RecordStore, StoreResult};

/// Reads go to the wrapped store, writes are only logged.
pub struct DryRunStore<S> {
    inner: S,
}

impl<S: RecordStore> DryRunStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<S: RecordStore> RecordStore for DryRunStore<S> {
    async fn query_page(&self, collection: &str, cursor: Option<&str>) -> StoreResult<RecordPage> {
        self.inner.query_page(collection, cursor).await
    }

    async fn update_price(&self, record_id: &str, price: Option<f64>) -> StoreResult<()> {
        info!(record = %record_id, ?price, "dry run, skipping write");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::memory::InMemoryStore;
    use crate::persist::ExternalRecord;

    #[tokio::test]
    async fn reads_through_and_drops_writes() {
        let store = DryRunStore::new(
            InMemoryStore::new().with_collection("db", vec![vec![ExternalRecord::new("r1", "BTC", None)]]),
        );

        let page = store.query_page("db", None).await.unwrap();
        assert_eq!(page.records.len(), 1);

        store.update_price("r1", Some(1.0)).await.unwrap();
        assert!(store.inner.writes().is_empty());
    }
}
