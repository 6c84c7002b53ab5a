pub mod types;
pub use types::*;
pub mod dry_run;
pub mod memory;
pub mod notion;
use async_trait::async_trait;

/// The row store prices are written back into.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch one page of `collection`, starting at `cursor` (`None` for the first page).
    async fn query_page(&self, collection: &str, cursor: Option<&str>) -> StoreResult<RecordPage>;

    /// Overwrite the price field of one record. `None` clears it.
    async fn update_price(&self, record_id: &str, price: Option<f64>) -> StoreResult<()>;
}

