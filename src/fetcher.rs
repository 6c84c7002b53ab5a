//! Record Fetcher: drains a paginated collection into one ordered list.

use tracing::{debug, info};

use crate::persist::{ExternalRecord, RecordStore, StoreResult};

/// Fetch every record of `collection`, following continuation cursors until
/// a page comes back without one. Any failed page aborts the whole fetch.
pub async fn fetch_all_records<S>(store: &S, collection: &str) -> StoreResult<Vec<ExternalRecord>>
where
    S: RecordStore + ?Sized,
{
    let mut records = Vec::new();
    let mut cursor: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = store.query_page(collection, cursor.as_deref()).await?;
        pages += 1;
        debug!(%collection, page = pages, size = page.records.len(), "fetched page");
        records.extend(page.records);

        match page.next_cursor {
            Some(next) if !next.is_empty() => cursor = Some(next),
            _ => break,
        }
    }

    metrics::counter!("ticker_sync_records_fetched").increment(records.len() as u64);
    info!(%collection, pages, "{} records successfully fetched", records.len());
    Ok(records)
}
