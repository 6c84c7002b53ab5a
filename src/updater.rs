//! Batch Updater: sequential batches, concurrent writes inside a batch.

use futures::future::join_all;
use itertools::Itertools;
use tracing::{error, info};

use crate::error::{PipelineError, PipelineResult};
use crate::persist::RecordStore;
use crate::reconcile::PriceWrite;

pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Split `items` into consecutive chunks of at most `batch_size`, keeping order.
pub fn partition<T>(items: Vec<T>, batch_size: usize) -> Vec<Vec<T>> {
    let chunks = items.into_iter().chunks(batch_size.max(1));
    let batches = chunks.into_iter().map(|chunk| chunk.collect()).collect();
    batches
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Size of every batch applied, in order.
    pub batch_sizes: Vec<usize>,
}

impl BatchReport {
    pub fn written(&self) -> usize {
        self.batch_sizes.iter().sum()
    }
}

/// Apply `writes` batch by batch. Every write of a batch is awaited before
/// the next batch starts; any failed write stops the remaining batches.
pub async fn apply_batches<S>(
    store: &S,
    collection: &str,
    writes: Vec<PriceWrite>,
    batch_size: usize,
) -> PipelineResult<BatchReport>
where
    S: RecordStore + ?Sized,
{
    let mut report = BatchReport::default();

    for (index, batch) in partition(writes, batch_size).into_iter().enumerate() {
        let size = batch.len();
        let results = join_all(
            batch
                .iter()
                .map(|w| store.update_price(&w.record_id, w.price)),
        )
        .await;

        let mut failures = batch
            .iter()
            .zip(results)
            .filter_map(|(w, r)| r.err().map(|e| (w.record_id.as_str(), e)));

        if let Some((record, first)) = failures.next() {
            let failed = 1 + failures.count();
            metrics::counter!("ticker_sync_write_failures_total").increment(failed as u64);
            metrics::counter!("ticker_sync_writes_total").increment((size - failed) as u64);
            error!(%collection, batch = index, %record, failed, "batch write failed: {first}");
            return Err(PipelineError::Write {
                collection: collection.to_string(),
                batch: index,
                size,
                failed,
                first,
            });
        }

        metrics::counter!("ticker_sync_writes_total").increment(size as u64);
        metrics::counter!("ticker_sync_batches_total").increment(1);
        info!(%collection, batch = index, "Completed batch size: {size}");
        report.batch_sizes.push(size);
    }

    Ok(report)
}
