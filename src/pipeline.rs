// Pipeline orchestrates sources + store: prices -> records -> reconcile -> batches
use futures::future::try_join_all;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info};

use crate::config::{Endpoints, Settings};
use crate::error::{PipelineError, PipelineResult};
use crate::fetcher::fetch_all_records;
use crate::market_data::adapters::{Exchange, TickerSource};
use crate::market_data::price_table::{PriceTable, SymbolPriceMap};
use crate::persist::RecordStore;
use crate::reconcile::{plan_writes, reconcile};
use crate::updater::apply_batches;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionSummary {
    pub collection: String,
    pub records: usize,
    pub unresolved: usize,
    pub written: usize,
    pub batch_sizes: Vec<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub collections: Vec<CollectionSummary>,
}

impl RunSummary {
    pub fn written(&self) -> usize {
        self.collections.iter().map(|c| c.written).sum()
    }
}

/// Fetch and extract one exchange. An empty extraction is fatal.
async fn fetch_exchange<T>(source: &T, exchange: Exchange, url: &str) -> PipelineResult<SymbolPriceMap>
where
    T: TickerSource + ?Sized,
{
    let payload = source.fetch(exchange, url).await?;
    let prices = exchange.extract(payload);
    if prices.is_empty() {
        return Err(PipelineError::EmptyExtraction { exchange });
    }
    metrics::counter!("ticker_sync_prices_extracted", "exchange" => exchange.as_str())
        .increment(prices.len() as u64);
    info!(%exchange, symbols = prices.len(), "extracted USDT prices");
    Ok(prices)
}

/// Fetch all four exchanges concurrently and build the price table.
pub async fn fetch_price_table<T>(source: &T, endpoints: &Endpoints) -> PipelineResult<PriceTable>
where
    T: TickerSource + ?Sized,
{
    let maps = try_join_all(Exchange::ALL.into_iter().map(|exchange| async move {
        let prices = fetch_exchange(source, exchange, endpoints.get(exchange)).await?;
        Ok::<_, PipelineError>((exchange, prices))
    }))
    .await?;

    let mut table = PriceTable::new();
    for (exchange, prices) in maps {
        table.insert(exchange, prices);
    }
    Ok(table)
}

/// Fetch, reconcile and write back one collection.
pub async fn sync_collection<S>(
    store: &S,
    collection: &str,
    table: &PriceTable,
    settings: &Settings,
) -> PipelineResult<CollectionSummary>
where
    S: RecordStore + ?Sized,
{
    let records = fetch_all_records(store, collection).await?;
    let instructions = reconcile(&records, table)?;
    debug!(
        %collection,
        plan = %serde_json::to_string(&instructions).unwrap_or_default(),
        "update plan"
    );

    let unresolved = instructions.iter().filter(|i| !i.is_resolved()).count();
    let writes = plan_writes(&instructions, settings.missing_price);
    let report = apply_batches(store, collection, writes, settings.batch_size).await?;

    Ok(CollectionSummary {
        collection: collection.to_string(),
        records: records.len(),
        unresolved,
        written: report.written(),
        batch_sizes: report.batch_sizes,
    })
}

/// One full sync: every price source first, then each collection in order.
/// The first error aborts the run.
pub async fn run<T, S>(settings: &Settings, source: &T, store: &S) -> PipelineResult<RunSummary>
where
    T: TickerSource + ?Sized,
    S: RecordStore + ?Sized,
{
    settings.validate()?;

    let table = fetch_price_table(source, &settings.endpoints).await?;

    let mut summary = RunSummary::default();
    for collection in &settings.database_ids {
        let done = sync_collection(store, collection, &table, settings).await?;
        info!(
            collection = %done.collection,
            records = done.records,
            unresolved = done.unresolved,
            written = done.written,
            batches = done.batch_sizes.len(),
            "collection synced"
        );
        summary.collections.push(done);
    }
    Ok(summary)
}

/// Repeat [`run`] every `interval_secs`, returning on the first failed cycle.
pub async fn run_forever<T, S>(settings: &Settings, source: &T, store: &S, every: Duration) -> PipelineResult<()>
where
    T: TickerSource + ?Sized,
    S: RecordStore + ?Sized,
{
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let summary = run(settings, source, store).await?;
        info!(written = summary.written(), "sync cycle complete");
    }
}
