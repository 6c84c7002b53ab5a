//! Reconciliation: join external records against the price table.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::PipelineResult;
use crate::market_data::adapters::Exchange;
use crate::market_data::normaliser::parse_price;
use crate::market_data::price_table::PriceTable;
use crate::persist::ExternalRecord;

/// The price one record should end up holding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateInstruction {
    pub record_id: String,
    pub symbol: String,
    pub exchange: Exchange,
    /// NaN when the exchange does not list the symbol.
    pub price: f64,
}

impl UpdateInstruction {
    pub fn is_resolved(&self) -> bool {
        self.price.is_finite()
    }
}

/// What to do with instructions whose price could not be resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MissingPricePolicy {
    /// Leave the record untouched.
    #[default]
    Skip,
    /// Clear the stored price.
    Clear,
}

/// A write ready for the store. `price: None` clears the field.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceWrite {
    pub record_id: String,
    pub price: Option<f64>,
}

/// One instruction per record, in record order.
///
/// A record selecting an unknown exchange, or one missing from `table`, is an
/// error. A symbol the exchange does not list still produces an instruction,
/// with a NaN price.
pub fn reconcile(records: &[ExternalRecord], table: &PriceTable) -> PipelineResult<Vec<UpdateInstruction>> {
    records
        .iter()
        .map(|record| {
            let exchange = Exchange::from_selector(record.exchange.as_deref())?;
            let symbol = record.symbol.trim().to_ascii_uppercase();
            let price = table
                .lookup(exchange, &symbol)?
                .map(parse_price)
                .unwrap_or(f64::NAN);
            Ok(UpdateInstruction {
                record_id: record.id.clone(),
                symbol,
                exchange,
                price,
            })
        })
        .collect()
}

/// Turn instructions into store writes, applying `policy` to unresolved prices.
/// Order is preserved.
pub fn plan_writes(instructions: &[UpdateInstruction], policy: MissingPricePolicy) -> Vec<PriceWrite> {
    instructions
        .iter()
        .filter_map(|ins| {
            if ins.is_resolved() {
                return Some(PriceWrite { record_id: ins.record_id.clone(), price: Some(ins.price) });
            }
            metrics::counter!("ticker_sync_unresolved_symbols_total").increment(1);
            match policy {
                MissingPricePolicy::Skip => {
                    warn!(record = %ins.record_id, symbol = %ins.symbol, exchange = %ins.exchange,
                        "no price for symbol, skipping record");
                    None
                }
                MissingPricePolicy::Clear => {
                    warn!(record = %ins.record_id, symbol = %ins.symbol, exchange = %ins.exchange,
                        "no price for symbol, clearing stored price");
                    Some(PriceWrite { record_id: ins.record_id.clone(), price: None })
                }
            }
        })
        .collect()
}
