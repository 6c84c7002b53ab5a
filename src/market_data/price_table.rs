use std::collections::BTreeMap;

use ahash::AHashMap;

use crate::error::{PipelineError, PipelineResult};
use crate::market_data::adapters::Exchange;

/// Bare asset symbol (`"BTC"`) -> raw venue price string.
///
/// Keys are quote-stripped and uppercase; inserting a symbol twice keeps the
/// last price seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolPriceMap {
    prices: BTreeMap<String, String>,
}

impl SymbolPriceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, symbol: String, price: String) {
        self.prices.insert(symbol, price);
    }

    pub fn get(&self, symbol: &str) -> Option<&str> {
        self.prices.get(symbol).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.prices.keys().map(String::as_str)
    }
}

impl FromIterator<(String, String)> for SymbolPriceMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut map = SymbolPriceMap::new();
        for (symbol, price) in iter {
            map.insert(symbol, price);
        }
        map
    }
}

/// Per-run table of every exchange's prices. Built once, read-only after.
#[derive(Debug, Clone, Default)]
pub struct PriceTable {
    by_exchange: AHashMap<Exchange, SymbolPriceMap>,
}

impl PriceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, exchange: Exchange, prices: SymbolPriceMap) {
        self.by_exchange.insert(exchange, prices);
    }

    pub fn get(&self, exchange: Exchange) -> Option<&SymbolPriceMap> {
        self.by_exchange.get(&exchange)
    }

    /// Raw price of `symbol` on `exchange`. An exchange that was never loaded
    /// is an error, a symbol the exchange does not list is `Ok(None)`.
    pub fn lookup(&self, exchange: Exchange, symbol: &str) -> PipelineResult<Option<&str>> {
        let prices = self
            .get(exchange)
            .ok_or(PipelineError::MissingExchange { exchange })?;
        Ok(prices.get(symbol))
    }

    pub fn len(&self) -> usize {
        self.by_exchange.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_exchange.is_empty()
    }
}
