// Source: GET https://www.binance.com/api/v3/ticker/price
// Payload: [{"symbol": "BTCUSDT", "price": "50000.00"}, ...]

use serde::Deserialize;
use serde_json::Value;

use crate::market_data::normaliser::{Normaliser, USDT};
use crate::market_data::price_table::SymbolPriceMap;

const NORMALISER: Normaliser = Normaliser::new(USDT);

#[derive(Debug, Deserialize)]
pub struct BinanceTicker {
    pub symbol: String,
    #[serde(default)]
    pub price: Option<String>,
}

pub fn decode(payload: Value) -> serde_json::Result<Vec<BinanceTicker>> {
    serde_json::from_value(payload)
}

pub fn extract_prices(tickers: &[BinanceTicker]) -> SymbolPriceMap {
    tickers
        .iter()
        .filter_map(|t| {
            let symbol = NORMALISER.base_symbol(&t.symbol)?;
            Some((symbol, t.price.clone()?))
        })
        .collect()
}
