// Source: GET https://api.bybit.com/v5/market/tickers?category=spot
// Payload: {"retCode": 0, "result": {"category": "spot", "list": [{"symbol": "BTCUSDT", "bid1Price": "..."}]}}

use serde::Deserialize;
use serde_json::Value;

use crate::market_data::normaliser::{Normaliser, USDT};
use crate::market_data::price_table::SymbolPriceMap;

const NORMALISER: Normaliser = Normaliser::new(USDT);

#[derive(Debug, Deserialize)]
pub struct BybitResponse {
    #[serde(default)]
    pub result: Option<BybitResult>,
}

#[derive(Debug, Deserialize)]
pub struct BybitResult {
    #[serde(default)]
    pub list: Vec<BybitTicker>,
}

#[derive(Debug, Deserialize)]
pub struct BybitTicker {
    pub symbol: String,
    // best bid is what gets recorded for bybit, not the last trade
    #[serde(rename = "bid1Price", default)]
    pub bid1_price: Option<String>,
}

pub fn decode(payload: Value) -> serde_json::Result<BybitResponse> {
    serde_json::from_value(payload)
}

pub fn extract_prices(response: &BybitResponse) -> SymbolPriceMap {
    let Some(result) = &response.result else {
        return SymbolPriceMap::new();
    };
    result
        .list
        .iter()
        .filter_map(|t| {
            let symbol = NORMALISER.base_symbol(&t.symbol)?;
            Some((symbol, t.bid1_price.clone()?))
        })
        .collect()
}
