// Source: GET https://api.coinex.com/v1/market/ticker/all
// Payload: {"code": 0, "data": {"date": 1700000000000, "ticker": {"BTCUSDT": {"last": "50000", ...}}}}

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::market_data::normaliser::{Normaliser, USDT};
use crate::market_data::price_table::SymbolPriceMap;

const NORMALISER: Normaliser = Normaliser::new(USDT);

#[derive(Debug, Deserialize)]
pub struct CoinexResponse {
    #[serde(default)]
    pub data: Option<CoinexData>,
}

#[derive(Debug, Deserialize)]
pub struct CoinexData {
    // market name -> ticker
    #[serde(default)]
    pub ticker: Option<BTreeMap<String, CoinexTicker>>,
}

#[derive(Debug, Deserialize)]
pub struct CoinexTicker {
    #[serde(default)]
    pub last: Option<String>,
}

pub fn decode(payload: Value) -> serde_json::Result<CoinexResponse> {
    serde_json::from_value(payload)
}

pub fn extract_prices(response: &CoinexResponse) -> SymbolPriceMap {
    let Some(tickers) = response.data.as_ref().and_then(|d| d.ticker.as_ref()) else {
        return SymbolPriceMap::new();
    };
    tickers
        .iter()
        .filter_map(|(market, t)| {
            let symbol = NORMALISER.base_symbol(market)?;
            Some((symbol, t.last.clone()?))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_last_from_keyed_tickers() {
        let response = decode(json!({
            "code": 0,
            "data": {
                "date": 1700000000000u64,
                "ticker": {
                    "ETHUSDT": {"last": "3000", "vol": "12"},
                    "ETHBTC": {"last": "0.05"},
                    "CETUSDT": {"last": "0.07"},
                }
            }
        }))
        .unwrap();

        let prices = extract_prices(&response);
        assert_eq!(prices.len(), 2);
        assert_eq!(prices.get("ETH"), Some("3000"));
        assert_eq!(prices.get("CET"), Some("0.07"));
    }

    #[test]
    fn missing_ticker_object_is_empty() {
        let response = decode(json!({"code": 0, "data": {}})).unwrap();
        assert!(extract_prices(&response).is_empty());

        let response = decode(json!({"code": 227, "message": "invalid"})).unwrap();
        assert!(extract_prices(&response).is_empty());
    }
}
