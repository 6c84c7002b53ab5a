// Source: GET https://www.okx.com/api/v5/market/tickers?instType=SPOT
// Payload: {"code": "0", "data": [{"instId": "BTC-USDT", "last": "50000.1"}, ...]}

use serde::Deserialize;
use serde_json::Value;

use crate::market_data::normaliser::{Normaliser, DASH_USDT};
use crate::market_data::price_table::SymbolPriceMap;

const NORMALISER: Normaliser = Normaliser::new(DASH_USDT);

#[derive(Debug, Deserialize)]
pub struct OkxResponse {
    #[serde(default)]
    pub data: Option<Vec<OkxTicker>>,
}

#[derive(Debug, Deserialize)]
pub struct OkxTicker {
    #[serde(rename = "instId")]
    pub inst_id: String,
    #[serde(default)]
    pub last: Option<String>,
}

pub fn decode(payload: Value) -> serde_json::Result<OkxResponse> {
    serde_json::from_value(payload)
}

pub fn extract_prices(response: &OkxResponse) -> SymbolPriceMap {
    response
        .data
        .iter()
        .flatten()
        .filter_map(|t| {
            let symbol = NORMALISER.base_symbol(&t.inst_id)?;
            Some((symbol, t.last.clone()?))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strips_dashed_quote() {
        let response = decode(json!({
            "code": "0",
            "data": [
                {"instId": "BTC-USDT", "last": "50001"},
                {"instId": "BTC-USDC", "last": "50002"},
                {"instId": "OKB-USDT", "last": "45.2"},
            ]
        }))
        .unwrap();

        let prices = extract_prices(&response);
        assert_eq!(prices.len(), 2);
        assert_eq!(prices.get("BTC"), Some("50001"));
        assert_eq!(prices.get("OKB"), Some("45.2"));
    }

    #[test]
    fn missing_data_is_empty() {
        let response = decode(json!({"code": "50011", "msg": "Too Many Requests"})).unwrap();
        assert!(extract_prices(&response).is_empty());
    }
}
