// Shared exchange set + ticker source for the venue adapters

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{FetchError, PipelineError};
use crate::market_data::price_table::SymbolPriceMap;

pub mod binance;
pub mod bybit;
pub mod coinex;
pub mod okx;

/// The closed set of venues prices are read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Exchange {
    Binance,
    Bybit,
    Okx,
    Coinex,
}

impl Exchange {
    pub const ALL: [Exchange; 4] = [
        Exchange::Binance,
        Exchange::Bybit,
        Exchange::Okx,
        Exchange::Coinex,
    ];

    /// Venue used for records that do not name one.
    pub const DEFAULT: Exchange = Exchange::Binance;

    pub fn as_str(&self) -> &'static str {
        match self {
            Exchange::Binance => "binance",
            Exchange::Bybit => "bybit",
            Exchange::Okx => "okx",
            Exchange::Coinex => "coinex",
        }
    }

    /// Public spot ticker endpoint returning every pair in one response.
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            Exchange::Binance => "https://www.binance.com/api/v3/ticker/price",
            Exchange::Bybit => "https://api.bybit.com/v5/market/tickers?category=spot",
            Exchange::Okx => "https://www.okx.com/api/v5/market/tickers?instType=SPOT",
            Exchange::Coinex => "https://api.coinex.com/v1/market/ticker/all",
        }
    }

    /// Resolve a record's exchange selector. Absent or blank selects
    /// [`Exchange::DEFAULT`]; anything else must name a known venue.
    pub fn from_selector(selector: Option<&str>) -> Result<Exchange, PipelineError> {
        match selector.map(str::trim) {
            None | Some("") => Ok(Exchange::DEFAULT),
            Some(name) => name.parse(),
        }
    }

    /// Decode a raw payload with this venue's schema and extract its prices.
    /// A payload that does not match the schema yields an empty map.
    pub fn extract(&self, payload: Value) -> SymbolPriceMap {
        let decoded = match self {
            Exchange::Binance => binance::decode(payload).map(|t| binance::extract_prices(&t)),
            Exchange::Bybit => bybit::decode(payload).map(|r| bybit::extract_prices(&r)),
            Exchange::Okx => okx::decode(payload).map(|r| okx::extract_prices(&r)),
            Exchange::Coinex => coinex::decode(payload).map(|r| coinex::extract_prices(&r)),
        };
        match decoded {
            Ok(prices) => prices,
            Err(e) => {
                warn!(exchange = %self, error = %e, "ticker payload does not match schema");
                SymbolPriceMap::new()
            }
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Exchange {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Exchange::ALL
            .into_iter()
            .find(|e| e.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| PipelineError::UnknownExchange(s.to_string()))
    }
}

/// Anything able to GET a ticker endpoint and hand back parsed JSON.
#[async_trait::async_trait]
pub trait TickerSource: Send + Sync {
    async fn fetch(&self, exchange: Exchange, url: &str) -> Result<Value, FetchError>;
}

pub struct HttpTickerSource {
    client: reqwest::Client,
}

impl HttpTickerSource {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ticker-sync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl TickerSource for HttpTickerSource {
    async fn fetch(&self, exchange: Exchange, url: &str) -> Result<Value, FetchError> {
        debug!(%exchange, url, "fetching tickers");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Transport { exchange, source })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status { exchange, status: status.as_u16(), body });
        }

        response
            .json::<Value>()
            .await
            .map_err(|source| FetchError::Transport { exchange, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn selector_defaults_to_binance() {
        assert_eq!(Exchange::from_selector(None).unwrap(), Exchange::Binance);
        assert_eq!(Exchange::from_selector(Some("  ")).unwrap(), Exchange::Binance);
    }

    #[test]
    fn selector_is_case_insensitive() {
        assert_eq!(Exchange::from_selector(Some("OKX")).unwrap(), Exchange::Okx);
        assert_eq!(Exchange::from_selector(Some("Coinex")).unwrap(), Exchange::Coinex);
    }

    #[test]
    fn unknown_selector_fails_loudly() {
        let err = Exchange::from_selector(Some("kraken")).unwrap_err();
        assert!(matches!(err, PipelineError::UnknownExchange(ref name) if name == "kraken"));
    }

    #[test]
    fn extract_dispatches_per_exchange() {
        let binance = Exchange::Binance.extract(json!([{"symbol": "BTCUSDT", "price": "50000"}]));
        assert_eq!(binance.get("BTC"), Some("50000"));

        let coinex = Exchange::Coinex.extract(json!({"data": {"ticker": {"ETHUSDT": {"last": "3000"}}}}));
        assert_eq!(coinex.get("ETH"), Some("3000"));
    }

    fn pairs() -> impl Strategy<Value = Vec<(String, String)>> {
        proptest::collection::vec(("[A-Z]{1,6}", "(USDT|USDC|BTC|-USDT|EUR)", "[0-9]{1,5}"), 0..40)
            .prop_map(|v| v.into_iter().map(|(base, quote, px)| (format!("{base}{quote}"), px)).collect())
    }

    // every exchange's payload shape built from the same pairs, with the suffix it strips
    fn shaped(pairs: &[(String, String)]) -> [(Exchange, Value, &'static str); 4] {
        let binance: Vec<_> = pairs.iter().map(|(s, p)| json!({"symbol": s, "price": p})).collect();
        let bybit: Vec<_> = pairs.iter().map(|(s, p)| json!({"symbol": s, "bid1Price": p})).collect();
        let okx: Vec<_> = pairs.iter().map(|(s, p)| json!({"instId": s, "last": p})).collect();
        let coinex: serde_json::Map<String, Value> = pairs
            .iter()
            .map(|(s, p)| (s.clone(), json!({"last": p})))
            .collect();
        [
            (Exchange::Binance, json!(binance), "USDT"),
            (Exchange::Bybit, json!({"result": {"list": bybit}}), "USDT"),
            (Exchange::Okx, json!({"data": okx}), "-USDT"),
            (Exchange::Coinex, json!({"data": {"ticker": coinex}}), "USDT"),
        ]
    }

    proptest! {
        #[test]
        fn only_usdt_pairs_survive(pairs in pairs()) {
            for (exchange, payload, suffix) in shaped(&pairs) {
                let prices = exchange.extract(payload);
                for symbol in prices.symbols() {
                    let source_pair = format!("{}{}", symbol, suffix);
                    prop_assert!(!symbol.is_empty());
                    prop_assert!(pairs.iter().any(|(pair, _)| pair == &source_pair));
                }
            }
        }

        #[test]
        fn extraction_is_deterministic(pairs in pairs()) {
            for (exchange, payload, _) in shaped(&pairs) {
                prop_assert_eq!(exchange.extract(payload.clone()), exchange.extract(payload));
            }
        }
    }

    #[test]
    fn coinex_drops_non_usdt_markets() {
        let prices = Exchange::Coinex.extract(json!({"data": {"ticker": {
            "BTCUSDT": {"last": "50000"},
            "BTCUSDC": {"last": "49990"},
            "ETHBTC": {"last": "0.05"},
        }}}));
        assert_eq!(prices.symbols().collect::<Vec<_>>(), ["BTC"]);
    }

    #[test]
    fn schema_mismatch_extracts_nothing() {
        for exchange in Exchange::ALL {
            assert!(exchange.extract(json!("<html>bad gateway</html>")).is_empty(), "{exchange}");
        }
        assert!(Exchange::Binance
            .extract(json!({"code": -1003, "msg": "Too many requests"}))
            .is_empty());
    }
}
