//! Run configuration.
//!
//! Sources, lowest precedence first:
//! 1. built-in defaults
//! 2. optional config file (`--config`, any format the `config` crate knows)
//! 3. `TICKER_SYNC__*` environment variables, e.g. `TICKER_SYNC__NOTION__BASE_URL`
//! 4. `NOTION_API_KEY` / `NOTION_DATABASE_IDS`
//! 5. command line flags, applied by the binary

use std::path::Path;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Deserializer};

use crate::error::{PipelineError, PipelineResult};
use crate::market_data::adapters::Exchange;
use crate::reconcile::MissingPricePolicy;
use crate::updater::DEFAULT_BATCH_SIZE;

pub const ENV_PREFIX: &str = "TICKER_SYNC";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub api_key: String,
    /// Collections to sync, in order. Accepts a list or a comma-separated string.
    #[serde(default, deserialize_with = "comma_separated")]
    pub database_ids: Vec<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default)]
    pub missing_price: MissingPricePolicy,
    #[serde(default)]
    pub notion: NotionSettings,
    #[serde(default)]
    pub properties: PropertyNames,
    #[serde(default)]
    pub endpoints: Endpoints,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Repeat the sync every N seconds instead of running once.
    #[serde(default)]
    pub interval_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotionSettings {
    #[serde(default = "default_notion_base_url")]
    pub base_url: String,
    #[serde(default = "default_notion_version")]
    pub version: String,
}

impl Default for NotionSettings {
    fn default() -> Self {
        Self {
            base_url: default_notion_base_url(),
            version: default_notion_version(),
        }
    }
}

/// Names of the record properties the sync reads and writes.
#[derive(Debug, Clone, Deserialize)]
pub struct PropertyNames {
    #[serde(default = "default_symbol_property")]
    pub symbol: String,
    #[serde(default = "default_exchange_property")]
    pub exchange: String,
    #[serde(default = "default_price_property")]
    pub price: String,
}

impl Default for PropertyNames {
    fn default() -> Self {
        Self {
            symbol: default_symbol_property(),
            exchange: default_exchange_property(),
            price: default_price_property(),
        }
    }
}

/// Ticker endpoint per exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct Endpoints {
    #[serde(default = "default_binance_endpoint")]
    pub binance: String,
    #[serde(default = "default_bybit_endpoint")]
    pub bybit: String,
    #[serde(default = "default_okx_endpoint")]
    pub okx: String,
    #[serde(default = "default_coinex_endpoint")]
    pub coinex: String,
}

impl Endpoints {
    pub fn get(&self, exchange: Exchange) -> &str {
        match exchange {
            Exchange::Binance => &self.binance,
            Exchange::Bybit => &self.bybit,
            Exchange::Okx => &self.okx,
            Exchange::Coinex => &self.coinex,
        }
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            binance: default_binance_endpoint(),
            bybit: default_bybit_endpoint(),
            okx: default_okx_endpoint(),
            coinex: default_coinex_endpoint(),
        }
    }
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}
fn default_request_timeout_secs() -> u64 {
    30
}
fn default_notion_base_url() -> String {
    "https://api.notion.com/v1".into()
}
fn default_notion_version() -> String {
    "2022-06-28".into()
}
fn default_symbol_property() -> String {
    "Symbol".into()
}
fn default_exchange_property() -> String {
    "Exchange".into()
}
fn default_price_property() -> String {
    "CurrentPrice".into()
}
fn default_binance_endpoint() -> String {
    Exchange::Binance.default_endpoint().into()
}
fn default_bybit_endpoint() -> String {
    Exchange::Bybit.default_endpoint().into()
}
fn default_okx_endpoint() -> String {
    Exchange::Okx.default_endpoint().into()
}
fn default_coinex_endpoint() -> String {
    Exchange::Coinex.default_endpoint().into()
}

fn comma_separated<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Ids {
        Joined(String),
        List(Vec<String>),
    }

    let ids = match Ids::deserialize(deserializer)? {
        Ids::Joined(s) => split_ids(&s),
        Ids::List(list) => list.iter().flat_map(|s| split_ids(s)).collect(),
    };
    Ok(ids)
}

/// Split a comma-separated id list, dropping blanks.
pub fn split_ids(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            database_ids: Vec::new(),
            batch_size: default_batch_size(),
            missing_price: MissingPricePolicy::default(),
            notion: NotionSettings::default(),
            properties: PropertyNames::default(),
            endpoints: Endpoints::default(),
            request_timeout_secs: default_request_timeout_secs(),
            interval_secs: None,
        }
    }
}

impl Settings {
    /// Layer file and environment sources. Does not validate.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

        if let Ok(api_key) = std::env::var("NOTION_API_KEY") {
            builder = builder.set_override("api_key", api_key)?;
        }
        if let Ok(ids) = std::env::var("NOTION_DATABASE_IDS") {
            builder = builder.set_override("database_ids", ids)?;
        }

        builder.build()?.try_deserialize()
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> PipelineResult<()> {
        if self.api_key.trim().is_empty() {
            return Err(PipelineError::Config("NOTION_API_KEY should be non empty".into()));
        }
        if self.database_ids.is_empty() {
            return Err(PipelineError::Config("DATABASE_IDS should be non empty".into()));
        }
        if self.batch_size == 0 {
            return Err(PipelineError::Config("batch_size must be at least 1".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(PipelineError::Config("request_timeout_secs must be at least 1".into()));
        }
        if self.interval_secs == Some(0) {
            return Err(PipelineError::Config("interval_secs must be at least 1".into()));
        }
        for exchange in Exchange::ALL {
            if self.endpoints.get(exchange).trim().is_empty() {
                return Err(PipelineError::Config(format!("missing ticker endpoint for {exchange}")));
            }
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_json(raw: serde_json::Value) -> Settings {
        serde_json::from_value(raw).unwrap()
    }

    #[test]
    fn defaults_match_public_endpoints() {
        let settings = from_json(serde_json::json!({}));
        assert_eq!(settings.batch_size, 10);
        assert_eq!(settings.missing_price, MissingPricePolicy::Skip);
        assert_eq!(settings.properties.price, "CurrentPrice");
        assert_eq!(
            settings.endpoints.get(Exchange::Okx),
            "https://www.okx.com/api/v5/market/tickers?instType=SPOT"
        );
        assert_eq!(settings.notion.base_url, "https://api.notion.com/v1");
    }

    #[test]
    fn database_ids_accept_comma_string_or_list() {
        let joined = from_json(serde_json::json!({"database_ids": "a, b,,c "}));
        assert_eq!(joined.database_ids, ["a", "b", "c"]);

        let list = from_json(serde_json::json!({"database_ids": ["a", "b"]}));
        assert_eq!(list.database_ids, ["a", "b"]);
    }

    #[test]
    fn missing_price_policy_parses() {
        let settings = from_json(serde_json::json!({"missing_price": "clear"}));
        assert_eq!(settings.missing_price, MissingPricePolicy::Clear);
    }

    #[test]
    fn validation_rejects_missing_credentials() {
        let mut settings = Settings {
            database_ids: vec!["db".into()],
            ..Settings::default()
        };
        assert!(matches!(settings.validate(), Err(PipelineError::Config(_))));

        settings.api_key = "secret".into();
        assert!(settings.validate().is_ok());

        settings.database_ids.clear();
        assert!(matches!(settings.validate(), Err(PipelineError::Config(_))));
    }

    #[test]
    fn validation_rejects_zero_batch_size() {
        let settings = Settings {
            api_key: "secret".into(),
            database_ids: vec!["db".into()],
            batch_size: 0,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn validation_rejects_zero_request_timeout() {
        let mut settings = Settings {
            api_key: "secret".into(),
            database_ids: vec!["db".into()],
            request_timeout_secs: 0,
            ..Settings::default()
        };
        assert!(matches!(settings.validate(), Err(PipelineError::Config(ref m)) if m.contains("request_timeout_secs")));

        settings.request_timeout_secs = 1;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn loads_from_file() {
        let dir = std::env::temp_dir().join(format!("ticker-sync-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("settings.toml");
        std::fs::write(
            &path,
            r#"
api_key = "from-file"
database_ids = "db1,db2"
batch_size = 5

[properties]
price = "Price"
"#,
        )
        .unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        // environment may override these on a developer machine
        if std::env::var("NOTION_API_KEY").is_err() {
            assert_eq!(settings.api_key, "from-file");
        }
        if std::env::var("NOTION_DATABASE_IDS").is_err() {
            assert_eq!(settings.database_ids, ["db1", "db2"]);
        }
        assert_eq!(settings.batch_size, 5);
        assert_eq!(settings.properties.price, "Price");
        assert_eq!(settings.properties.symbol, "Symbol");
        std::fs::remove_dir_all(&dir).ok();
    }
}
