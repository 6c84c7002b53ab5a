// Convert venue trading-pair identifiers into bare asset symbols and
// wire price strings into floats.

/// Quote suffix shared by binance, bybit and coinex pair names (`BTCUSDT`).
pub const USDT: &str = "USDT";
/// Quote suffix used by okx instrument ids (`BTC-USDT`).
pub const DASH_USDT: &str = "-USDT";

#[derive(Debug, Clone, Copy)]
pub struct Normaliser {
    pub quote_suffix: &'static str,
}

impl Normaliser {
    pub const fn new(quote_suffix: &'static str) -> Self {
        Self { quote_suffix }
    }

    /// Bare, uppercase asset symbol for `pair`, or `None` when the pair is
    /// not quoted in the suffix (or nothing is left once it is stripped).
    pub fn base_symbol(&self, pair: &str) -> Option<String> {
        let base = pair.trim().strip_suffix(self.quote_suffix)?;
        if base.is_empty() {
            return None;
        }
        Some(base.to_ascii_uppercase())
    }
}

/// Parse a venue price string. Anything unparseable becomes NaN so the
/// caller can decide what an unresolved price means.
pub fn parse_price(raw: &str) -> f64 {
    raw.trim().parse::<f64>().unwrap_or(f64::NAN)
}
