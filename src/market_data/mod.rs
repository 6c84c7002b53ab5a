// Market data module entrypoint
pub mod adapters;     // venue-specific payload schemas + extractors
pub mod normaliser;   // trading pair -> bare asset symbol, price strings -> f64
pub mod price_table;  // exchange -> symbol -> price lookup built once per run

pub use adapters::{Exchange, HttpTickerSource, TickerSource};
pub use price_table::{PriceTable, SymbolPriceMap};
