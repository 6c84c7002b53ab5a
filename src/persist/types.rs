use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}: {body}")]
    Http { url: String, status: u16, body: String },

    #[error("unexpected response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0}")]
    Other(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// One row of an external collection, reduced to the fields the sync joins on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalRecord {
    pub id: String,
    pub symbol: String,
    /// Raw exchange selector; `None` means the default venue.
    pub exchange: Option<String>,
}

impl ExternalRecord {
    pub fn new(id: impl Into<String>, symbol: impl Into<String>, exchange: Option<&str>) -> Self {
        Self {
            id: id.into(),
            symbol: symbol.into(),
            exchange: exchange.map(str::to_string),
        }
    }
}

/// One page of a paginated collection query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordPage {
    pub records: Vec<ExternalRecord>,
    /// Cursor for the following page; `None` on the last page.
    pub next_cursor: Option<String>,
}
