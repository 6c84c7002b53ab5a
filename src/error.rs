use thiserror::Error;

use crate::market_data::adapters::Exchange;
use crate::persist::StoreError;

/// Failure fetching one exchange's ticker payload.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("could not build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("{exchange} ticker request failed: {source}")]
    Transport {
        exchange: Exchange,
        #[source]
        source: reqwest::Error,
    },

    #[error("{exchange} ticker request returned HTTP {status}: {body}")]
    Status {
        exchange: Exchange,
        status: u16,
        body: String,
    },

    #[error("{exchange} ticker request failed: {message}")]
    Other { exchange: Exchange, message: String },
}

/// Everything that aborts a run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("error while fetching ticker prices: {0}")]
    Fetch(#[from] FetchError),

    #[error("no data from {exchange}: extracted zero USDT prices")]
    EmptyExtraction { exchange: Exchange },

    #[error("record names unknown exchange {0:?}")]
    UnknownExchange(String),

    #[error("no prices loaded for {exchange}")]
    MissingExchange { exchange: Exchange },

    #[error("record store error: {0}")]
    Store(#[from] StoreError),

    #[error("{failed} of {size} writes failed in batch {batch} of collection {collection}: {first}")]
    Write {
        collection: String,
        batch: usize,
        size: usize,
        failed: usize,
        #[source]
        first: StoreError,
    },
}

pub type PipelineResult<T> = Result<T, PipelineError>;
