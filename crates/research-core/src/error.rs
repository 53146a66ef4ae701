use thiserror::Error;

/// Failure modes of a single gather call. Callers must handle each variant:
/// `Network` and `RateLimited` mean "skip this cycle, try next heartbeat",
/// `NoData` is not a failure at all.
#[derive(Error, Debug)]
pub enum GatherError {
    #[error("source unreachable: {0}")]
    Network(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("no data: {0}")]
    NoData(String),
}

impl GatherError {
    /// True for the "nothing new" case that callers treat as an empty result.
    pub fn is_no_data(&self) -> bool {
        matches!(self, GatherError::NoData(_))
    }
}

/// Errors from the flat-file stores (watchlist, schedule).
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt store file {path}: {source}")]
    Corrupt {
        path: String,
        source: serde_json::Error,
    },

    #[error("serialize error: {0}")]
    Serialize(serde_json::Error),
}
