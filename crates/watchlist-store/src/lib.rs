//! Flat-file watchlist store.
//!
//! The watchlist is a single JSON document: tracked tickers with per-ticker
//! research directives, plus the global scorer settings. It is read whole and
//! rewritten whole on every mutation; persistence is atomic
//! replace-on-write. There is no mandatory cross-process locking: two
//! concurrent writers is a documented hazard, last rename wins. Cooperating
//! writers can take the advisory [`WatchlistStore::lock`].

mod models;
mod store;

pub use models::{GlobalSettings, Watchlist, WatchlistEntry};
pub use store::WatchlistStore;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatchlistError {
    /// Bad user input: unknown ticker, duplicate add, empty fields.
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] research_core::StoreError),
}
