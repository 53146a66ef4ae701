//! The four research gatherers and the per-ticker pipeline.
//!
//! Each gatherer is a stateless function of `(ticker, company, theme,
//! directive)` to a Markdown [`ResearchReport`]; they share nothing and can
//! run in any order. The pipeline runs a selected set of sources with
//! per-source error isolation and builds the heartbeat notification summary.

pub mod format;
pub mod fundamentals;
pub mod market;
pub mod news;
pub mod pipeline;
pub mod social;

pub use fundamentals::FundamentalsGatherer;
pub use market::MarketGatherer;
pub use news::NewsGatherer;
pub use pipeline::{GatherPipeline, PipelineOutcome, SourceOutcome, SourceResult};
pub use social::SocialGatherer;
