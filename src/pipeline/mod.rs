//! The watch pipeline.
//!
//! - `recency`: posted-date text classification
//! - `fetch`: keyword pagination with a page cap and throttle
//! - `filter`: per-run candidate filtering
//! - `diff`: new-entry detection against known-state
//! - `run`: one full pass, `run_watch`

pub mod diff;
pub mod fetch;
pub mod filter;
pub mod recency;
pub mod run;

pub use diff::{DiffEngine, DiffResult};
pub use filter::{FilterPolicy, FilterStats, Rejection, RunFilter};
pub use recency::is_recent;
pub use run::{RunReport, run, run_watch};
