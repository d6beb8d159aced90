//! Materializes on which dates each service of a transit feed runs.
//!
//! The weekly schedules of `calendar.txt` are expanded into dates, the exceptions of
//! `calendar_dates.txt` are applied on top, and the result replaces the content of a
//! [fact_store::FactStore].

pub mod configuration;
pub mod fact_store;
pub mod refresh;

pub use configuration::Configuration;
pub use fact_store::{FactStore, MemoryFactStore, SqliteFactStore};
pub use refresh::{load_records, refresh, RefreshSummary};
