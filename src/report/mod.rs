//! Human-readable rendering of ingest and analysis results.

mod card;
mod generator;

pub use card::friendly_label;
pub use generator::{write_report, SessionReport};
