//! Distribution catalog ingestion: a TTL-gated snapshot cache in front of a
//! spreadsheet source, with optional paced scraping and generative enrichment
//! to fill the fields the sheet leaves empty.
pub mod cache;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod enrich;
pub mod error;
pub mod logging;
pub mod normalization;
pub mod orchestrator;
pub mod query;
pub mod scrape;
pub mod sources;

pub mod util {
    pub mod env;
}

#[cfg(test)]
pub mod test_support;

pub use catalog::CatalogRecord;
pub use config::CatalogConfig;
pub use error::IngestError;
pub use orchestrator::{AugmentPlan, IngestionOrchestrator, RefreshSummary};
