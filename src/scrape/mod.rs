//! Paced scraping of the public distribution index.
pub mod extract;
pub mod fetcher;
pub mod identity;
pub mod merge;
pub mod pacing;
pub mod reconcile;
pub mod static_data;

pub use extract::{extract_fields, ScrapedFields};
pub use fetcher::{ScrapeOutcome, ScraperConfig, StealthFetcher};
pub use merge::{merge_scraped, parse_scrape_fields, ScrapeField, ALL_SCRAPE_FIELDS};
pub use pacing::{PacingGate, PacingSettings};
pub use reconcile::IdentifierReconciler;
