//! Direct access to the augmentation components, bypassing the cache.
use anyhow::{bail, Context, Result};
use serde::Serialize;

use super::print_json;
use crate::config::CatalogConfig;
use crate::enrich::{EnrichField, EnrichRequest, EnrichmentValidator};
use crate::scrape::{IdentifierReconciler, StealthFetcher};

/// Ids are catalog ids unless `external` is set.
pub async fn run_scrape(cfg: &CatalogConfig, ids: &[String], external: bool) -> Result<()> {
    if ids.is_empty() {
        bail!("no ids given");
    }
    let reconciler = IdentifierReconciler::new();
    let targets: Vec<String> = if external {
        ids.to_vec()
    } else {
        ids.iter().map(|id| reconciler.to_external_id(id)).collect()
    };
    let fetcher = StealthFetcher::new(&cfg.scraper).context("building scraper")?;
    let outcomes = fetcher.fetch_many(&targets).await;
    print_json(&outcomes)
}

pub async fn run_enrich(
    cfg: &CatalogConfig,
    names: &[String],
    fields: &[EnrichField],
    desktop: Option<String>,
) -> Result<()> {
    if names.is_empty() {
        bail!("no names given");
    }
    let validator = EnrichmentValidator::from_config(&cfg.enrich).context("building enrichment backend")?;
    if !validator.has_credentials() {
        bail!("no enrichment credentials; set ENRICH_API_KEYS");
    }
    let requests: Vec<EnrichRequest> = names
        .iter()
        .map(|name| EnrichRequest {
            name: name.clone(),
            desktop: desktop.clone(),
        })
        .collect();
    let results = validator.enrich(&requests, fields).await;
    print_json(&results)
}

#[derive(Debug, Serialize)]
struct IdMapping<'a> {
    input: &'a str,
    internal_id: String,
    external_id: String,
    known_absent: bool,
}

pub fn run_map_id(id: &str, reverse: bool) -> Result<()> {
    let reconciler = IdentifierReconciler::new();
    let internal_id = if reverse {
        reconciler.to_internal_id(id)
    } else {
        id.trim().to_lowercase()
    };
    let external_id = if reverse {
        id.trim().to_lowercase()
    } else {
        reconciler.to_external_id(id)
    };
    let known_absent = reconciler.is_known_absent(&internal_id);
    print_json(&IdMapping {
        input: id,
        internal_id,
        external_id,
        known_absent,
    })
}
