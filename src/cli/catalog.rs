use anyhow::{bail, Context, Result};
use serde_json::json;
use tracing::info;

use super::print_json;
use crate::cache::CatalogCache;
use crate::config::CatalogConfig;
use crate::orchestrator::{AugmentPlan, IngestionOrchestrator};
use crate::query::CatalogQuery;

#[derive(Debug, Clone, Default)]
pub struct ListConfig {
    pub query: CatalogQuery,
    pub force_refresh: bool,
}

pub async fn run_list(cfg: &CatalogConfig, list: ListConfig) -> Result<()> {
    let orchestrator = IngestionOrchestrator::from_config(cfg).context("building pipeline")?;
    let records = orchestrator
        .get_catalog(list.force_refresh)
        .await
        .context("loading catalog")?;
    print_json(&list.query.apply(&records))
}

pub async fn run_show(cfg: &CatalogConfig, id: &str) -> Result<()> {
    let orchestrator = IngestionOrchestrator::from_config(cfg).context("building pipeline")?;
    match orchestrator.get_by_id(id).await.context("loading catalog")? {
        Some(record) => print_json(&record),
        None => bail!("no distribution with id '{id}'"),
    }
}

pub async fn run_refresh(cfg: &CatalogConfig, plan: AugmentPlan) -> Result<()> {
    let orchestrator = IngestionOrchestrator::from_config(cfg).context("building pipeline")?;
    info!(
        scrape_fields = plan.scrape.len(),
        enrich_fields = plan.enrich.len(),
        "refresh: starting"
    );
    let summary = orchestrator.refresh(&plan).await.context("refreshing catalog")?;
    print_json(&summary)
}

pub async fn run_clear_cache(cfg: &CatalogConfig) -> Result<()> {
    let cache = CatalogCache::from_config(&cfg.cache);
    cache.clear().await;
    print_json(&json!({
        "cleared": true,
        "backend": cache.backend_kind(),
    }))
}
