//! Serve from cache, else pull the primary source, optionally augment, then commit.
//!
//! A request starts in `Cached`. A miss, an expired snapshot or a forced
//! refresh moves it to `Refreshing`; a plan with scrape or enrich fields adds
//! an `Augmenting` pass. The snapshot is written before it is returned.
//! Only a failed primary pull reaches the caller as an error.
//!
//! Two requests that miss at the same time will both refresh; the last cache
//! write wins.
use std::sync::Arc;
use std::time::Instant;

use indexmap::IndexMap;
use itertools::Itertools;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cache::CatalogCache;
use crate::catalog::{CatalogRecord, Family};
use crate::config::CatalogConfig;
use crate::enrich::{field_missing, parse_enrich_fields, EnrichField, EnrichRequest, EnrichmentValidator};
use crate::error::IngestError;
use crate::scrape::{
    merge_scraped, parse_scrape_fields, static_data, IdentifierReconciler, ScrapeField, StealthFetcher,
};
use crate::sources::{PrimarySource, SheetSource};

const TOP_RANKED: usize = 10;

/// Which fields an augmentation pass should try to fill. Empty means none.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AugmentPlan {
    pub scrape: Vec<ScrapeField>,
    pub enrich: Vec<EnrichField>,
}

impl AugmentPlan {
    /// Builds a plan from field names as given on the command line or in
    /// `AUTO_SCRAPE_FIELDS` / `AUTO_ENRICH_FIELDS`.
    pub fn from_names(scrape: &[String], enrich: &[String]) -> Self {
        Self {
            scrape: parse_scrape_fields(scrape),
            enrich: parse_enrich_fields(enrich),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.scrape.is_empty() && self.enrich.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Cached,
    Refreshing,
    Augmenting,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEntry {
    pub ranking: u32,
    pub name: String,
    pub family: Family,
}

/// Report of one refresh run.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshSummary {
    pub source: String,
    pub records: usize,
    pub scrape_failures: usize,
    pub enrich_failures: usize,
    pub duration_ms: u64,
    pub cache_written: bool,
    /// Most common family first.
    pub per_family: IndexMap<String, usize>,
    pub top_ranked: Vec<RankedEntry>,
}

impl RefreshSummary {
    pub fn augmentation_failures(&self) -> usize {
        self.scrape_failures + self.enrich_failures
    }

    fn build(source: &str, records: &[CatalogRecord]) -> Self {
        let per_family = records
            .iter()
            .map(|r| r.family.as_str())
            .counts()
            .into_iter()
            .sorted_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)))
            .map(|(family, n)| (family.to_string(), n))
            .collect();
        let top_ranked = records
            .iter()
            .filter_map(|r| {
                r.ranking.map(|ranking| RankedEntry {
                    ranking,
                    name: r.name.clone(),
                    family: r.family,
                })
            })
            .sorted_by_key(|e| e.ranking)
            .take(TOP_RANKED)
            .collect();
        Self {
            source: source.to_string(),
            records: records.len(),
            scrape_failures: 0,
            enrich_failures: 0,
            duration_ms: 0,
            cache_written: false,
            per_family,
            top_ranked,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct AugmentReport {
    scrape_failures: usize,
    enrich_failures: usize,
}

pub struct IngestionOrchestrator {
    cache: CatalogCache,
    source: Arc<dyn PrimarySource>,
    fetcher: Option<StealthFetcher>,
    enricher: Option<EnrichmentValidator>,
    reconciler: IdentifierReconciler,
    /// Applied when a read refreshes on its own.
    default_plan: AugmentPlan,
}

impl IngestionOrchestrator {
    pub fn new(cache: CatalogCache, source: Arc<dyn PrimarySource>) -> Self {
        Self {
            cache,
            source,
            fetcher: None,
            enricher: None,
            reconciler: IdentifierReconciler::new(),
            default_plan: AugmentPlan::default(),
        }
    }

    /// Wires every component from configuration. Augmentation collaborators
    /// that cannot be built are left out with a warning.
    pub fn from_config(cfg: &CatalogConfig) -> Result<Self, IngestError> {
        let cache = CatalogCache::from_config(&cfg.cache);
        let source = SheetSource::new(&cfg.sheet)?;
        let mut orchestrator = Self::new(cache, Arc::new(source));
        match StealthFetcher::new(&cfg.scraper) {
            Ok(fetcher) => orchestrator = orchestrator.with_fetcher(fetcher),
            Err(err) => warn!(error = %err, "orchestrator: scraper unavailable"),
        }
        match EnrichmentValidator::from_config(&cfg.enrich) {
            Ok(enricher) if enricher.has_credentials() => orchestrator = orchestrator.with_enricher(enricher),
            Ok(_) => debug!("orchestrator: no enrichment credentials; enrichment disabled"),
            Err(err) => warn!(error = %err, "orchestrator: enrichment backend unavailable"),
        }
        if !cfg.auto_plan.is_empty() {
            info!(
                scrape = cfg.auto_plan.scrape.len(),
                enrich = cfg.auto_plan.enrich.len(),
                "orchestrator: reads that refresh will augment"
            );
        }
        Ok(orchestrator.with_default_plan(cfg.auto_plan.clone()))
    }

    pub fn with_fetcher(mut self, fetcher: StealthFetcher) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn with_enricher(mut self, enricher: EnrichmentValidator) -> Self {
        self.enricher = Some(enricher);
        self
    }

    pub fn with_default_plan(mut self, plan: AugmentPlan) -> Self {
        self.default_plan = plan;
        self
    }

    pub fn cache(&self) -> &CatalogCache {
        &self.cache
    }

    /// The catalog, from a fresh snapshot when there is one.
    pub async fn get_catalog(&self, force_refresh: bool) -> Result<Vec<CatalogRecord>, IngestError> {
        if force_refresh {
            transition(PipelineState::Cached, PipelineState::Refreshing, "forced");
        } else if let Some(snapshot) = self.cache.read().await {
            debug!(
                records = snapshot.records.len(),
                age_secs = snapshot.age().as_secs(),
                "orchestrator: serving cached snapshot"
            );
            return Ok(snapshot.records);
        } else {
            transition(PipelineState::Cached, PipelineState::Refreshing, "miss or expired");
        }
        let (records, _) = self.rebuild(&self.default_plan).await?;
        Ok(records)
    }

    /// Case-insensitive lookup by id in the served catalog.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<CatalogRecord>, IngestError> {
        let wanted = id.trim();
        let records = self.get_catalog(false).await?;
        Ok(records.into_iter().find(|r| r.id.eq_ignore_ascii_case(wanted)))
    }

    /// Unconditional refresh with an explicit plan.
    pub async fn refresh(&self, plan: &AugmentPlan) -> Result<RefreshSummary, IngestError> {
        transition(PipelineState::Cached, PipelineState::Refreshing, "refresh job");
        let (_, summary) = self.rebuild(plan).await?;
        Ok(summary)
    }

    async fn rebuild(&self, plan: &AugmentPlan) -> Result<(Vec<CatalogRecord>, RefreshSummary), IngestError> {
        let started = Instant::now();
        let mut records = match self.source.pull().await {
            Ok(records) => records,
            Err(err) => {
                warn!(source = self.source.name(), error = %err, "orchestrator: primary pull failed");
                return Err(err);
            }
        };
        info!(source = self.source.name(), records = records.len(), "orchestrator: primary pull ok");

        let report = if plan.is_empty() {
            AugmentReport::default()
        } else {
            transition(PipelineState::Refreshing, PipelineState::Augmenting, "fields requested");
            self.augment(&mut records, plan).await
        };

        let cache_written = self.cache.write(&records).await;
        if !cache_written {
            warn!("orchestrator: serving a snapshot that was not committed to cache");
        }

        let mut summary = RefreshSummary::build(self.source.name(), &records);
        summary.scrape_failures = report.scrape_failures;
        summary.enrich_failures = report.enrich_failures;
        summary.cache_written = cache_written;
        summary.duration_ms = started.elapsed().as_millis() as u64;
        info!(
            records = summary.records,
            scrape_failures = summary.scrape_failures,
            enrich_failures = summary.enrich_failures,
            duration_ms = summary.duration_ms,
            "orchestrator: refresh finished"
        );
        for (family, count) in &summary.per_family {
            debug!(family = %family, count, "orchestrator: family count");
        }
        Ok((records, summary))
    }

    async fn augment(&self, records: &mut [CatalogRecord], plan: &AugmentPlan) -> AugmentReport {
        let mut report = AugmentReport::default();
        if !plan.scrape.is_empty() {
            report.scrape_failures = self.augment_scraped(records, &plan.scrape).await;
        }
        if !plan.enrich.is_empty() {
            report.enrich_failures = self.augment_enriched(records, &plan.enrich).await;
        }
        report
    }

    /// Returns how many scrape attempts failed.
    async fn augment_scraped(&self, records: &mut [CatalogRecord], fields: &[ScrapeField]) -> usize {
        let mut targets: Vec<usize> = Vec::new();
        for (idx, record) in records.iter_mut().enumerate() {
            if self.reconciler.is_known_absent(&record.id) {
                debug!(id = %record.id, "orchestrator: not on scrape target; static facts only");
                apply_static_facts(record, fields);
            } else {
                targets.push(idx);
            }
        }

        let Some(fetcher) = &self.fetcher else {
            warn!(targets = targets.len(), "orchestrator: scrape requested without a scraper");
            for &idx in &targets {
                apply_static_facts(&mut records[idx], fields);
            }
            return targets.len();
        };

        let external_ids: Vec<String> = targets
            .iter()
            .map(|&idx| self.reconciler.to_external_id(&records[idx].id))
            .collect();
        let outcomes = fetcher.fetch_many(&external_ids).await;

        let mut failures = 0;
        for (&idx, outcome) in targets.iter().zip(outcomes.iter()) {
            let record = &mut records[idx];
            if outcome.is_populated() {
                merge_scraped(record, &outcome.fields, fields);
            } else {
                failures += 1;
                apply_static_facts(record, fields);
            }
        }
        failures
    }

    /// Returns how many records could not be enriched.
    async fn augment_enriched(&self, records: &mut [CatalogRecord], fields: &[EnrichField]) -> usize {
        let targets: Vec<usize> = records
            .iter()
            .enumerate()
            .filter(|(_, r)| fields.iter().any(|f| field_missing(r, *f)))
            .map(|(idx, _)| idx)
            .collect();
        if targets.is_empty() {
            debug!("orchestrator: nothing to enrich");
            return 0;
        }
        let Some(enricher) = &self.enricher else {
            warn!(targets = targets.len(), "orchestrator: enrichment requested without a backend");
            return targets.len();
        };

        let requests: Vec<EnrichRequest> = targets
            .iter()
            .map(|&idx| EnrichRequest {
                name: records[idx].name.clone(),
                desktop: records[idx].primary_desktop().map(|d| d.as_str().to_string()),
            })
            .collect();
        let results = enricher.enrich(&requests, fields).await;

        let mut failures = 0;
        for (&idx, result) in targets.iter().zip(results.iter()) {
            if result.is_ok() {
                result.fill_record(&mut records[idx]);
            } else {
                failures += 1;
            }
        }
        failures
    }
}

fn apply_static_facts(record: &mut CatalogRecord, fields: &[ScrapeField]) {
    if let Some(facts) = static_data::lookup(&record.id) {
        if facts.fill_gaps(record, fields) {
            debug!(id = %record.id, "orchestrator: filled from static facts");
        }
    }
}

fn transition(from: PipelineState, to: PipelineState, reason: &str) {
    info!(from = ?from, to = ?to, reason, "orchestrator: state change");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheConfig, CacheKind};
    use crate::catalog::DesktopEnvironment;
    use crate::enrich::ChatBackend;
    use crate::error::BackendError;
    use crate::scrape::{PacingSettings, ScraperConfig};
    use crate::test_support::{StubResponse, StubServer};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    struct FixedSource {
        records: Vec<CatalogRecord>,
        fail: bool,
        pulls: AtomicUsize,
    }

    impl FixedSource {
        fn new(records: Vec<CatalogRecord>) -> Arc<Self> {
            Arc::new(Self {
                records,
                fail: false,
                pulls: AtomicUsize::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                records: Vec::new(),
                fail: true,
                pulls: AtomicUsize::new(0),
            })
        }

        fn pulls(&self) -> usize {
            self.pulls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl PrimarySource for FixedSource {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn pull(&self) -> Result<Vec<CatalogRecord>, IngestError> {
            self.pulls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(IngestError::Http {
                    status: 503,
                    url: "http://sheet.invalid".into(),
                })
            } else {
                Ok(self.records.clone())
            }
        }
    }

    struct EchoBackend {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl ChatBackend for EchoBackend {
        async fn complete(&self, _credential: &str, prompt: &str) -> Result<String, BackendError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            if prompt.contains("'Broken'") {
                return Err(BackendError::Http {
                    status: 500,
                    message: "upstream".into(),
                });
            }
            Ok("{\"CPU Score\": 15, \"Idle RAM Usage\": 250}".into())
        }
    }

    fn record(name: &str, family: Family, ranking: Option<u32>) -> CatalogRecord {
        let mut r = CatalogRecord::new(name);
        r.family = family;
        r.ranking = ranking;
        r
    }

    fn file_cache(dir: &tempfile::TempDir) -> CatalogCache {
        CatalogCache::from_config(&CacheConfig {
            kind: CacheKind::File,
            dir: dir.path().to_path_buf(),
            ..CacheConfig::default()
        })
    }

    #[tokio::test]
    async fn second_read_is_served_from_cache() {
        let dir = tempfile::tempdir().unwrap();
        let source = FixedSource::new(vec![record("Debian", Family::Debian, Some(5))]);
        let orch = IngestionOrchestrator::new(file_cache(&dir), source.clone());

        let first = orch.get_catalog(false).await.unwrap();
        let second = orch.get_catalog(false).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(source.pulls(), 1);

        orch.get_catalog(true).await.unwrap();
        assert_eq!(source.pulls(), 2);
    }

    #[tokio::test]
    async fn primary_failure_propagates_and_nothing_is_cached() {
        let dir = tempfile::tempdir().unwrap();
        let orch = IngestionOrchestrator::new(file_cache(&dir), FixedSource::failing());
        let err = orch.get_catalog(false).await.unwrap_err();
        assert!(matches!(err, IngestError::Http { status: 503, .. }));
        assert!(orch.cache().read().await.is_none());
    }

    #[tokio::test]
    async fn get_by_id_ignores_case() {
        let dir = tempfile::tempdir().unwrap();
        let source = FixedSource::new(vec![record("Linux Mint", Family::Ubuntu, None)]);
        let orch = IngestionOrchestrator::new(file_cache(&dir), source);
        let found = orch.get_by_id("LINUX-MINT").await.unwrap();
        assert_eq!(found.map(|r| r.name), Some("Linux Mint".to_string()));
        assert!(orch.get_by_id("haiku").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn reads_that_refresh_apply_the_default_plan() {
        let dir = tempfile::tempdir().unwrap();
        let source = FixedSource::new(vec![record("Debian", Family::Debian, Some(5))]);
        let plan = AugmentPlan::from_names(&["init".to_string()], &[]);
        assert_eq!(plan.scrape, vec![ScrapeField::InitSystem]);
        // No scraper is wired, so the plan falls through to static facts.
        let orch = IngestionOrchestrator::new(file_cache(&dir), source).with_default_plan(plan);

        let records = orch.get_catalog(false).await.unwrap();
        assert_eq!(records[0].init_system.as_deref(), Some("systemd"));
        assert!(records[0].file_systems.is_empty());
        let cached = orch.cache().read().await.unwrap().records;
        assert_eq!(cached, records);
    }

    #[tokio::test]
    async fn scrape_failures_fall_back_to_static_facts() {
        let page = r#"<table><tr><th>Init Software</th><td>dinit</td></tr>
            <tr><th>Page Hit Ranking</th><td>#2</td></tr></table>"#;
        let server = StubServer::spawn(move |req| {
            if req.path.ends_with("=cachy") {
                StubResponse::ok("text/html", page)
            } else {
                StubResponse::status(403, "Forbidden")
            }
        })
        .await;
        let fetcher = StealthFetcher::new(&ScraperConfig {
            url_template: server.url("/table.php?distribution={id}"),
            pacing: PacingSettings::disabled(),
            timeout: Duration::from_secs(5),
        })
        .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let source = FixedSource::new(vec![
            record("CachyOS", Family::Arch, Some(7)),
            record("Debian", Family::Debian, Some(5)),
            record("HoloISO", Family::Arch, None),
        ]);
        let orch = IngestionOrchestrator::new(file_cache(&dir), source).with_fetcher(fetcher);

        let plan = AugmentPlan {
            scrape: vec![ScrapeField::InitSystem, ScrapeField::Ranking],
            enrich: Vec::new(),
        };
        let summary = orch.refresh(&plan).await.unwrap();
        assert_eq!(summary.records, 3);
        assert_eq!(summary.scrape_failures, 1);
        assert!(summary.cache_written);
        // Known-absent ids never hit the target.
        assert_eq!(server.requests().len(), 2);

        let cached = orch.cache().read().await.unwrap().records;
        assert_eq!(cached[0].init_system.as_deref(), Some("dinit"));
        assert_eq!(cached[0].ranking, Some(2));
        assert_eq!(cached[1].init_system.as_deref(), Some("systemd"));
        // Static facts stay inside the requested fields.
        assert!(cached[1].file_systems.is_empty());
        assert!(cached[1].architecture.is_empty());
        assert!(cached[1].release_model.is_none());
        assert!(cached[2].init_system.is_none());
    }

    #[tokio::test]
    async fn enrichment_fills_missing_fields_and_counts_failures() {
        let dir = tempfile::tempdir().unwrap();
        let mut ubuntu = record("Ubuntu", Family::Ubuntu, Some(3));
        ubuntu.desktop_environments = vec![DesktopEnvironment::Gnome];
        let mut complete = record("Complete", Family::Debian, None);
        complete.cpu_score = Some(5.0);
        complete.idle_ram_usage_mb = Some(500);
        let source = FixedSource::new(vec![ubuntu, complete, record("Broken", Family::Independent, None)]);
        let backend = Arc::new(EchoBackend {
            prompts: Mutex::new(Vec::new()),
        });
        let enricher = EnrichmentValidator::new(backend.clone(), vec!["k".into()], Duration::ZERO);
        let orch = IngestionOrchestrator::new(file_cache(&dir), source).with_enricher(enricher);

        let plan = AugmentPlan {
            scrape: Vec::new(),
            enrich: vec![EnrichField::CpuScore, EnrichField::IdleRamUsage],
        };
        let summary = orch.refresh(&plan).await.unwrap();
        assert_eq!(summary.enrich_failures, 1);
        assert_eq!(summary.augmentation_failures(), 1);
        assert_eq!(backend.prompts.lock().unwrap().len(), 2);

        let cached = orch.cache().read().await.unwrap().records;
        assert_eq!(cached[0].cpu_score, Some(10.0));
        assert_eq!(cached[0].idle_ram_usage_mb, Some(900));
        assert_eq!(cached[1].cpu_score, Some(5.0));
        assert!(cached[2].cpu_score.is_none());
    }

    #[tokio::test]
    async fn summary_counts_families_and_top_ranked() {
        let dir = tempfile::tempdir().unwrap();
        let mut records: Vec<CatalogRecord> = (1..=12)
            .map(|i| record(&format!("Distro {i}"), Family::Debian, Some(13 - i)))
            .collect();
        records.push(record("Arch", Family::Arch, None));
        let orch = IngestionOrchestrator::new(file_cache(&dir), FixedSource::new(records));

        let summary = orch.refresh(&AugmentPlan::default()).await.unwrap();
        assert_eq!(summary.records, 13);
        assert_eq!(summary.per_family.get_index(0), Some((&"Debian".to_string(), &12)));
        assert_eq!(summary.per_family.get("Arch"), Some(&1));
        assert_eq!(summary.top_ranked.len(), 10);
        assert_eq!(summary.top_ranked[0].ranking, 1);
        assert_eq!(summary.top_ranked[0].name, "Distro 12");
    }
}
