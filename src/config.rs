use crate::cache::CacheConfig;
use crate::enrich::EnrichConfig;
use crate::orchestrator::AugmentPlan;
use crate::scrape::ScraperConfig;
use crate::sources::SheetConfig;
use crate::util::env::{env_list, init_env, log_config_snapshot};

/// Every environment key the pipeline reads; secrets are redacted when logged.
pub const CONFIG_KEYS: &[&str] = &[
    "CACHE_TYPE",
    "TTL_SECONDS",
    "CACHE_DIR",
    "CACHE_KEY",
    "CACHE_OP_TIMEOUT_SECS",
    "UPSTASH_REDIS_REST_URL",
    "UPSTASH_REDIS_REST_TOKEN",
    "SHEET_ID",
    "SHEET_NAME",
    "SHEET_CSV_URL",
    "HTTP_TIMEOUT_SECS",
    "SCRAPE_URL_TEMPLATE",
    "SCRAPE_MIN_DELAY_MS",
    "SCRAPE_MAX_DELAY_MS",
    "ENRICH_API_KEYS",
    "GROQ_API_KEYS",
    "GROQ_API_KEY",
    "ENRICH_BASE_URL",
    "ENRICH_MODEL",
    "ENRICH_DELAY_MS",
    "AUTO_SCRAPE_FIELDS",
    "AUTO_ENRICH_FIELDS",
    "LOG_SOURCE_LOCATIONS",
];

#[derive(Debug, Clone, Default)]
pub struct CatalogConfig {
    pub cache: CacheConfig,
    pub sheet: SheetConfig,
    pub scraper: ScraperConfig,
    pub enrich: EnrichConfig,
    /// Augmentation applied when a catalog read has to refresh. Empty by default.
    pub auto_plan: AugmentPlan,
}

impl CatalogConfig {
    /// Loads `.env` once, then reads each component's section.
    pub fn from_env() -> Self {
        init_env();
        Self {
            cache: CacheConfig::from_env(),
            sheet: SheetConfig::from_env(),
            scraper: ScraperConfig::from_env(),
            enrich: EnrichConfig::from_env(),
            auto_plan: AugmentPlan::from_names(
                &env_list(&["AUTO_SCRAPE_FIELDS"]),
                &env_list(&["AUTO_ENRICH_FIELDS"]),
            ),
        }
    }

    pub fn log_snapshot(&self) {
        log_config_snapshot("distro-catalog configuration", CONFIG_KEYS);
    }
}
