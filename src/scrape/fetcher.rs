use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::extract::{extract_fields, ScrapedFields};
use super::identity::Identity;
use super::pacing::{PacingGate, PacingSettings};
use crate::error::FetchError;
use crate::util::env::{env_opt, env_parse};

pub const DEFAULT_URL_TEMPLATE: &str = "https://distrowatch.com/table.php?distribution={id}";

#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// `{id}` is replaced by the url-encoded target id.
    pub url_template: String,
    pub pacing: PacingSettings,
    pub timeout: Duration,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            url_template: DEFAULT_URL_TEMPLATE.to_string(),
            pacing: PacingSettings::default(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl ScraperConfig {
    pub fn from_env() -> Self {
        Self {
            url_template: env_opt("SCRAPE_URL_TEMPLATE")
                .unwrap_or_else(|| DEFAULT_URL_TEMPLATE.to_string()),
            pacing: PacingSettings::from_env("SCRAPE_MIN_DELAY_MS", "SCRAPE_MAX_DELAY_MS", 3_000, 7_000),
            timeout: Duration::from_secs(env_parse("HTTP_TIMEOUT_SECS", 30u64)),
        }
    }
}

/// Result for one target of a batch; `error` is set when nothing could be read.
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeOutcome {
    pub target_id: String,
    #[serde(flatten)]
    pub fields: ScrapedFields,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub scraped_at: DateTime<Utc>,
}

impl ScrapeOutcome {
    pub fn is_populated(&self) -> bool {
        self.error.is_none() && !self.fields.is_empty()
    }
}

/// Paced, identity-rotating page fetcher. One instance is one cookie session.
pub struct StealthFetcher {
    http: Client,
    url_template: String,
    gate: PacingGate,
}

impl StealthFetcher {
    pub fn new(cfg: &ScraperConfig) -> Result<Self, FetchError> {
        let http = Client::builder()
            .cookie_store(true)
            .timeout(cfg.timeout)
            .build()?;
        Ok(Self {
            http,
            url_template: cfg.url_template.clone(),
            gate: PacingGate::new(cfg.pacing),
        })
    }

    pub fn page_url(&self, target_id: &str) -> String {
        self.url_template
            .replace("{id}", &urlencoding::encode(target_id.trim()))
    }

    /// One paced GET; non-200 statuses are errors.
    pub async fn fetch(&self, target_id: &str) -> Result<String, FetchError> {
        self.gate.wait().await;
        let identity = Identity::random(&mut rand::thread_rng());
        let url = self.page_url(target_id);
        let headers = identity.headers(&url)?;
        debug!(
            target_id,
            referer = identity.referer.unwrap_or("-"),
            "scrape: requesting page"
        );
        let resp = self.http.get(&url).headers(headers).send().await?;
        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            return Err(FetchError::Http {
                status: status.as_u16(),
                url,
            });
        }
        Ok(resp.text().await?)
    }

    /// Raw markup, or `None` after logging the failure.
    pub async fn fetch_page(&self, target_id: &str) -> Option<String> {
        match self.fetch(target_id).await {
            Ok(body) => Some(body),
            Err(err) => {
                log_failure(target_id, &err);
                None
            }
        }
    }

    pub async fn scrape(&self, target_id: &str) -> ScrapeOutcome {
        let (fields, error) = match self.fetch(target_id).await {
            Ok(markup) => (extract_fields(&markup), None),
            Err(err) => {
                log_failure(target_id, &err);
                (ScrapedFields::default(), Some(err.to_string()))
            }
        };
        ScrapeOutcome {
            target_id: target_id.to_string(),
            fields,
            error,
            scraped_at: Utc::now(),
        }
    }

    /// Sequential, paced batch. Always one outcome per target, in input order.
    pub async fn fetch_many(&self, target_ids: &[String]) -> Vec<ScrapeOutcome> {
        let total = target_ids.len();
        let mut outcomes = Vec::with_capacity(total);
        for (i, target_id) in target_ids.iter().enumerate() {
            outcomes.push(self.scrape(target_id).await);
            if (i + 1) % 10 == 0 {
                info!(done = i + 1, total, "scrape: batch progress");
            }
        }
        let populated = outcomes.iter().filter(|o| o.is_populated()).count();
        info!(total, populated, "scrape: batch finished");
        outcomes
    }
}

fn log_failure(target_id: &str, err: &FetchError) {
    match err.status() {
        Some(403) => warn!(target_id, status = 403, "scrape: blocked by target"),
        Some(status) => warn!(target_id, status, "scrape: unexpected status"),
        None => warn!(target_id, error = %err, "scrape: request failed"),
    }
}
