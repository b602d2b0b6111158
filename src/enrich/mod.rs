//! Generative enrichment of missing catalog fields.
//!
//! One request per name, sequential, with a fixed pause between requests.
//! Credentials are tried in order; only quota-shaped failures move on to the
//! next one.
pub mod backend;
pub mod fields;
pub mod response;
pub mod validate;

use std::sync::Arc;
use std::time::Duration;

use chrono::Datelike;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use tokio::time::sleep;
use tracing::{debug, info, warn};

pub use backend::{ChatBackend, OpenAiCompatBackend};
pub use fields::{parse_enrich_fields, EnrichField, ALL_FIELDS, DEFAULT_FIELDS};

use crate::catalog::{CatalogRecord, Requirements};
use crate::error::BackendError;
use crate::normalization::{parse_date, parse_desktops};
use crate::util::env::{env_list, env_opt, env_parse};
use validate::{validate_field, FieldContext};

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

#[derive(Debug, Clone)]
pub struct EnrichConfig {
    pub credentials: Vec<String>,
    pub base_url: String,
    pub model: String,
    pub delay: Duration,
    pub timeout: Duration,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            credentials: Vec::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            delay: Duration::from_millis(1_500),
            timeout: Duration::from_secs(30),
        }
    }
}

impl EnrichConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            credentials: env_list(&["ENRICH_API_KEYS", "GROQ_API_KEYS", "GROQ_API_KEY"]),
            base_url: env_opt("ENRICH_BASE_URL").unwrap_or(defaults.base_url),
            model: env_opt("ENRICH_MODEL").unwrap_or(defaults.model),
            delay: Duration::from_millis(env_parse("ENRICH_DELAY_MS", 1_500u64)),
            timeout: Duration::from_secs(env_parse("HTTP_TIMEOUT_SECS", 30u64)),
        }
    }
}

/// A name to enrich, optionally with the desktop the catalog already reports.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichRequest {
    pub name: String,
    pub desktop: Option<String>,
}

impl EnrichRequest {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            desktop: None,
        }
    }
}

/// Per-name outcome: validated fields, or the reason there are none.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichmentResult {
    pub name: String,
    #[serde(flatten)]
    pub fields: IndexMap<EnrichField, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EnrichmentResult {
    fn failed(name: &str, error: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            fields: IndexMap::new(),
            error: Some(error.into()),
        }
    }

    pub fn get(&self, field: EnrichField) -> Option<&Value> {
        self.fields.get(&field)
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Fill the record's empty fields from the validated values; returns whether anything changed.
    pub fn fill_record(&self, record: &mut CatalogRecord) -> bool {
        let mut changed = false;
        for (field, value) in &self.fields {
            let text = value.as_str().map(str::trim).filter(|s| !s.is_empty());
            changed |= match field {
                EnrichField::Description => fill_text(&mut record.description, text),
                EnrichField::IdleRamUsage => fill_value(
                    &mut record.idle_ram_usage_mb,
                    value.as_u64().and_then(|v| u32::try_from(v).ok()),
                ),
                EnrichField::CpuScore => fill_value(&mut record.cpu_score, value.as_f64()),
                EnrichField::IoScore => fill_value(&mut record.io_score, value.as_f64()),
                EnrichField::Requirements => {
                    fill_value(&mut record.requirements, text.and_then(Requirements::parse))
                }
                EnrichField::OfficeSuite => fill_text(&mut record.office_suite, text),
                EnrichField::Category => fill_text(&mut record.category, text),
                EnrichField::Desktop => match text {
                    Some(raw) if record.desktop_environments.is_empty() => {
                        record.desktop_environments = parse_desktops(raw);
                        !record.desktop_environments.is_empty()
                    }
                    _ => false,
                },
                EnrichField::ImageSize => fill_value(&mut record.image_size_gb, value.as_f64()),
                EnrichField::Origin => fill_text(&mut record.origin, text),
                EnrichField::Status => fill_text(&mut record.status, text),
                EnrichField::PackageManagement => fill_text(&mut record.package_management, text),
                EnrichField::LatestRelease => match text.and_then(parse_date) {
                    Some(date) if record.latest_release_date.is_none() => {
                        record.latest_release_date = Some(date);
                        record.release_year.get_or_insert(date.year());
                        true
                    }
                    _ => false,
                },
                EnrichField::Website => fill_text(&mut record.homepage, text),
                EnrichField::Unknown => false,
            };
        }
        changed
    }
}

/// Whether `record` still lacks a value for `field`.
pub fn field_missing(record: &CatalogRecord, field: EnrichField) -> bool {
    match field {
        EnrichField::Description => record.description.is_none(),
        EnrichField::IdleRamUsage => record.idle_ram_usage_mb.is_none(),
        EnrichField::CpuScore => record.cpu_score.is_none(),
        EnrichField::IoScore => record.io_score.is_none(),
        EnrichField::Requirements => record.requirements.is_none(),
        EnrichField::OfficeSuite => record.office_suite.is_none(),
        EnrichField::Category => record.category.is_none(),
        EnrichField::Desktop => record.desktop_environments.is_empty(),
        EnrichField::ImageSize => record.image_size_gb.is_none(),
        EnrichField::Origin => record.origin.is_none(),
        EnrichField::Status => record.status.is_none(),
        EnrichField::PackageManagement => record.package_management.is_none(),
        EnrichField::LatestRelease => record.latest_release_date.is_none(),
        EnrichField::Website => record.homepage.is_none(),
        EnrichField::Unknown => false,
    }
}

fn fill_text(slot: &mut Option<String>, value: Option<&str>) -> bool {
    fill_value(slot, value.map(str::to_string))
}

fn fill_value<T>(slot: &mut Option<T>, value: Option<T>) -> bool {
    match value {
        Some(v) if slot.is_none() => {
            *slot = Some(v);
            true
        }
        _ => false,
    }
}

pub fn build_prompt(name: &str, fields: &[EnrichField]) -> String {
    let lines: Vec<String> = fields
        .iter()
        .map(|f| format!("  \"{}\": {}", f.label(), f.prompt()))
        .collect();
    format!(
        "Provide data for the Linux distribution '{name}' as JSON.\n\n\
         RULES:\n\
         1. Respond with ONLY a flat JSON object, no text before or after\n\
         2. Use exactly the keys below and no others\n\
         3. Use your best estimate when exact data is unavailable; never refuse\n\n\
         Return this structure:\n{{\n{}\n}}\n",
        lines.join(",\n")
    )
}

/// Requested selectors with `Unknown` dropped and duplicates removed; empty means the defaults.
pub fn resolve_fields(requested: &[EnrichField]) -> Vec<EnrichField> {
    let mut out: Vec<EnrichField> = Vec::new();
    for field in requested {
        if *field == EnrichField::Unknown {
            warn!("enrich: ignoring unknown field selector");
            continue;
        }
        if !out.contains(field) {
            out.push(*field);
        }
    }
    if out.is_empty() {
        DEFAULT_FIELDS.to_vec()
    } else {
        out
    }
}

pub struct EnrichmentValidator {
    backend: Arc<dyn ChatBackend>,
    credentials: Vec<String>,
    delay: Duration,
}

impl EnrichmentValidator {
    pub fn new(backend: Arc<dyn ChatBackend>, credentials: Vec<String>, delay: Duration) -> Self {
        Self {
            backend,
            credentials,
            delay,
        }
    }

    pub fn from_config(cfg: &EnrichConfig) -> Result<Self, BackendError> {
        let backend = OpenAiCompatBackend::new(&cfg.base_url, &cfg.model, cfg.timeout)?;
        Ok(Self::new(Arc::new(backend), cfg.credentials.clone(), cfg.delay))
    }

    pub fn has_credentials(&self) -> bool {
        !self.credentials.is_empty()
    }

    /// Convenience for bare names.
    pub async fn enrich_names(&self, names: &[String], fields: &[EnrichField]) -> Vec<EnrichmentResult> {
        let requests: Vec<EnrichRequest> = names.iter().map(EnrichRequest::named).collect();
        self.enrich(&requests, fields).await
    }

    /// Exactly one result per request, in order.
    pub async fn enrich(&self, requests: &[EnrichRequest], fields: &[EnrichField]) -> Vec<EnrichmentResult> {
        let fields = resolve_fields(fields);
        let mut results = Vec::with_capacity(requests.len());
        for (i, request) in requests.iter().enumerate() {
            if i > 0 && !self.delay.is_zero() {
                sleep(self.delay).await;
            }
            let result = self.enrich_one(request, &fields).await;
            match &result.error {
                Some(err) => warn!(name = %request.name, error = %err, "enrich: failed"),
                None => debug!(name = %request.name, fields = result.fields.len(), "enrich: ok"),
            }
            results.push(result);
        }
        let ok = results.iter().filter(|r| r.is_ok()).count();
        info!(total = results.len(), ok, "enrich: batch finished");
        results
    }

    async fn enrich_one(&self, request: &EnrichRequest, fields: &[EnrichField]) -> EnrichmentResult {
        if self.credentials.is_empty() {
            return EnrichmentResult::failed(&request.name, "no enrichment credentials configured");
        }
        let prompt = build_prompt(&request.name, fields);
        for (idx, credential) in self.credentials.iter().enumerate() {
            match self.backend.complete(credential, &prompt).await {
                Ok(completion) => return self.interpret(request, fields, &completion),
                Err(err) if err.should_rotate_credential() => {
                    warn!(
                        name = %request.name,
                        credential_index = idx,
                        error = %err,
                        "enrich: credential exhausted; rotating"
                    );
                }
                Err(err) => return EnrichmentResult::failed(&request.name, err.to_string()),
            }
        }
        EnrichmentResult::failed(&request.name, "all enrichment credentials exhausted")
    }

    fn interpret(&self, request: &EnrichRequest, fields: &[EnrichField], completion: &str) -> EnrichmentResult {
        let object = match response::parse_object(completion) {
            Ok(object) => object,
            Err(reason) => return EnrichmentResult::failed(&request.name, reason),
        };
        let mut raw: IndexMap<EnrichField, Value> = IndexMap::new();
        for (key, value) in object {
            let field = EnrichField::parse(&key);
            if fields.contains(&field) {
                raw.entry(field).or_insert(value);
            } else {
                debug!(name = %request.name, key = %key, "enrich: dropping unrequested key");
            }
        }

        // The catalog's own desktop wins over the model's answer for RAM ranges.
        let answered_desktop = raw
            .get(&EnrichField::Desktop)
            .and_then(Value::as_str)
            .map(str::to_string);
        let desktop = request.desktop.clone().or(answered_desktop);
        let ctx = FieldContext {
            name: &request.name,
            desktop: desktop.as_deref(),
        };

        let mut validated = IndexMap::new();
        for field in fields {
            if let Some(value) = raw.get(field) {
                if let Some(clean) = validate_field(*field, value, &ctx) {
                    validated.insert(*field, clean);
                }
            }
        }
        EnrichmentResult {
            name: request.name.clone(),
            fields: validated,
            error: None,
        }
    }
}
