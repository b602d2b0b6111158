//! TTL-gated catalog snapshot store.
//!
//! The backend is chosen once, at construction; every operation is bounded by
//! `op_timeout` and failures are logged and reported as misses or `false`.
pub mod file;
pub mod kv;

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::catalog::CatalogRecord;
use crate::error::CacheError;
use crate::util::env::{env_opt, env_parse};

pub use file::FileBackend;
pub use kv::KvBackend;

pub const DEFAULT_TTL_SECS: u64 = 86_400;
pub const DEFAULT_CACHE_KEY: &str = "distros_data";

/// What a backend hands back before any freshness check.
#[derive(Debug, Clone)]
pub struct RawSnapshot {
    pub records: Vec<CatalogRecord>,
    pub written_at: DateTime<Utc>,
}

#[async_trait::async_trait]
pub trait SnapshotBackend: Send + Sync {
    fn kind(&self) -> &'static str;
    async fn load(&self) -> Result<Option<RawSnapshot>, CacheError>;
    async fn store(&self, records: &[CatalogRecord], ttl: Duration) -> Result<(), CacheError>;
    async fn remove(&self) -> Result<(), CacheError>;
}

/// A fresh catalog snapshot as served to readers.
#[derive(Debug, Clone)]
pub struct CacheSnapshot {
    pub records: Vec<CatalogRecord>,
    pub written_at: DateTime<Utc>,
}

impl CacheSnapshot {
    pub fn age(&self) -> Duration {
        (Utc::now() - self.written_at).to_std().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKind {
    File,
    Kv,
}

impl CacheKind {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "file" | "local" => Some(CacheKind::File),
            "redis" | "kv" | "upstash" => Some(CacheKind::Kv),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub kind: CacheKind,
    pub ttl: Duration,
    pub dir: PathBuf,
    pub key: String,
    pub kv_url: Option<String>,
    pub kv_token: Option<String>,
    pub op_timeout: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            kind: CacheKind::File,
            ttl: Duration::from_secs(DEFAULT_TTL_SECS),
            dir: PathBuf::from("data/cache"),
            key: DEFAULT_CACHE_KEY.to_string(),
            kv_url: None,
            kv_token: None,
            op_timeout: Duration::from_secs(10),
        }
    }
}

impl CacheConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let kind = match env_opt("CACHE_TYPE") {
            Some(raw) => CacheKind::parse(&raw).unwrap_or_else(|| {
                warn!(cache_type = %raw, "cache: unknown CACHE_TYPE; using file");
                CacheKind::File
            }),
            None => defaults.kind,
        };
        Self {
            kind,
            ttl: Duration::from_secs(env_parse("TTL_SECONDS", DEFAULT_TTL_SECS)),
            dir: env_opt("CACHE_DIR").map(PathBuf::from).unwrap_or(defaults.dir),
            key: env_opt("CACHE_KEY").unwrap_or(defaults.key),
            kv_url: env_opt("UPSTASH_REDIS_REST_URL"),
            kv_token: env_opt("UPSTASH_REDIS_REST_TOKEN"),
            op_timeout: Duration::from_secs(env_parse("CACHE_OP_TIMEOUT_SECS", 10u64)),
        }
    }
}

pub struct CatalogCache {
    backend: Box<dyn SnapshotBackend>,
    /// Local file swept alongside a remote backend on `clear`.
    local: Option<FileBackend>,
    ttl: Duration,
    op_timeout: Duration,
}

impl CatalogCache {
    pub fn from_config(cfg: &CacheConfig) -> Self {
        let file = FileBackend::new(&cfg.dir);
        let backend: Box<dyn SnapshotBackend> = match cfg.kind {
            CacheKind::File => Box::new(file.clone()),
            CacheKind::Kv => {
                let url = cfg.kv_url.as_deref().unwrap_or_default();
                let token = cfg.kv_token.as_deref().unwrap_or_default();
                match KvBackend::new(url, token, &cfg.key, cfg.ttl, cfg.op_timeout) {
                    Ok(kv) => Box::new(kv),
                    Err(err) => {
                        warn!(error = %err, "cache: remote backend unavailable; falling back to file");
                        Box::new(file.clone())
                    }
                }
            }
        };
        let local = (backend.kind() != "file").then_some(file);
        info!(
            backend = backend.kind(),
            ttl_secs = cfg.ttl.as_secs(),
            "cache: backend selected"
        );
        Self {
            backend,
            local,
            ttl: cfg.ttl,
            op_timeout: cfg.op_timeout,
        }
    }

    pub fn with_backend(backend: Box<dyn SnapshotBackend>, ttl: Duration, op_timeout: Duration) -> Self {
        Self {
            backend,
            local: None,
            ttl,
            op_timeout,
        }
    }

    pub fn backend_kind(&self) -> &'static str {
        self.backend.kind()
    }

    async fn bounded<T, F>(&self, fut: F) -> Result<T, CacheError>
    where
        F: Future<Output = Result<T, CacheError>>,
    {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(CacheError::Timeout(self.op_timeout)),
        }
    }

    /// Fresh snapshot, or `None` on miss, expiry or any backend failure.
    pub async fn read(&self) -> Option<CacheSnapshot> {
        let raw = match self.bounded(self.backend.load()).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(backend = self.backend.kind(), "cache: miss");
                return None;
            }
            Err(err) => {
                warn!(backend = self.backend.kind(), error = %err, "cache: read failed");
                return None;
            }
        };
        let snapshot = CacheSnapshot {
            records: raw.records,
            written_at: raw.written_at,
        };
        let age = snapshot.age();
        if age > self.ttl {
            debug!(
                age_secs = age.as_secs(),
                ttl_secs = self.ttl.as_secs(),
                "cache: snapshot expired"
            );
            return None;
        }
        debug!(records = snapshot.records.len(), age_secs = age.as_secs(), "cache: hit");
        Some(snapshot)
    }

    /// Replace the snapshot. Returns `false` (after logging) on failure.
    pub async fn write(&self, records: &[CatalogRecord]) -> bool {
        match self.bounded(self.backend.store(records, self.ttl)).await {
            Ok(()) => {
                info!(backend = self.backend.kind(), records = records.len(), "cache: snapshot written");
                true
            }
            Err(err) => {
                warn!(backend = self.backend.kind(), error = %err, "cache: write failed");
                false
            }
        }
    }

    /// Best effort; clearing an empty cache is fine.
    pub async fn clear(&self) {
        if let Err(err) = self.bounded(self.backend.remove()).await {
            warn!(backend = self.backend.kind(), error = %err, "cache: clear failed");
        }
        if let Some(local) = &self.local {
            if let Err(err) = self.bounded(local.remove()).await {
                warn!(error = %err, "cache: clearing local file failed");
            }
        }
        info!(backend = self.backend.kind(), "cache: cleared");
    }
}
