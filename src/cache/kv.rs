//! Remote key-value backend speaking the Upstash Redis REST protocol.
//!
//! Commands map to path segments (`/get/{key}`, `/set/{key}?EX=n`, `/ttl/{key}`,
//! `/del/{key}`); every reply is `{"result": ..}` or `{"error": ".."}`.
use std::time::Duration;

use chrono::Utc;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use tracing::debug;

use super::{RawSnapshot, SnapshotBackend};
use crate::catalog::CatalogRecord;
use crate::error::CacheError;

#[derive(Debug, Clone)]
pub struct KvBackend {
    http: Client,
    base_url: String,
    token: String,
    key: String,
    /// Expiry applied on write; remaining expiry is read back against it.
    ttl: Duration,
}

impl KvBackend {
    pub fn new(
        base_url: &str,
        token: &str,
        key: &str,
        ttl: Duration,
        timeout: Duration,
    ) -> Result<Self, CacheError> {
        if base_url.trim().is_empty() || token.trim().is_empty() {
            return Err(CacheError::NotConfigured(
                "remote url and token are required".into(),
            ));
        }
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            token: token.trim().to_string(),
            key: key.to_string(),
            ttl,
        })
    }

    fn endpoint(&self, command: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url,
            command,
            urlencoding::encode(&self.key)
        )
    }

    async fn call(&self, req: RequestBuilder) -> Result<Value, CacheError> {
        let resp = req.bearer_auth(&self.token).send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        let body: Value = match serde_json::from_str(&text) {
            Ok(v) => v,
            Err(_) if !status.is_success() => {
                return Err(CacheError::Remote(format!("http {}", status.as_u16())))
            }
            Err(err) => return Err(err.into()),
        };
        if let Some(err) = body.get("error").and_then(Value::as_str) {
            return Err(CacheError::Remote(err.to_string()));
        }
        if !status.is_success() {
            return Err(CacheError::Remote(format!("http {}", status.as_u16())));
        }
        Ok(body.get("result").cloned().unwrap_or(Value::Null))
    }
}

#[async_trait::async_trait]
impl SnapshotBackend for KvBackend {
    fn kind(&self) -> &'static str {
        "kv"
    }

    async fn load(&self) -> Result<Option<RawSnapshot>, CacheError> {
        let blob = match self.call(self.http.get(self.endpoint("get"))).await? {
            Value::String(s) => s,
            Value::Null => return Ok(None),
            other => {
                return Err(CacheError::Remote(format!(
                    "unexpected get result: {other}"
                )))
            }
        };
        let records: Vec<CatalogRecord> = serde_json::from_str(&blob)?;

        // Write time is reconstructed from the remaining expiry of the key.
        let remaining = self
            .call(self.http.get(self.endpoint("ttl")))
            .await?
            .as_i64()
            .unwrap_or(-1);
        let elapsed = if remaining < 0 {
            0
        } else {
            (self.ttl.as_secs() as i64 - remaining).max(0)
        };
        let written_at = Utc::now() - chrono::Duration::seconds(elapsed);
        debug!(remaining_secs = remaining, "kv: loaded snapshot");
        Ok(Some(RawSnapshot {
            records,
            written_at,
        }))
    }

    async fn store(&self, records: &[CatalogRecord], ttl: Duration) -> Result<(), CacheError> {
        let blob = serde_json::to_string(records)?;
        let url = format!("{}?EX={}", self.endpoint("set"), ttl.as_secs().max(1));
        self.call(self.http.post(url).body(blob)).await?;
        Ok(())
    }

    async fn remove(&self) -> Result<(), CacheError> {
        self.call(self.http.post(self.endpoint("del"))).await?;
        Ok(())
    }
}
