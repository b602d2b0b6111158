use std::time::Duration;

use reqwest::Client;
use tracing::{info, warn};

use crate::catalog::CatalogRecord;
use crate::error::IngestError;
use crate::sources::SourceRowParser;
use crate::util::env::{env_opt, env_parse};

pub const DEFAULT_SHEET_ID: &str = "1ObKRlMRWtABnau6lZTT6en1BajVkV6m2LtLhXEHZ_Zk";
pub const DEFAULT_SHEET_NAME: &str = "distrowiki_complete";

/// The authoritative feed the orchestrator refreshes from.
#[async_trait::async_trait]
pub trait PrimarySource: Send + Sync {
    fn name(&self) -> &str;

    /// Full pull. Transport failures and an empty feed are the only errors.
    async fn pull(&self) -> Result<Vec<CatalogRecord>, IngestError>;
}

#[derive(Debug, Clone)]
pub struct SheetConfig {
    pub sheet_id: String,
    pub sheet_name: String,
    /// Replaces the export URL built from id + name.
    pub csv_url: Option<String>,
    pub timeout: Duration,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            sheet_id: DEFAULT_SHEET_ID.to_string(),
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
            csv_url: None,
            timeout: Duration::from_secs(30),
        }
    }
}

impl SheetConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            sheet_id: env_opt("SHEET_ID").unwrap_or(defaults.sheet_id),
            sheet_name: env_opt("SHEET_NAME").unwrap_or(defaults.sheet_name),
            csv_url: env_opt("SHEET_CSV_URL"),
            timeout: Duration::from_secs(env_parse("HTTP_TIMEOUT_SECS", 30u64)),
        }
    }

    pub fn export_url(&self) -> String {
        match &self.csv_url {
            Some(url) => url.clone(),
            None => format!(
                "https://docs.google.com/spreadsheets/d/{}/gviz/tq?tqx=out:csv&sheet={}",
                self.sheet_id,
                urlencoding::encode(&self.sheet_name)
            ),
        }
    }
}

/// Publicly exported spreadsheet read as CSV.
pub struct SheetSource {
    http: Client,
    url: String,
    parser: SourceRowParser,
}

impl SheetSource {
    pub fn new(cfg: &SheetConfig) -> Result<Self, IngestError> {
        let http = Client::builder().timeout(cfg.timeout).build()?;
        Ok(Self {
            http,
            url: cfg.export_url(),
            parser: SourceRowParser::default(),
        })
    }

    pub async fn fetch_raw(&self) -> Result<String, IngestError> {
        let resp = self.http.get(&self.url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), url = %self.url, "sheet: export request failed");
            return Err(IngestError::Http {
                status: status.as_u16(),
                url: self.url.clone(),
            });
        }
        Ok(resp.text().await?)
    }
}

#[async_trait::async_trait]
impl PrimarySource for SheetSource {
    fn name(&self) -> &str {
        "sheet"
    }

    async fn pull(&self) -> Result<Vec<CatalogRecord>, IngestError> {
        let raw = self.fetch_raw().await?;
        let records = self.parser.parse_all(&raw);
        if records.is_empty() {
            return Err(IngestError::Empty);
        }
        info!(records = records.len(), bytes = raw.len(), "sheet: pulled catalog");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{StubResponse, StubServer};

    fn cfg_for(url: String) -> SheetConfig {
        SheetConfig {
            csv_url: Some(url),
            timeout: Duration::from_secs(5),
            ..SheetConfig::default()
        }
    }

    #[test]
    fn builds_gviz_export_url() {
        let cfg = SheetConfig {
            sheet_name: "my sheet".into(),
            ..SheetConfig::default()
        };
        assert_eq!(
            cfg.export_url(),
            format!(
                "https://docs.google.com/spreadsheets/d/{DEFAULT_SHEET_ID}/gviz/tq?tqx=out:csv&sheet=my%20sheet"
            )
        );
    }

    #[tokio::test]
    async fn pulls_and_parses_csv() {
        let server = StubServer::spawn(|_| {
            StubResponse::ok("text/csv", "\"Name\",\"Base\"\n\"Fedora\",\"Fedora\"\n\"Mint\",\"Ubuntu\"\n")
        })
        .await;
        let source = SheetSource::new(&cfg_for(server.url("/export"))).unwrap();
        let records = source.pull().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].id, "mint");
        assert_eq!(server.requests()[0].path, "/export");
    }

    #[tokio::test]
    async fn http_errors_propagate() {
        let server = StubServer::spawn(|_| StubResponse::status(500, "boom")).await;
        let source = SheetSource::new(&cfg_for(server.url("/export"))).unwrap();
        match source.pull().await {
            Err(IngestError::Http { status, .. }) => assert_eq!(status, 500),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn header_only_feed_is_empty() {
        let server = StubServer::spawn(|_| StubResponse::ok("text/csv", "Name,Base\n")).await;
        let source = SheetSource::new(&cfg_for(server.url("/export"))).unwrap();
        assert!(matches!(source.pull().await, Err(IngestError::Empty)));
    }
}
