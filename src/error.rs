use thiserror::Error;

/// Failures that end a catalog request. Only the primary source pull produces these;
/// every other component degrades to "no data" instead.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("primary source http {status} from {url}")]
    Http { status: u16, url: String },
    #[error("primary source network: {0}")]
    Net(#[from] reqwest::Error),
    #[error("primary source returned no data rows")]
    Empty,
    #[error("primary source: {0}")]
    Other(String),
}

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache io: {0}")]
    Io(#[from] std::io::Error),
    #[error("cache json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("cache network: {0}")]
    Net(#[from] reqwest::Error),
    #[error("cache remote error: {0}")]
    Remote(String),
    #[error("cache operation timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("cache backend not configured: {0}")]
    NotConfigured(String),
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("http {status} for {url}")]
    Http { status: u16, url: String },
    #[error("network: {0}")]
    Net(#[from] reqwest::Error),
    #[error("invalid header: {0}")]
    Header(String),
}

impl FetchError {
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Failures of a chat-completion call made during enrichment.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("backend http {status}: {message}")]
    Http { status: u16, message: String },
    #[error("backend network: {0}")]
    Net(#[from] reqwest::Error),
    #[error("backend returned no completion: {0}")]
    Malformed(String),
}

impl BackendError {
    /// Quota and rate-limit rejections are bound to the credential; another key may succeed.
    pub fn should_rotate_credential(&self) -> bool {
        match self {
            BackendError::Http { status: 429, .. } => true,
            BackendError::Http { message, .. } => {
                let lower = message.to_lowercase();
                lower.contains("quota") || lower.contains("limit")
            }
            BackendError::Net(_) | BackendError::Malformed(_) => false,
        }
    }
}
