//! Per-request browser identity: user agent, locale and referer drawn independently.
use rand::seq::SliceRandom;
use rand::Rng;
use reqwest::Url;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, DNT, REFERER,
    UPGRADE_INSECURE_REQUESTS, USER_AGENT,
};

use crate::error::FetchError;

pub static USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/118.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_0) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14.0; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_0) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.0.0",
];

pub static ACCEPT_LANGUAGES: &[&str] = &[
    "en-US,en;q=0.9",
    "en-GB,en;q=0.9,en-US;q=0.8",
    "pt-BR,pt;q=0.9,en-US;q=0.8,en;q=0.7",
    "de-DE,de;q=0.9,en;q=0.8",
    "fr-FR,fr;q=0.9,en;q=0.8",
    "es-ES,es;q=0.9,en;q=0.8",
];

/// `None` is a direct navigation.
pub static REFERERS: &[Option<&str>] = &[
    Some("https://www.google.com/"),
    Some("https://www.google.com/search?q=linux+distributions"),
    Some("https://duckduckgo.com/"),
    Some("https://www.bing.com/"),
    Some("https://distrowatch.com/"),
    None,
];

const ACCEPT_HTML: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_agent: &'static str,
    pub accept_language: &'static str,
    pub referer: Option<&'static str>,
}

impl Identity {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            user_agent: USER_AGENTS.choose(rng).copied().unwrap_or(USER_AGENTS[0]),
            accept_language: ACCEPT_LANGUAGES
                .choose(rng)
                .copied()
                .unwrap_or(ACCEPT_LANGUAGES[0]),
            referer: REFERERS.choose(rng).copied().flatten(),
        }
    }

    pub fn fetch_site(&self, target_url: &str) -> &'static str {
        fetch_site(self.referer, target_url)
    }

    /// Browser navigation headers for a request to `target_url`.
    /// Accept-Encoding is left to the client's decompression features.
    pub fn headers(&self, target_url: &str) -> Result<HeaderMap, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, value(self.user_agent)?);
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        headers.insert(ACCEPT_LANGUAGE, value(self.accept_language)?);
        headers.insert(DNT, HeaderValue::from_static("1"));
        headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
        headers.insert(
            HeaderName::from_static("sec-fetch-dest"),
            HeaderValue::from_static("document"),
        );
        headers.insert(
            HeaderName::from_static("sec-fetch-mode"),
            HeaderValue::from_static("navigate"),
        );
        headers.insert(
            HeaderName::from_static("sec-fetch-site"),
            HeaderValue::from_static(self.fetch_site(target_url)),
        );
        headers.insert(
            HeaderName::from_static("sec-fetch-user"),
            HeaderValue::from_static("?1"),
        );
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("max-age=0"));
        if let Some(referer) = self.referer {
            headers.insert(REFERER, value(referer)?);
        }
        Ok(headers)
    }
}

/// `Sec-Fetch-Site` for a navigation from `referer` to `target_url`:
/// none without a referer, same-origin for the target's own pages,
/// same-site when only a `www.` prefix differs, cross-site otherwise.
pub fn fetch_site(referer: Option<&str>, target_url: &str) -> &'static str {
    let Some(referer) = referer else {
        return "none";
    };
    let (Ok(from), Ok(to)) = (Url::parse(referer), Url::parse(target_url)) else {
        return "cross-site";
    };
    if from.origin() == to.origin() {
        return "same-origin";
    }
    let bare = |u: &Url| {
        u.host_str()
            .map(|h| h.trim_start_matches("www.").to_ascii_lowercase())
    };
    match (bare(&from), bare(&to)) {
        (Some(a), Some(b)) if a == b && from.scheme() == to.scheme() => "same-site",
        _ => "cross-site",
    }
}

fn value(raw: &str) -> Result<HeaderValue, FetchError> {
    HeaderValue::from_str(raw).map_err(|e| FetchError::Header(format!("{raw:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const TARGET: &str = "https://distrowatch.com/table.php?distribution=debian";

    #[test]
    fn fetch_metadata_matches_referer() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut saw_direct = false;
        let mut saw_referred = false;
        for _ in 0..200 {
            let identity = Identity::random(&mut rng);
            let headers = identity.headers(TARGET).unwrap();
            let site = headers.get("sec-fetch-site").unwrap().to_str().unwrap();
            match headers.get(REFERER) {
                Some(referer) => {
                    saw_referred = true;
                    let referer = referer.to_str().unwrap();
                    let expected = if referer.starts_with("https://distrowatch.com") {
                        "same-origin"
                    } else {
                        "cross-site"
                    };
                    assert_eq!(site, expected);
                }
                None => {
                    saw_direct = true;
                    assert_eq!(site, "none");
                }
            }
            assert!(USER_AGENTS.contains(&identity.user_agent));
            assert!(ACCEPT_LANGUAGES.contains(&identity.accept_language));
        }
        assert!(saw_direct && saw_referred);
    }

    #[test]
    fn fetch_site_compares_referer_and_target_origins() {
        let own = Identity {
            user_agent: USER_AGENTS[0],
            accept_language: ACCEPT_LANGUAGES[0],
            referer: Some("https://distrowatch.com/"),
        };
        assert_eq!(own.fetch_site(TARGET), "same-origin");
        assert_eq!(fetch_site(Some("https://www.distrowatch.com/"), TARGET), "same-site");
        assert_eq!(fetch_site(Some("https://www.google.com/"), TARGET), "cross-site");
        assert_eq!(fetch_site(Some("http://distrowatch.com/"), TARGET), "cross-site");
        assert_eq!(fetch_site(None, TARGET), "none");
        assert_eq!(fetch_site(Some("not a url"), TARGET), "cross-site");
    }

    #[test]
    fn identities_vary_between_draws() {
        let mut rng = StdRng::seed_from_u64(42);
        let agents: std::collections::HashSet<_> = (0..50)
            .map(|_| Identity::random(&mut rng).user_agent)
            .collect();
        assert!(agents.len() > 1);
    }
}
