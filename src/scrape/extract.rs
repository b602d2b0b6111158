//! Label-anchored field extraction from a distribution page.
//!
//! A label is located by case-insensitive substring match against a list of
//! synonyms; the value is the next `td` after the label cell, or the rest of a
//! `<li><b>Label:</b> value</li>` item. A label that is not present is simply
//! missing.
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

use crate::catalog::record::display_date;
use crate::catalog::ReleaseModel;
use crate::normalization::{normalize_rating, RatingStrategy};

pub mod labels {
    pub const ARCHITECTURE: &[&str] = &["Architecture", "Arquitectura", "Arquitetura"];
    pub const BASED_ON: &[&str] = &["Based on", "Baseado em", "Basado en"];
    pub const ORIGIN: &[&str] = &["Origin", "Origem", "Origen"];
    pub const DESKTOP: &[&str] = &["Desktop", "Ambiente gráfico", "Escritorio"];
    pub const CATEGORY: &[&str] = &["Category", "Categoria", "Categoría"];
    pub const STATUS: &[&str] = &["Status", "Estado"];
    pub const INIT: &[&str] = &["Init Software", "Init"];
    pub const FILE_SYSTEMS: &[&str] = &[
        "File Systems",
        "Filesystems",
        "Sistemas de arquivos",
        "Sistemas de archivos",
    ];
    pub const RELEASE_MODEL: &[&str] = &["Release Model", "Modelo de lançamento", "Modelo de lanzamiento"];
    pub const RANKING: &[&str] = &["Page Hit Ranking"];
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScrapedFields {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub architecture: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub based_on: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desktop: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub init_system: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub file_systems: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_model: Option<ReleaseModel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub popularity_rank: Option<u32>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "display_date::serialize"
    )]
    pub latest_release_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
}

impl ScrapedFields {
    pub fn is_empty(&self) -> bool {
        self == &ScrapedFields::default()
    }
}

fn cell_selector() -> &'static Selector {
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| Selector::parse("td, th").expect("static selector"))
}

fn item_selector() -> &'static Selector {
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| Selector::parse("li").expect("static selector"))
}

fn bold_selector() -> &'static Selector {
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| Selector::parse("b, strong").expect("static selector"))
}

fn release_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:&nbsp;|\x{a0})\s*(?:&bull;|•)\s*(\d{4})-(\d{2})-(\d{2})").expect("static regex")
    })
}

fn visitor_rating_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)average\s+visitor\s+rating.{0,200}?(\d+(?:\.\d+)?)\s*/\s*10").expect("static regex")
    })
}

fn text_of(el: ElementRef<'_>) -> String {
    el.text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn contains_label(text: &str, label: &str) -> bool {
    text.to_lowercase().contains(&label.to_lowercase())
}

/// Innermost table cell carrying the label, then its next `td` sibling.
fn table_value(doc: &Html, label: &str) -> Option<String> {
    let cell = doc.select(cell_selector()).find(|cell| {
        contains_label(&text_of(*cell), label)
            && !cell
                .select(cell_selector())
                .any(|inner| contains_label(&text_of(inner), label))
    })?;
    let value = cell
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "td")?;
    let text = text_of(value);
    (!text.is_empty()).then_some(text)
}

/// `<li><b>Label:</b> value</li>` layout.
fn list_value(doc: &Html, label: &str) -> Option<String> {
    doc.select(item_selector()).find_map(|item| {
        let bold = item.select(bold_selector()).next()?;
        let key = text_of(bold);
        if !contains_label(&key, label) {
            return None;
        }
        let full = text_of(item);
        let rest = full.strip_prefix(&key).unwrap_or(&full);
        let value = rest.trim_start_matches(':').trim();
        (!value.is_empty()).then(|| value.to_string())
    })
}

fn find_value(doc: &Html, synonyms: &[&str]) -> Option<String> {
    synonyms
        .iter()
        .find_map(|label| table_value(doc, label).or_else(|| list_value(doc, label)))
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// First `&bull; YYYY-MM-DD` marker in the raw markup.
pub fn latest_release_date(markup: &str) -> Option<NaiveDate> {
    release_date_re().captures_iter(markup).find_map(|caps| {
        let year = caps.get(1)?.as_str().parse().ok()?;
        let month = caps.get(2)?.as_str().parse().ok()?;
        let day = caps.get(3)?.as_str().parse().ok()?;
        NaiveDate::from_ymd_opt(year, month, day)
    })
}

pub fn extract_fields(markup: &str) -> ScrapedFields {
    let doc = Html::parse_document(markup);
    let page_text = text_of(doc.root_element());

    ScrapedFields {
        architecture: find_value(&doc, labels::ARCHITECTURE)
            .map(|v| split_list(&v))
            .unwrap_or_default(),
        based_on: find_value(&doc, labels::BASED_ON),
        origin: find_value(&doc, labels::ORIGIN),
        desktop: find_value(&doc, labels::DESKTOP),
        category: find_value(&doc, labels::CATEGORY),
        status: find_value(&doc, labels::STATUS),
        init_system: find_value(&doc, labels::INIT),
        file_systems: find_value(&doc, labels::FILE_SYSTEMS)
            .map(|v| split_list(&v))
            .unwrap_or_default(),
        release_model: find_value(&doc, labels::RELEASE_MODEL).and_then(|v| ReleaseModel::parse(&v)),
        popularity_rank: find_value(&doc, labels::RANKING).and_then(|v| {
            let digits: String = v
                .chars()
                .skip_while(|c| !c.is_ascii_digit())
                .take_while(|c| c.is_ascii_digit())
                .collect();
            digits.parse().ok()
        }),
        latest_release_date: latest_release_date(markup),
        rating: visitor_rating_re()
            .captures(&page_text)
            .and_then(|caps| normalize_rating(caps.get(1)?.as_str(), RatingStrategy::ZeroToTen)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::KnownReleaseModel;

    const TABLE_PAGE: &str = r#"
<html><body>
<table class="Outer"><tr><td>
  <table class="Info">
    <tr><th class="Info">Architecture</th><td class="Info">armhf, ppc64el,  x86_64</td></tr>
    <tr><th class="Info">Init Software</th><td class="Info">systemd</td></tr>
    <tr><th class="Info">File Systems</th><td class="Info">ext4, XFS, Btrfs</td></tr>
    <tr><th class="Info">Release Model</th><td class="Info">Fixed</td></tr>
    <tr><th class="Info">Page Hit Ranking</th><td class="Info">#4 (1,234 hpd)</td></tr>
  </table>
</td></tr></table>
<p>Ubuntu 25.10&nbsp;&bull; 2025-10-09: released</p>
<p>Ubuntu 25.04&nbsp;&bull; 2025-04-17: released</p>
<div>Average visitor rating: <b>8.1</b>/10 from 300 reviews</div>
</body></html>"#;

    #[test]
    fn reads_adjacent_cells_from_innermost_label() {
        let fields = extract_fields(TABLE_PAGE);
        assert_eq!(fields.architecture, vec!["armhf", "ppc64el", "x86_64"]);
        assert_eq!(fields.init_system.as_deref(), Some("systemd"));
        assert_eq!(fields.file_systems, vec!["ext4", "XFS", "Btrfs"]);
        assert_eq!(
            fields.release_model,
            Some(ReleaseModel::Known(KnownReleaseModel::PointRelease))
        );
        assert_eq!(fields.popularity_rank, Some(4));
    }

    #[test]
    fn reads_markup_patterns() {
        let fields = extract_fields(TABLE_PAGE);
        assert_eq!(fields.latest_release_date, NaiveDate::from_ymd_opt(2025, 10, 9));
        assert_eq!(fields.rating, Some(8.1));
    }

    #[test]
    fn accepts_label_synonyms_and_list_layout() {
        let page = r#"<ul>
            <li><b>Sistema operativo:</b> Linux</li>
            <li><b>Basado en:</b> Debian (Stable)</li>
            <li><b>Origem:</b> Brasil</li>
            <li><b>Escritorio:</b> KDE Plasma, Xfce</li>
          </ul>
          <table><tr><td>Modelo de lançamento</td><td>Rolling</td></tr></table>"#;
        let fields = extract_fields(page);
        assert_eq!(fields.based_on.as_deref(), Some("Debian (Stable)"));
        assert_eq!(fields.origin.as_deref(), Some("Brasil"));
        assert_eq!(fields.desktop.as_deref(), Some("KDE Plasma, Xfce"));
        assert_eq!(
            fields.release_model,
            Some(ReleaseModel::Known(KnownReleaseModel::Rolling))
        );
    }

    #[test]
    fn missing_labels_are_missing() {
        let fields = extract_fields("<html><body><p>Nothing here</p></body></html>");
        assert!(fields.is_empty());
        let fields = extract_fields("<table><tr><th>Architecture</th></tr></table>");
        assert!(fields.architecture.is_empty());
    }
}
