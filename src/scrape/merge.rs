//! Folding scraped fields into catalog records.
//!
//! Scraped values sit between the primary source and the static facts in
//! trust: they fill gaps, except ranking and release date, which the target
//! tracks more closely than the sheet does.
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::extract::ScrapedFields;
use crate::catalog::{CatalogRecord, Family};
use crate::normalization::{map_family, parse_desktops};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrapeField {
    Architecture,
    BasedOn,
    Origin,
    Desktop,
    Category,
    Status,
    InitSystem,
    FileSystems,
    ReleaseModel,
    Ranking,
    LatestRelease,
    Rating,
}

pub const ALL_SCRAPE_FIELDS: &[ScrapeField] = &[
    ScrapeField::Architecture,
    ScrapeField::BasedOn,
    ScrapeField::Origin,
    ScrapeField::Desktop,
    ScrapeField::Category,
    ScrapeField::Status,
    ScrapeField::InitSystem,
    ScrapeField::FileSystems,
    ScrapeField::ReleaseModel,
    ScrapeField::Ranking,
    ScrapeField::LatestRelease,
    ScrapeField::Rating,
];

impl ScrapeField {
    pub fn parse(raw: &str) -> Option<Self> {
        let key: String = raw
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        Some(match key.as_str() {
            "architecture" | "arch" => ScrapeField::Architecture,
            "basedon" | "base" => ScrapeField::BasedOn,
            "origin" => ScrapeField::Origin,
            "desktop" | "desktopenvironments" => ScrapeField::Desktop,
            "category" => ScrapeField::Category,
            "status" => ScrapeField::Status,
            "initsystem" | "init" | "initsoftware" => ScrapeField::InitSystem,
            "filesystems" => ScrapeField::FileSystems,
            "releasemodel" => ScrapeField::ReleaseModel,
            "ranking" | "rank" | "popularityrank" => ScrapeField::Ranking,
            "latestrelease" | "latestreleasedate" | "releasedate" => ScrapeField::LatestRelease,
            "rating" => ScrapeField::Rating,
            _ => return None,
        })
    }
}

/// `all` selects every scrape field; unknown names are skipped with a warning.
pub fn parse_scrape_fields(raw: &[String]) -> Vec<ScrapeField> {
    if raw.iter().any(|r| r.trim().eq_ignore_ascii_case("all")) {
        return ALL_SCRAPE_FIELDS.to_vec();
    }
    let mut out: Vec<ScrapeField> = Vec::new();
    for name in raw {
        match ScrapeField::parse(name) {
            Some(field) if !out.contains(&field) => out.push(field),
            Some(_) => {}
            None => warn!(field = %name, "unknown scrape field"),
        }
    }
    out
}

/// Copy the selected scraped fields into `record`; returns whether anything changed.
pub fn merge_scraped(record: &mut CatalogRecord, scraped: &ScrapedFields, selected: &[ScrapeField]) -> bool {
    let mut changed = false;
    for field in selected {
        changed |= match field {
            ScrapeField::Architecture => fill_list(&mut record.architecture, &scraped.architecture),
            ScrapeField::BasedOn => {
                let filled = fill(&mut record.based_on, &scraped.based_on);
                // A family the sheet supplied outranks the scraped base.
                if filled && record.family == Family::Independent {
                    if let Some(base) = &record.based_on {
                        record.family = map_family(base);
                    }
                }
                filled
            }
            ScrapeField::Origin => fill(&mut record.origin, &scraped.origin),
            ScrapeField::Desktop => match &scraped.desktop {
                Some(raw) if record.desktop_environments.is_empty() => {
                    record.desktop_environments = parse_desktops(raw);
                    !record.desktop_environments.is_empty()
                }
                _ => false,
            },
            ScrapeField::Category => fill(&mut record.category, &scraped.category),
            ScrapeField::Status => fill(&mut record.status, &scraped.status),
            ScrapeField::InitSystem => fill(&mut record.init_system, &scraped.init_system),
            ScrapeField::FileSystems => fill_list(&mut record.file_systems, &scraped.file_systems),
            ScrapeField::ReleaseModel => fill(&mut record.release_model, &scraped.release_model),
            ScrapeField::Ranking => replace(&mut record.ranking, scraped.popularity_rank),
            ScrapeField::LatestRelease => match scraped.latest_release_date {
                Some(date) if record.latest_release_date.map_or(true, |d| date > d) => {
                    record.latest_release_date = Some(date);
                    record.release_year = Some(chrono::Datelike::year(&date));
                    true
                }
                _ => false,
            },
            // Visitor score is 0-10; the catalog keeps ratings on 0-100.
            ScrapeField::Rating => match scraped.rating {
                Some(score) if record.rating.is_none() => {
                    record.rating = Some((score * 10.0).clamp(0.0, 100.0));
                    true
                }
                _ => false,
            },
        };
    }
    changed
}

fn fill<T: Clone>(slot: &mut Option<T>, value: &Option<T>) -> bool {
    match (slot.is_none(), value) {
        (true, Some(v)) => {
            *slot = Some(v.clone());
            true
        }
        _ => false,
    }
}

fn fill_list(slot: &mut Vec<String>, values: &[String]) -> bool {
    if slot.is_empty() && !values.is_empty() {
        *slot = values.to_vec();
        true
    } else {
        false
    }
}

fn replace<T: PartialEq + Copy>(slot: &mut Option<T>, value: Option<T>) -> bool {
    match value {
        Some(v) if *slot != Some(v) => {
            *slot = Some(v);
            true
        }
        _ => false,
    }
}
