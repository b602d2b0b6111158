//! Delimited-text rows -> `CatalogRecord`s.
//!
//! Columns are resolved by lowercase header name, never by position. Each data
//! line is split on its own so a stray quote only damages the row it sits on.
use std::collections::HashMap;

use tracing::{debug, warn};

use crate::catalog::{slug_from_name, CatalogRecord, ReleaseModel, Requirements};
use crate::normalization::{
    clamp_score, map_family, normalize_rating, parse_date, parse_desktops, parse_size_gb,
    parse_year, RatingStrategy,
};

/// Column aliases, first non-empty cell wins.
mod col {
    pub const NAME: &[&str] = &["name"];
    pub const ID: &[&str] = &["distro id", "id"];
    pub const BASE: &[&str] = &["base", "based on"];
    pub const FAMILY: &[&str] = &["family", "base", "based on", "os type"];
    pub const DESKTOP: &[&str] = &["desktop", "desktop environment", "desktops"];
    pub const DESCRIPTION: &[&str] = &["description"];
    pub const OS_TYPE: &[&str] = &["os type"];
    pub const ORIGIN: &[&str] = &["origin"];
    pub const ARCHITECTURE: &[&str] = &["architecture"];
    pub const CATEGORY: &[&str] = &["category"];
    pub const STATUS: &[&str] = &["status"];
    pub const RANKING: &[&str] = &["ranking", "rank", "popularity rank"];
    pub const RATING: &[&str] = &["rating"];
    pub const PRICE: &[&str] = &["price (r$)", "price"];
    pub const HOMEPAGE: &[&str] = &["website", "homepage"];
    pub const LOGO: &[&str] = &["logo url", "logo"];
    pub const IDLE_RAM: &[&str] = &["idle ram usage", "idle ram usage (mb)"];
    pub const CPU_SCORE: &[&str] = &["cpu score"];
    pub const IO_SCORE: &[&str] = &["i/o score", "io score"];
    pub const REQUIREMENTS: &[&str] = &["requirements"];
    pub const PACKAGES: &[&str] = &["package management", "package manager"];
    pub const IMAGE_SIZE: &[&str] = &["image size"];
    pub const OFFICE: &[&str] = &["office suite"];
    pub const INIT: &[&str] = &["init system", "init"];
    pub const RELEASE_MODEL: &[&str] = &["release model", "release type"];
    pub const FILE_SYSTEMS: &[&str] = &["file systems", "filesystems"];
    pub const LATEST_RELEASE: &[&str] = &["latest release", "latest release date", "release date"];
    pub const RELEASE_YEAR: &[&str] = &["release year", "year"];
}

#[derive(Debug, Clone)]
pub struct SourceRowParser {
    delimiter: u8,
}

impl Default for SourceRowParser {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

/// Lowercased, trimmed header names -> column index.
struct HeaderIndex {
    columns: HashMap<String, usize>,
    width: usize,
}

impl HeaderIndex {
    fn new(headers: &[String]) -> Self {
        let mut columns = HashMap::new();
        for (idx, header) in headers.iter().enumerate() {
            columns.entry(header.trim().to_lowercase()).or_insert(idx);
        }
        Self {
            columns,
            width: headers.len(),
        }
    }

    fn has(&self, aliases: &[&str]) -> bool {
        aliases.iter().any(|a| self.columns.contains_key(*a))
    }
}

/// One data row viewed through the header.
struct Row<'a> {
    index: &'a HeaderIndex,
    values: Vec<String>,
}

impl Row<'_> {
    fn get(&self, aliases: &[&str]) -> Option<&str> {
        aliases.iter().find_map(|alias| {
            let idx = *self.index.columns.get(*alias)?;
            let value = self.values.get(idx)?.trim();
            (!value.is_empty()).then_some(value)
        })
    }

    fn text(&self, aliases: &[&str]) -> Option<String> {
        self.get(aliases).map(str::to_string)
    }

    fn list(&self, aliases: &[&str]) -> Vec<String> {
        self.get(aliases)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn positive_int(&self, aliases: &[&str]) -> Option<u32> {
        let raw = self.get(aliases)?;
        let digits: String = raw
            .chars()
            .skip_while(|c| !c.is_ascii_digit())
            .take_while(|c| c.is_ascii_digit())
            .collect();
        digits.parse::<u32>().ok().filter(|v| *v > 0)
    }

    fn score(&self, aliases: &[&str]) -> Option<f64> {
        let raw = self.get(aliases)?.replace(',', ".");
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(clamp_score)
    }
}

impl SourceRowParser {
    /// Parse header + data lines. Never fails on malformed data; bad rows are skipped.
    pub fn parse_all(&self, raw_text: &str) -> Vec<CatalogRecord> {
        let mut lines = raw_text
            .lines()
            .map(|l| l.trim_end_matches('\r'))
            .filter(|l| !l.trim().is_empty());
        let Some(header_line) = lines.next() else {
            return Vec::new();
        };
        let index = HeaderIndex::new(&self.split_line(header_line));
        if !index.has(col::NAME) {
            warn!(header = header_line, "row_parser: header has no name column; nothing to parse");
            return Vec::new();
        }

        let mut records = Vec::new();
        let mut skipped = 0usize;
        for (line_no, line) in lines.enumerate() {
            let mut values = self.split_line(line);
            if values.len() < index.width {
                values.resize(index.width, String::new());
            }
            let row = Row {
                index: &index,
                values,
            };
            match self.parse_row(&row) {
                Some(record) => records.push(record),
                None => {
                    skipped += 1;
                    warn!(line = line_no + 2, "row_parser: row has no name; skipping");
                }
            }
        }
        debug!(parsed = records.len(), skipped, "row_parser: finished");
        records
    }

    /// Quote-aware split of a single line.
    pub fn split_line(&self, line: &str) -> Vec<String> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(self.delimiter)
            .from_reader(line.as_bytes());
        match reader.records().next() {
            Some(Ok(record)) => record.iter().map(|f| f.trim().to_string()).collect(),
            Some(Err(err)) => {
                warn!(error = %err, "row_parser: unsplittable line");
                Vec::new()
            }
            None => Vec::new(),
        }
    }

    fn parse_row(&self, row: &Row<'_>) -> Option<CatalogRecord> {
        let name = row.get(col::NAME)?;
        let mut record = CatalogRecord::new(name);
        if let Some(id) = row.get(col::ID) {
            let slug = slug_from_name(id);
            if !slug.is_empty() {
                record.id = slug;
            }
        }

        record.family = map_family(row.get(col::FAMILY).unwrap_or_default());
        record.based_on = row.text(col::BASE);
        record.desktop_environments = row.get(col::DESKTOP).map(parse_desktops).unwrap_or_default();
        record.description = row.text(col::DESCRIPTION);
        record.os_type = row.text(col::OS_TYPE);
        record.origin = row.text(col::ORIGIN);
        record.architecture = row.list(col::ARCHITECTURE);
        record.category = row.text(col::CATEGORY);
        record.status = row.text(col::STATUS);
        record.ranking = row.positive_int(col::RANKING);
        record.rating = if row.index.has(col::RATING) {
            row.get(col::RATING)
                .and_then(|raw| normalize_rating(raw, RatingStrategy::ZeroToHundred))
        } else {
            row.get(col::PRICE)
                .and_then(|raw| normalize_rating(raw, RatingStrategy::PriceText))
        };
        record.homepage = row.text(col::HOMEPAGE);
        record.logo = row.text(col::LOGO);
        record.idle_ram_usage_mb = row.positive_int(col::IDLE_RAM);
        record.cpu_score = row.score(col::CPU_SCORE);
        record.io_score = row.score(col::IO_SCORE);
        record.requirements = row.get(col::REQUIREMENTS).and_then(Requirements::parse);
        record.package_management = row.text(col::PACKAGES);
        record.image_size_gb = row.get(col::IMAGE_SIZE).and_then(parse_size_gb);
        record.office_suite = row.text(col::OFFICE);
        record.init_system = row.text(col::INIT);
        record.release_model = row.get(col::RELEASE_MODEL).and_then(ReleaseModel::parse);
        record.file_systems = row.list(col::FILE_SYSTEMS);
        record.latest_release_date = row.get(col::LATEST_RELEASE).and_then(parse_date);
        record.release_year = row
            .get(col::RELEASE_YEAR)
            .and_then(parse_year)
            .or_else(|| {
                use chrono::Datelike;
                record.latest_release_date.map(|d| d.year())
            });
        Some(record)
    }
}
