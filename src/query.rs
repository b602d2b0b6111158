//! Filtering, sorting and paging over a served catalog.
use std::cmp::Ordering;

use serde::Serialize;

use crate::catalog::CatalogRecord;

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SortKey {
    #[default]
    Name,
    Rating,
    Family,
    Ranking,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogQuery {
    pub family: Option<String>,
    pub sort_by: SortKey,
    pub order: SortOrder,
    pub page: usize,
    pub page_size: usize,
}

impl Default for CatalogQuery {
    fn default() -> Self {
        Self {
            family: None,
            sort_by: SortKey::Name,
            order: SortOrder::Asc,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogPage {
    pub distros: Vec<CatalogRecord>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
}

impl CatalogQuery {
    /// Clamps `page` to at least 1 and `page_size` into `1..=100`.
    pub fn normalized(mut self) -> Self {
        self.page = self.page.max(1);
        self.page_size = self.page_size.clamp(1, MAX_PAGE_SIZE);
        self.family = self
            .family
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty());
        self
    }

    fn matches(&self, record: &CatalogRecord) -> bool {
        match &self.family {
            Some(family) => record.family.as_str().eq_ignore_ascii_case(family),
            None => true,
        }
    }

    pub fn apply(&self, records: &[CatalogRecord]) -> CatalogPage {
        let q = self.clone().normalized();
        let mut hits: Vec<&CatalogRecord> = records.iter().filter(|r| q.matches(r)).collect();
        hits.sort_by(|a, b| compare(a, b, q.sort_by, q.order));
        let total = hits.len();
        let distros = hits
            .into_iter()
            .skip((q.page - 1).saturating_mul(q.page_size))
            .take(q.page_size)
            .cloned()
            .collect();
        CatalogPage {
            distros,
            total,
            page: q.page,
            page_size: q.page_size,
        }
    }
}

fn directed(ord: Ordering, order: SortOrder) -> Ordering {
    match order {
        SortOrder::Asc => ord,
        SortOrder::Desc => ord.reverse(),
    }
}

/// Records without the sort value go last in either direction.
fn optional<T>(a: Option<T>, b: Option<T>, order: SortOrder, cmp: impl Fn(&T, &T) -> Ordering) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => directed(cmp(&x, &y), order),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare(a: &CatalogRecord, b: &CatalogRecord, key: SortKey, order: SortOrder) -> Ordering {
    let by_name = || a.name.to_lowercase().cmp(&b.name.to_lowercase());
    match key {
        SortKey::Name => directed(by_name(), order),
        SortKey::Family => directed(a.family.as_str().cmp(b.family.as_str()), order).then_with(by_name),
        SortKey::Ranking => optional(a.ranking, b.ranking, order, Ord::cmp).then_with(by_name),
        SortKey::Rating => optional(a.rating, b.rating, order, f64::total_cmp).then_with(by_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Family;

    fn catalog() -> Vec<CatalogRecord> {
        let mut out = Vec::new();
        for (name, family, ranking, rating) in [
            ("ubuntu", Family::Ubuntu, Some(4), Some(80.0)),
            ("Debian", Family::Debian, Some(2), Some(90.0)),
            ("Kubuntu", Family::Ubuntu, None, Some(70.0)),
            ("Arch", Family::Arch, Some(1), None),
        ] {
            let mut r = CatalogRecord::new(name);
            r.family = family;
            r.ranking = ranking;
            r.rating = rating;
            out.push(r);
        }
        out
    }

    fn names(page: &CatalogPage) -> Vec<&str> {
        page.distros.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn default_sorts_by_name_case_insensitively() {
        let page = CatalogQuery::default().apply(&catalog());
        assert_eq!(names(&page), vec!["Arch", "Debian", "Kubuntu", "ubuntu"]);
        assert_eq!(page.total, 4);
        assert_eq!(page.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn filters_family_ignoring_case() {
        let q = CatalogQuery {
            family: Some("UBUNTU".into()),
            ..CatalogQuery::default()
        };
        let page = q.apply(&catalog());
        assert_eq!(names(&page), vec!["Kubuntu", "ubuntu"]);
        assert_eq!(page.total, 2);
    }

    #[test]
    fn unranked_records_sort_last() {
        let q = CatalogQuery {
            sort_by: SortKey::Ranking,
            ..CatalogQuery::default()
        };
        assert_eq!(names(&q.apply(&catalog())), vec!["Arch", "Debian", "ubuntu", "Kubuntu"]);

        let q = CatalogQuery {
            sort_by: SortKey::Rating,
            order: SortOrder::Desc,
            ..CatalogQuery::default()
        };
        assert_eq!(names(&q.apply(&catalog())), vec!["Debian", "ubuntu", "Kubuntu", "Arch"]);
    }

    #[test]
    fn pages_are_clamped() {
        let q = CatalogQuery {
            page: 0,
            page_size: 3,
            ..CatalogQuery::default()
        };
        let first = q.apply(&catalog());
        assert_eq!(first.page, 1);
        assert_eq!(first.distros.len(), 3);

        let q = CatalogQuery {
            page: 2,
            page_size: 3,
            ..CatalogQuery::default()
        };
        assert_eq!(names(&q.apply(&catalog())), vec!["ubuntu"]);

        let q = CatalogQuery {
            page: 9,
            page_size: 500,
            ..CatalogQuery::default()
        };
        let empty = q.apply(&catalog());
        assert!(empty.distros.is_empty());
        assert_eq!(empty.total, 4);
        assert_eq!(empty.page_size, MAX_PAGE_SIZE);
    }
}
