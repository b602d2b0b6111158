use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use super::vocab::{DesktopEnvironment, Family, ReleaseModel, Requirements};

/// One distribution's normalized metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub family: Family,
    /// Base distribution exactly as the source wrote it.
    #[serde(default)]
    pub based_on: Option<String>,
    #[serde(default)]
    pub os_type: Option<String>,
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default, deserialize_with = "string_or_list")]
    pub architecture: Vec<String>,
    #[serde(default)]
    pub desktop_environments: Vec<DesktopEnvironment>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub ranking: Option<u32>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub homepage: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub idle_ram_usage_mb: Option<u32>,
    #[serde(default)]
    pub cpu_score: Option<f64>,
    #[serde(default)]
    pub io_score: Option<f64>,
    #[serde(default)]
    pub requirements: Option<Requirements>,
    #[serde(default)]
    pub package_management: Option<String>,
    #[serde(default)]
    pub image_size_gb: Option<f64>,
    #[serde(default)]
    pub office_suite: Option<String>,
    #[serde(default)]
    pub init_system: Option<String>,
    #[serde(default)]
    pub release_model: Option<ReleaseModel>,
    #[serde(default)]
    pub file_systems: Vec<String>,
    #[serde(default, with = "display_date")]
    pub latest_release_date: Option<NaiveDate>,
    #[serde(default)]
    pub release_year: Option<i32>,
}

impl CatalogRecord {
    /// A record with only the required fields set; `id` is derived from `name`.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: slug_from_name(&name),
            name,
            description: None,
            family: Family::default(),
            based_on: None,
            os_type: None,
            origin: None,
            architecture: Vec::new(),
            desktop_environments: Vec::new(),
            category: None,
            status: None,
            ranking: None,
            rating: None,
            homepage: None,
            logo: None,
            idle_ram_usage_mb: None,
            cpu_score: None,
            io_score: None,
            requirements: None,
            package_management: None,
            image_size_gb: None,
            office_suite: None,
            init_system: None,
            release_model: None,
            file_systems: Vec::new(),
            latest_release_date: None,
            release_year: None,
        }
    }

    /// First listed desktop, used as the record's reported UI stack.
    pub fn primary_desktop(&self) -> Option<DesktopEnvironment> {
        self.desktop_environments.first().copied()
    }
}

/// Lowercase, spaces and slashes become hyphens.
pub fn slug_from_name(name: &str) -> String {
    name.trim().to_lowercase().replace([' ', '/'], "-")
}

fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        One(String),
        Many(Vec<String>),
        Missing(()),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::One(s) => s
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect(),
        Raw::Many(v) => v,
        Raw::Missing(()) => Vec::new(),
    })
}

/// `dd/mm/yyyy`, the display format of release dates.
pub mod display_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%d/%m/%Y";

    pub fn serialize<S>(value: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(date) => serializer.serialize_str(&date.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(raw.and_then(|s| crate::normalization::date::parse_date(&s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_slug_from_name() {
        assert_eq!(slug_from_name("Linux Mint"), "linux-mint");
        assert_eq!(slug_from_name("GNU/Linux Libre"), "gnu-linux-libre");
        assert_eq!(CatalogRecord::new("CachyOS").id, "cachyos");
    }

    #[test]
    fn architecture_accepts_string_or_list() {
        let from_str: CatalogRecord =
            serde_json::from_str(r#"{"id":"a","name":"A","architecture":"x86_64, ARM64"}"#)
                .unwrap();
        assert_eq!(from_str.architecture, vec!["x86_64", "ARM64"]);

        let from_list: CatalogRecord =
            serde_json::from_str(r#"{"id":"a","name":"A","architecture":["riscv64"]}"#).unwrap();
        assert_eq!(from_list.architecture, vec!["riscv64"]);

        let from_null: CatalogRecord =
            serde_json::from_str(r#"{"id":"a","name":"A","architecture":null}"#).unwrap();
        assert!(from_null.architecture.is_empty());
    }

    #[test]
    fn release_date_uses_display_format() {
        let mut record = CatalogRecord::new("Fedora");
        record.latest_release_date = NaiveDate::from_ymd_opt(2025, 11, 24);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["latest_release_date"], "24/11/2025");

        let back: CatalogRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}
