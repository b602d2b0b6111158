use serde::{Deserialize, Serialize};

/// Enrichable catalog columns; the serialized label is the column header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnrichField {
    Description,
    #[serde(rename = "Idle RAM Usage")]
    IdleRamUsage,
    #[serde(rename = "CPU Score")]
    CpuScore,
    #[serde(rename = "I/O Score")]
    IoScore,
    Requirements,
    #[serde(rename = "Office Suite")]
    OfficeSuite,
    Category,
    Desktop,
    #[serde(rename = "Image Size")]
    ImageSize,
    Origin,
    Status,
    #[serde(rename = "Package Management")]
    PackageManagement,
    #[serde(rename = "Latest Release")]
    LatestRelease,
    Website,
    #[serde(other)]
    Unknown,
}

pub const ALL_FIELDS: &[EnrichField] = &[
    EnrichField::Description,
    EnrichField::IdleRamUsage,
    EnrichField::CpuScore,
    EnrichField::IoScore,
    EnrichField::Requirements,
    EnrichField::OfficeSuite,
    EnrichField::Category,
    EnrichField::Desktop,
    EnrichField::ImageSize,
    EnrichField::Origin,
    EnrichField::Status,
    EnrichField::PackageManagement,
    EnrichField::LatestRelease,
    EnrichField::Website,
];

pub const DEFAULT_FIELDS: &[EnrichField] = &[
    EnrichField::Desktop,
    EnrichField::IdleRamUsage,
    EnrichField::CpuScore,
    EnrichField::IoScore,
    EnrichField::Requirements,
];

impl EnrichField {
    pub fn label(&self) -> &'static str {
        match self {
            EnrichField::Description => "Description",
            EnrichField::IdleRamUsage => "Idle RAM Usage",
            EnrichField::CpuScore => "CPU Score",
            EnrichField::IoScore => "I/O Score",
            EnrichField::Requirements => "Requirements",
            EnrichField::OfficeSuite => "Office Suite",
            EnrichField::Category => "Category",
            EnrichField::Desktop => "Desktop",
            EnrichField::ImageSize => "Image Size",
            EnrichField::Origin => "Origin",
            EnrichField::Status => "Status",
            EnrichField::PackageManagement => "Package Management",
            EnrichField::LatestRelease => "Latest Release",
            EnrichField::Website => "Website",
            EnrichField::Unknown => "Unknown",
        }
    }

    /// Instruction for the value expected under this key.
    pub fn prompt(&self) -> &'static str {
        match self {
            EnrichField::Description => "a concise description highlighting what sets the distribution apart (max 200 characters)",
            EnrichField::IdleRamUsage => "idle RAM usage in MB with the default desktop environment; an integer only",
            EnrichField::CpuScore => "CPU performance score from 1.0 to 10.0; a decimal number only",
            EnrichField::IoScore => "disk I/O performance score from 1.0 to 10.0; a decimal number only",
            EnrichField::Requirements => "minimum hardware requirements: exactly 'Light' (old PCs, under 2GB RAM), 'Medium' (2-4GB RAM, modern CPU) or 'High' (4GB+ RAM, dedicated GPU or large disk)",
            EnrichField::OfficeSuite => "default office suite included (e.g. LibreOffice, OnlyOffice, none)",
            EnrichField::Category => "main category: Desktop, Server, IoT, Education, Gaming, etc.",
            EnrichField::Desktop => "default desktop environment (GNOME, KDE Plasma, Xfce, etc.)",
            EnrichField::ImageSize => "typical ISO size in GB",
            EnrichField::Origin => "country of origin; 'International' when uncertain",
            EnrichField::Status => "status: Active, Discontinued or Beta",
            EnrichField::PackageManagement => "primary package manager (apt, pacman, dnf, etc.)",
            EnrichField::LatestRelease => "date of the most recent release as DD/MM/YYYY",
            EnrichField::Website => "full URL of the official homepage",
            EnrichField::Unknown => "",
        }
    }

    /// Accepts the column label or a snake/kebab spelling ("cpu_score", "idle-ram-usage").
    pub fn parse(raw: &str) -> Self {
        let wanted = squash(raw);
        ALL_FIELDS
            .iter()
            .copied()
            .find(|f| squash(f.label()) == wanted)
            .or_else(|| match wanted.as_str() {
                "ram" | "ramidle" | "idleram" => Some(EnrichField::IdleRamUsage),
                "cpu" => Some(EnrichField::CpuScore),
                "io" => Some(EnrichField::IoScore),
                "homepage" => Some(EnrichField::Website),
                "releasedate" | "latestreleasedate" => Some(EnrichField::LatestRelease),
                _ => None,
            })
            .unwrap_or(EnrichField::Unknown)
    }
}

/// `all` selects every field. Unknown names become `EnrichField::Unknown`
/// and are dropped by the validator.
pub fn parse_enrich_fields(raw: &[String]) -> Vec<EnrichField> {
    if raw.iter().any(|r| r.trim().eq_ignore_ascii_case("all")) {
        return ALL_FIELDS.to_vec();
    }
    raw.iter().map(|name| EnrichField::parse(name)).collect()
}

impl std::fmt::Display for EnrichField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

fn squash(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_labels_and_aliases() {
        assert_eq!(EnrichField::parse("CPU Score"), EnrichField::CpuScore);
        assert_eq!(EnrichField::parse("cpu_score"), EnrichField::CpuScore);
        assert_eq!(EnrichField::parse("I/O Score"), EnrichField::IoScore);
        assert_eq!(EnrichField::parse("idle-ram-usage"), EnrichField::IdleRamUsage);
        assert_eq!(EnrichField::parse("ram"), EnrichField::IdleRamUsage);
        assert_eq!(EnrichField::parse("favourite colour"), EnrichField::Unknown);
    }

    #[test]
    fn selector_lists_keep_unknown_markers() {
        let names = |list: &[&str]| list.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(
            parse_enrich_fields(&names(&["cpu", "favourite colour"])),
            vec![EnrichField::CpuScore, EnrichField::Unknown]
        );
        assert_eq!(parse_enrich_fields(&names(&["all"])), ALL_FIELDS.to_vec());
    }

    #[test]
    fn serializes_as_column_labels() {
        for field in ALL_FIELDS {
            let json = serde_json::to_string(field).unwrap();
            assert_eq!(json, format!("\"{}\"", field.label()));
        }
        let unknown: EnrichField = serde_json::from_str("\"Mascot\"").unwrap();
        assert_eq!(unknown, EnrichField::Unknown);
    }
}
