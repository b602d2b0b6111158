use serde::{Deserialize, Serialize};
use std::fmt;

/// Lineage tag of a distribution. Unknown strings resolve to `Independent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Family {
    Debian,
    Ubuntu,
    Fedora,
    Arch,
    #[serde(rename = "openSUSE")]
    OpenSuse,
    Gentoo,
    Slackware,
    #[default]
    #[serde(other)]
    Independent,
}

impl Family {
    pub fn as_str(&self) -> &'static str {
        match self {
            Family::Debian => "Debian",
            Family::Ubuntu => "Ubuntu",
            Family::Fedora => "Fedora",
            Family::Arch => "Arch",
            Family::OpenSuse => "openSUSE",
            Family::Gentoo => "Gentoo",
            Family::Slackware => "Slackware",
            Family::Independent => "Independent",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// UI stack shipped by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DesktopEnvironment {
    #[serde(rename = "GNOME")]
    Gnome,
    #[serde(rename = "KDE Plasma")]
    Kde,
    Xfce,
    #[serde(rename = "MATE")]
    Mate,
    Cinnamon,
    #[serde(rename = "LXDE")]
    Lxde,
    #[serde(rename = "LXQt")]
    Lxqt,
    Budgie,
    Pantheon,
    Deepin,
    #[serde(rename = "i3")]
    I3,
    Sway,
    Custom,
    #[serde(other)]
    Other,
}

impl DesktopEnvironment {
    pub fn as_str(&self) -> &'static str {
        match self {
            DesktopEnvironment::Gnome => "GNOME",
            DesktopEnvironment::Kde => "KDE Plasma",
            DesktopEnvironment::Xfce => "Xfce",
            DesktopEnvironment::Mate => "MATE",
            DesktopEnvironment::Cinnamon => "Cinnamon",
            DesktopEnvironment::Lxde => "LXDE",
            DesktopEnvironment::Lxqt => "LXQt",
            DesktopEnvironment::Budgie => "Budgie",
            DesktopEnvironment::Pantheon => "Pantheon",
            DesktopEnvironment::Deepin => "Deepin",
            DesktopEnvironment::I3 => "i3",
            DesktopEnvironment::Sway => "Sway",
            DesktopEnvironment::Custom => "Custom",
            DesktopEnvironment::Other => "Other",
        }
    }
}

impl fmt::Display for DesktopEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hardware requirement tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Requirements {
    Light,
    #[default]
    Medium,
    High,
}

impl Requirements {
    /// Accepts the English tiers and the Portuguese labels used in the sheet.
    pub fn parse(raw: &str) -> Option<Self> {
        let lower = raw.trim().to_lowercase();
        if lower.is_empty() {
            return None;
        }
        if lower.starts_with("light") || lower.starts_with("leve") || lower == "low" {
            Some(Requirements::Light)
        } else if lower.starts_with("medium") || lower.starts_with("médio") || lower.starts_with("medio") {
            Some(Requirements::Medium)
        } else if lower.starts_with("high") || lower.starts_with("alto") || lower == "heavy" {
            Some(Requirements::High)
        } else {
            None
        }
    }
}

/// How new versions are shipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReleaseModel {
    Known(KnownReleaseModel),
    Text(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KnownReleaseModel {
    Rolling,
    #[serde(rename = "LTS")]
    Lts,
    #[serde(rename = "Point Release")]
    PointRelease,
}

impl ReleaseModel {
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        let lower = trimmed.to_lowercase();
        let known = if lower.contains("rolling") {
            Some(KnownReleaseModel::Rolling)
        } else if lower.contains("lts") {
            Some(KnownReleaseModel::Lts)
        } else if lower.contains("fixed") || lower.contains("point") {
            Some(KnownReleaseModel::PointRelease)
        } else {
            None
        };
        Some(match known {
            Some(k) => ReleaseModel::Known(k),
            None => ReleaseModel::Text(trimmed.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_family_deserializes_to_independent() {
        let f: Family = serde_json::from_str("\"Haiku\"").unwrap();
        assert_eq!(f, Family::Independent);
        let f: Family = serde_json::from_str("\"openSUSE\"").unwrap();
        assert_eq!(f, Family::OpenSuse);
    }

    #[test]
    fn desktop_labels_round_trip() {
        let json = serde_json::to_string(&DesktopEnvironment::Kde).unwrap();
        assert_eq!(json, "\"KDE Plasma\"");
        let back: DesktopEnvironment = serde_json::from_str(&json).unwrap();
        assert_eq!(back, DesktopEnvironment::Kde);
    }

    #[test]
    fn requirements_accept_portuguese_labels() {
        assert_eq!(Requirements::parse("Leve"), Some(Requirements::Light));
        assert_eq!(Requirements::parse("Médio"), Some(Requirements::Medium));
        assert_eq!(Requirements::parse("ALTO"), Some(Requirements::High));
        assert_eq!(Requirements::parse("whatever"), None);
    }

    #[test]
    fn release_model_normalizes_keywords() {
        assert_eq!(
            ReleaseModel::parse("Rolling release"),
            Some(ReleaseModel::Known(KnownReleaseModel::Rolling))
        );
        assert_eq!(
            ReleaseModel::parse("Fixed"),
            Some(ReleaseModel::Known(KnownReleaseModel::PointRelease))
        );
        assert_eq!(
            ReleaseModel::parse("Semi-rolling"),
            Some(ReleaseModel::Known(KnownReleaseModel::Rolling))
        );
        assert_eq!(
            ReleaseModel::parse("Curated"),
            Some(ReleaseModel::Text("Curated".into()))
        );
    }
}
