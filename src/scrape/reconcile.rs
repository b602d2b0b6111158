//! Catalog id <-> scrape-target id translation.
use std::collections::HashMap;
use std::sync::OnceLock;

/// Catalog id -> scrape-target id, for the ids that differ (and a few that
/// are listed for reference although identical).
static INTERNAL_TO_EXTERNAL: &[(&str, &str)] = &[
    ("archlinux", "arch"),
    ("artixlinux", "artix"),
    ("arcolinux", "arco"),
    ("endeavouros", "endeavour"),
    ("linuxmint", "mint"),
    ("ubuntustudio", "ubuntustudio"),
    ("ubuntukylin", "ubuntukylin"),
    ("ubuntucinnamon", "ubuntucinnamon"),
    ("ubuntuunity", "ubuntuunity"),
    ("mxlinux", "mx"),
    ("popos", "pop"),
    ("pop_os", "pop"),
    ("kdeneon", "neon"),
    ("almalinux", "alma"),
    ("alma", "alma"),
    ("rockylinux", "rocky"),
    ("opensuse", "opensuse"),
    ("opensusetumbleweed", "opensuse"),
    ("opensuselead", "opensuse"),
    ("dragonflybsd", "dragonfly"),
    ("ghostbsd", "ghostbsd"),
    ("truenas", "truenas"),
    ("cachyos", "cachy"),
    ("nobara", "nobara"),
    ("peppermint", "peppermint"),
    ("sparky", "sparky"),
    ("nitrux", "nitrux"),
    ("garuda", "garuda"),
    ("zorin", "zorin"),
    ("solus", "solus"),
    ("void", "void"),
    ("nixos", "nixos"),
    ("gentoo", "gentoo"),
    ("deepin", "deepin"),
    ("elementary", "elementary"),
    ("manjaro", "manjaro"),
    ("fedora", "fedora"),
    ("debian", "debian"),
    ("ubuntu", "ubuntu"),
    ("alpine", "alpine"),
    ("antix", "antix"),
    ("kali", "kali"),
    ("tails", "tails"),
    ("parrot", "parrot"),
    ("qubes", "qubes"),
];

/// Catalog ids with no page on the scrape target.
static KNOWN_ABSENT: &[&str] = &["holoiso", "tigeros", "locos", "anduinos"];

fn forward() -> &'static HashMap<&'static str, &'static str> {
    static MAP: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    MAP.get_or_init(|| INTERNAL_TO_EXTERNAL.iter().copied().collect())
}

/// Scrape-target id -> catalog id. Several catalog ids share an external id
/// ("popos" and "pop_os" both map to "pop"); the first one listed in
/// `INTERNAL_TO_EXTERNAL` wins, later aliases are ignored.
fn reverse() -> &'static HashMap<&'static str, &'static str> {
    static MAP: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    MAP.get_or_init(|| {
        let mut map = HashMap::new();
        for (internal, external) in INTERNAL_TO_EXTERNAL {
            map.entry(*external).or_insert(*internal);
        }
        map
    })
}

fn normalize(id: &str) -> String {
    id.trim().to_lowercase()
}

/// Slug punctuation dropped: "linux-mint" -> "linuxmint".
fn compact(id: &str) -> String {
    id.chars()
        .filter(|c| !matches!(c, '-' | ' ' | '!' | '.'))
        .collect()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IdentifierReconciler;

impl IdentifierReconciler {
    pub fn new() -> Self {
        Self
    }

    pub fn to_external_id(&self, internal_id: &str) -> String {
        let normalized = normalize(internal_id);
        if let Some(external) = forward().get(normalized.as_str()) {
            return external.to_string();
        }
        let compacted = compact(&normalized);
        if let Some(external) = forward().get(compacted.as_str()) {
            return external.to_string();
        }
        if let Some(stripped) = compacted.strip_suffix("linux").filter(|s| !s.is_empty()) {
            return forward()
                .get(stripped)
                .map(|e| e.to_string())
                .unwrap_or_else(|| stripped.to_string());
        }
        if let Some(stripped) = compacted.strip_suffix("os").filter(|s| !s.is_empty()) {
            if let Some(external) = forward().get(stripped) {
                return external.to_string();
            }
        }
        normalized
    }

    pub fn to_internal_id(&self, external_id: &str) -> String {
        let normalized = normalize(external_id);
        reverse()
            .get(normalized.as_str())
            .map(|internal| internal.to_string())
            .unwrap_or(normalized)
    }

    /// Ids the target is known not to have; scraping them only burns a paced request.
    pub fn is_known_absent(&self, internal_id: &str) -> bool {
        let normalized = compact(&normalize(internal_id));
        KNOWN_ABSENT.contains(&normalized.as_str())
    }
}
