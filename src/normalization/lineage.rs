//! Keyword tables mapping free-text lineage and desktop strings onto the closed vocabularies.
//!
//! Matching is case-insensitive substring containment, evaluated in table order.
use itertools::Itertools;

use crate::catalog::{DesktopEnvironment, Family};

/// Ordered: the first keyword contained in the input wins.
pub static FAMILY_KEYWORDS: &[(&str, Family)] = &[
    ("debian", Family::Debian),
    ("ubuntu", Family::Ubuntu),
    ("fedora", Family::Fedora),
    ("red hat", Family::Fedora),
    ("rhel", Family::Fedora),
    ("arch", Family::Arch),
    ("opensuse", Family::OpenSuse),
    ("suse", Family::OpenSuse),
    ("gentoo", Family::Gentoo),
    ("slackware", Family::Slackware),
    ("independent", Family::Independent),
];

pub static DESKTOP_KEYWORDS: &[(&str, DesktopEnvironment)] = &[
    ("gnome", DesktopEnvironment::Gnome),
    ("kde", DesktopEnvironment::Kde),
    ("plasma", DesktopEnvironment::Kde),
    ("xfce", DesktopEnvironment::Xfce),
    ("mate", DesktopEnvironment::Mate),
    ("cinnamon", DesktopEnvironment::Cinnamon),
    ("lxde", DesktopEnvironment::Lxde),
    ("lxqt", DesktopEnvironment::Lxqt),
    ("budgie", DesktopEnvironment::Budgie),
    ("pantheon", DesktopEnvironment::Pantheon),
    ("deepin", DesktopEnvironment::Deepin),
    ("i3", DesktopEnvironment::I3),
    ("sway", DesktopEnvironment::Sway),
];

/// Unrecognized or empty input resolves to `Independent`.
pub fn map_family(raw: &str) -> Family {
    let lower = raw.trim().to_lowercase();
    if lower.is_empty() {
        return Family::Independent;
    }
    FAMILY_KEYWORDS
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map(|(_, family)| *family)
        .unwrap_or(Family::Independent)
}

/// Maps one desktop label; first keyword match wins.
pub fn map_desktop(raw: &str) -> Option<DesktopEnvironment> {
    let lower = raw.trim().to_lowercase();
    if lower.is_empty() {
        return None;
    }
    DESKTOP_KEYWORDS
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map(|(_, de)| *de)
}

/// Comma or slash separated desktop list, deduplicated in first-seen order.
pub fn parse_desktops(raw: &str) -> Vec<DesktopEnvironment> {
    raw.split([',', '/', ';'])
        .filter_map(map_desktop)
        .unique()
        .collect()
}
