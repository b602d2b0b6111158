//! Hand-maintained facts for popular distributions, keyed by catalog id.
//!
//! Used only when a scrape fails, and only to fill empty fields the plan asked for.
use std::collections::HashMap;
use std::sync::OnceLock;

use super::merge::ScrapeField;
use crate::catalog::{CatalogRecord, ReleaseModel};

#[derive(Debug, Clone, Copy)]
pub struct StaticFacts {
    pub init_system: &'static str,
    pub file_systems: &'static [&'static str],
    pub release_model: &'static str,
    pub architecture: &'static [&'static str],
}

const fn facts(
    init_system: &'static str,
    file_systems: &'static [&'static str],
    release_model: &'static str,
    architecture: &'static [&'static str],
) -> StaticFacts {
    StaticFacts {
        init_system,
        file_systems,
        release_model,
        architecture,
    }
}

const X64: &[&str] = &["x86_64"];
const X64_ARM: &[&str] = &["x86_64", "ARM64"];
const X64_I686: &[&str] = &["x86_64", "i686"];
const X64_ARM_I686: &[&str] = &["x86_64", "ARM64", "i686"];

const EXT4: &[&str] = &["ext4"];
const BTRFS_EXT4: &[&str] = &["Btrfs", "ext4"];
const BTRFS_EXT4_XFS: &[&str] = &["Btrfs", "ext4", "XFS"];
const EXT4_XFS: &[&str] = &["ext4", "XFS"];
const UBUNTU_FS: &[&str] = &["Btrfs", "ext4", "XFS", "ZFS"];

static STATIC_FACTS: &[(&str, StaticFacts)] = &[
    ("ubuntu", facts("systemd", &["Btrfs", "ext4", "JFS", "ReiserFS", "XFS", "ZFS"], "Point Release", X64_ARM)),
    ("debian", facts("systemd", &["Btrfs", "ext4", "JFS", "ReiserFS", "XFS"], "Point Release", X64_ARM_I686)),
    ("linuxmint", facts("systemd", BTRFS_EXT4_XFS, "Point Release", X64)),
    ("lmde", facts("systemd", BTRFS_EXT4_XFS, "Point Release", X64)),
    ("mxlinux", facts("sysvinit", BTRFS_EXT4_XFS, "Point Release", X64_I686)),
    ("antix", facts("runit, s6, sysvinit", BTRFS_EXT4_XFS, "Point Release", X64_I686)),
    ("popos", facts("systemd", UBUNTU_FS, "Point Release", X64)),
    ("elementary", facts("systemd", EXT4, "Point Release", X64)),
    ("zorin", facts("systemd", EXT4, "Point Release", X64)),
    ("kali", facts("systemd", BTRFS_EXT4_XFS, "Rolling", X64_ARM)),
    ("kubuntu", facts("systemd", UBUNTU_FS, "Point Release", X64)),
    ("xubuntu", facts("systemd", UBUNTU_FS, "Point Release", X64)),
    ("lubuntu", facts("systemd", UBUNTU_FS, "Point Release", X64)),
    ("ubuntumate", facts("systemd", UBUNTU_FS, "Point Release", X64)),
    ("ubuntubudgie", facts("systemd", UBUNTU_FS, "Point Release", X64)),
    ("kdeneon", facts("systemd", EXT4, "Rolling", X64)),
    ("devuan", facts("sysvinit, OpenRC, runit", BTRFS_EXT4_XFS, "Point Release", X64_ARM_I686)),
    ("archlinux", facts("systemd", &["Btrfs", "ext4", "F2FS", "JFS", "ReiserFS", "XFS", "ZFS"], "Rolling", X64)),
    ("manjaro", facts("systemd", BTRFS_EXT4_XFS, "Rolling", X64_ARM)),
    ("endeavouros", facts("systemd", BTRFS_EXT4_XFS, "Rolling", X64)),
    ("garuda", facts("systemd", BTRFS_EXT4, "Rolling", X64)),
    ("artixlinux", facts("OpenRC, runit, s6, dinit", BTRFS_EXT4_XFS, "Rolling", X64)),
    ("cachyos", facts("systemd", BTRFS_EXT4_XFS, "Rolling", X64)),
    ("arcolinux", facts("systemd", BTRFS_EXT4_XFS, "Rolling", X64)),
    ("fedora", facts("systemd", BTRFS_EXT4_XFS, "Point Release", X64_ARM)),
    ("nobara", facts("systemd", BTRFS_EXT4, "Point Release", X64)),
    ("alma", facts("systemd", EXT4_XFS, "LTS", X64_ARM)),
    ("rockylinux", facts("systemd", EXT4_XFS, "LTS", X64_ARM)),
    ("centos", facts("systemd", EXT4_XFS, "LTS", X64_ARM)),
    ("opensuse", facts("systemd", BTRFS_EXT4_XFS, "Point Release", X64_ARM)),
    ("opensusetumbleweed", facts("systemd", BTRFS_EXT4_XFS, "Rolling", X64_ARM)),
    ("nixos", facts("systemd", UBUNTU_FS, "Rolling/Point Release", X64_ARM)),
    ("void", facts("runit", BTRFS_EXT4_XFS, "Rolling", X64_ARM_I686)),
    ("gentoo", facts("OpenRC, systemd", &["Btrfs", "ext4", "JFS", "ReiserFS", "XFS", "ZFS"], "Rolling", X64_ARM_I686)),
    ("solus", facts("systemd", EXT4, "Rolling", X64)),
    ("alpine", facts("OpenRC", BTRFS_EXT4_XFS, "Point Release", X64_ARM_I686)),
    ("deepin", facts("systemd", EXT4, "Point Release", X64)),
    ("peppermint", facts("systemd", EXT4, "Point Release", X64)),
    ("sparky", facts("systemd", BTRFS_EXT4, "Rolling/Point Release", X64_I686)),
    ("bodhi", facts("systemd", EXT4, "Point Release", X64)),
    ("nitrux", facts("systemd", BTRFS_EXT4, "Point Release", X64)),
    ("tails", facts("systemd", EXT4, "Point Release", X64)),
    ("qubes", facts("systemd", EXT4_XFS, "Point Release", X64)),
];

fn index() -> &'static HashMap<&'static str, &'static StaticFacts> {
    static INDEX: OnceLock<HashMap<&'static str, &'static StaticFacts>> = OnceLock::new();
    INDEX.get_or_init(|| STATIC_FACTS.iter().map(|(id, f)| (*id, f)).collect())
}

pub fn lookup(id: &str) -> Option<&'static StaticFacts> {
    index().get(id.trim().to_lowercase().as_str()).copied()
}

impl StaticFacts {
    /// Fill the record's empty fields among `selected`; returns whether anything changed.
    pub fn fill_gaps(&self, record: &mut CatalogRecord, selected: &[ScrapeField]) -> bool {
        let mut changed = false;
        for field in selected {
            changed |= match field {
                ScrapeField::InitSystem if record.init_system.is_none() => {
                    record.init_system = Some(self.init_system.to_string());
                    true
                }
                ScrapeField::FileSystems if record.file_systems.is_empty() => {
                    record.file_systems = self.file_systems.iter().map(|s| s.to_string()).collect();
                    true
                }
                ScrapeField::ReleaseModel if record.release_model.is_none() => {
                    record.release_model = ReleaseModel::parse(self.release_model);
                    true
                }
                ScrapeField::Architecture if record.architecture.is_empty() => {
                    record.architecture = self.architecture.iter().map(|s| s.to_string()).collect();
                    true
                }
                _ => false,
            };
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::KnownReleaseModel;
    use crate::scrape::ALL_SCRAPE_FIELDS;

    #[test]
    fn lookup_is_case_insensitive() {
        assert!(lookup(" ArchLinux ").is_some());
        assert!(lookup("haiku").is_none());
    }

    #[test]
    fn fills_only_empty_fields() {
        let mut record = CatalogRecord::new("Arch Linux");
        record.init_system = Some("dinit".into());
        let changed = lookup("archlinux").unwrap().fill_gaps(&mut record, ALL_SCRAPE_FIELDS);
        assert!(changed);
        assert_eq!(record.init_system.as_deref(), Some("dinit"));
        assert_eq!(
            record.release_model,
            Some(ReleaseModel::Known(KnownReleaseModel::Rolling))
        );
        assert_eq!(record.architecture, vec!["x86_64"]);
        assert!(!lookup("archlinux").unwrap().fill_gaps(&mut record, ALL_SCRAPE_FIELDS));
    }

    #[test]
    fn fills_only_selected_fields() {
        let mut record = CatalogRecord::new("Fedora");
        let facts = lookup("fedora").unwrap();
        assert!(facts.fill_gaps(&mut record, &[ScrapeField::InitSystem, ScrapeField::Ranking]));
        assert_eq!(record.init_system.as_deref(), Some("systemd"));
        assert!(record.file_systems.is_empty());
        assert!(record.release_model.is_none());
        assert!(record.architecture.is_empty());
        assert!(!facts.fill_gaps(&mut record, &[ScrapeField::Ranking, ScrapeField::Origin]));
    }
}
