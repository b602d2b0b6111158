//! Catalog domain model: the normalized record and its closed vocabularies.
pub mod record;
pub mod vocab;

pub use record::{slug_from_name, CatalogRecord};
pub use vocab::{DesktopEnvironment, Family, KnownReleaseModel, ReleaseModel, Requirements};
