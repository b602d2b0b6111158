//! Field-level normalizers shared by the row parser, the scraper and the enrichment validator.
pub mod date;
pub mod lineage;
pub mod rating;
pub mod size;

pub use date::{parse_date, parse_year};
pub use lineage::{map_desktop, map_family, parse_desktops};
pub use rating::{clamp_score, normalize_rating, normalize_rating_value, RatingStrategy};
pub use size::parse_size_gb;
