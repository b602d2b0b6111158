//! Primary catalog feed and its row parser.
pub mod row_parser;
pub mod sheet;

pub use row_parser::SourceRowParser;
pub use sheet::{PrimarySource, SheetConfig, SheetSource};
