pub mod loaders;
pub mod study;
pub mod track;

pub use loaders::{load_raw_records, parse_raw_records};
pub use study::{EnrichedStudy, Study};
pub use track::Track;
