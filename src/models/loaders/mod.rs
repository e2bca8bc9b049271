pub mod json_loader;

pub use json_loader::{load_raw_records, parse_raw_records};
