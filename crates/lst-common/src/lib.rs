//! Common types shared across the LST climate-risk pipeline crates.

pub mod bbox;
pub mod region;
pub mod time;

pub use bbox::{BboxError, BoundingBox};
pub use region::{builtin_regions, find_region, Region};
pub use time::{parse_timestamp, DateRange, TimeParseError};
