pub mod colors;
pub mod countries;
pub mod geometry;
pub mod topology;
pub mod visits;

pub use colors::{initials, user_color};
pub use countries::{CountryMeta, TOTAL_COUNTRIES};
pub use geometry::*;
pub use topology::{TopologyError, decode_features};
pub use visits::*;
