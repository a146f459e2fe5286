//! Common types shared by the png-proj crates.

pub mod error;
pub mod extent;
pub mod keyval;
pub mod projection;
pub mod region;

pub use error::{GeoError, GeoResult};
pub use extent::Extent;
pub use keyval::{parse_key_values, KeyValues};
pub use projection::{EpsgCode, ProjectionDescriptor};
pub use region::Region;
