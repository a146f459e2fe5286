//! Projection descriptors and registry codes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GeoError;

/// An EPSG registry code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EpsgCode(u32);

impl EpsgCode {
    /// WGS84 longitude/latitude.
    pub const WGS84: EpsgCode = EpsgCode(4326);

    pub fn new(code: u32) -> Result<Self, GeoError> {
        if code == 0 {
            return Err(GeoError::InvalidEpsg(code.to_string()));
        }
        Ok(Self(code))
    }

    pub fn code(&self) -> u32 {
        self.0
    }

    /// The `EPSG:<code>` form used on engine command lines.
    pub fn authority_string(&self) -> String {
        format!("EPSG:{}", self.0)
    }
}

impl FromStr for EpsgCode {
    type Err = GeoError;

    /// Accepts `3857`, `EPSG:3857` and `epsg:3857`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = match trimmed.split_once(':') {
            Some((authority, code)) if authority.eq_ignore_ascii_case("epsg") => code,
            Some(_) => return Err(GeoError::InvalidEpsg(s.to_string())),
            None => trimmed,
        };
        let code = digits
            .parse::<u32>()
            .map_err(|_| GeoError::InvalidEpsg(s.to_string()))?;
        Self::new(code).map_err(|_| GeoError::InvalidEpsg(s.to_string()))
    }
}

impl fmt::Display for EpsgCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque projection definition as reported by the engine.
///
/// Compared and passed along as text only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectionDescriptor(String);

impl ProjectionDescriptor {
    pub fn new(definition: impl Into<String>) -> Self {
        Self(definition.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_epsg() {
        assert_eq!("3857".parse::<EpsgCode>().unwrap().code(), 3857);
        assert_eq!("EPSG:4326".parse::<EpsgCode>().unwrap(), EpsgCode::WGS84);
        assert_eq!("epsg:32633".parse::<EpsgCode>().unwrap().code(), 32633);
        assert!("CRS:84".parse::<EpsgCode>().is_err());
        assert!("EPSG:abc".parse::<EpsgCode>().is_err());
        assert!("0".parse::<EpsgCode>().is_err());
    }

    #[test]
    fn test_display() {
        let code: EpsgCode = "EPSG:3857".parse().unwrap();
        assert_eq!(code.to_string(), "3857");
        assert_eq!(code.authority_string(), "EPSG:3857");
    }
}
