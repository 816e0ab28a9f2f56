//! Coordinate reference system tags.

use std::fmt;

/// CRS attached to a whole geometry table.
///
/// Only tags are tracked; nothing is ever reprojected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Crs {
    Epsg(u32),
}

impl Crs {
    /// Unprojected longitude/latitude in degrees
    pub const WGS84: Crs = Crs::Epsg(4326);

    /// Parse a CRS name as found in a GeoJSON `crs` member.
    ///
    /// Accepts `EPSG:<code>`, `urn:ogc:def:crs:EPSG::<code>` and the OGC
    /// `CRS84` URN (same datum as EPSG:4326 with lon/lat axis order).
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        let upper = name.to_ascii_uppercase();

        if upper.ends_with(":CRS84") || upper == "CRS84" {
            return Some(Crs::WGS84);
        }

        let code = if let Some(rest) = upper.strip_prefix("EPSG:") {
            rest
        } else if let Some(rest) = upper.strip_prefix("URN:OGC:DEF:CRS:EPSG:") {
            // Optional version segment: EPSG::4326 or EPSG:6.6:4326
            rest.rsplit(':').next().unwrap_or(rest)
        } else {
            return None;
        };

        code.parse().ok().map(Crs::Epsg)
    }
}

impl Default for Crs {
    fn default() -> Self {
        Crs::WGS84
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Crs::Epsg(code) => write!(f, "EPSG:{}", code),
        }
    }
}
