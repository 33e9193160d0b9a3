//! Result of a navigation query.

use serde::{Deserialize, Serialize};

/// Geodetic and polar description of one query point.
///
/// Caller-owned value; it is filled in by the scan and volume lookups. The
/// `actual_*` fields describe the cell the query snapped to (ray azimuth and
/// start of the bin), while the plain fields describe the query point itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NavigationInfo {
    /// Longitude in radians
    pub lon: f64,
    /// Latitude in radians
    pub lat: f64,
    /// Height above sea level in metres
    pub height: f64,
    /// Height of the beam at the snapped cell
    pub actual_height: f64,
    /// Ground distance from the site in metres
    pub distance: f64,
    /// Slant range along the beam in metres
    pub range: f64,
    /// Range of the snapped bin
    pub actual_range: f64,
    /// Azimuth in radians, clockwise from north
    pub azimuth: f64,
    /// Azimuth of the snapped ray
    pub actual_azimuth: f64,
    /// Elevation angle in radians
    pub elevation: f64,
    /// Index of the scan in a volume
    pub elevation_index: Option<usize>,
    /// Bin (range index)
    pub bin: Option<usize>,
    /// Ray (azimuth index)
    pub ray: Option<usize>,
}

impl NavigationInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the query fell inside a cell.
    pub fn is_valid(&self) -> bool {
        self.bin.is_some() && self.ray.is_some()
    }

    /// The (bin, ray) cell, if the query fell inside one.
    pub fn cell(&self) -> Option<(usize, usize)> {
        Some((self.bin?, self.ray?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_invalid() {
        let info = NavigationInfo::new();
        assert!(!info.is_valid());
        assert_eq!(info.cell(), None);
    }

    #[test]
    fn test_cell() {
        let info = NavigationInfo {
            bin: Some(3),
            ray: Some(7),
            ..Default::default()
        };
        assert!(info.is_valid());
        assert_eq!(info.cell(), Some((3, 7)));
    }

    #[test]
    fn test_json_keeps_missing_indices() {
        let info = NavigationInfo {
            range: 1250.0,
            ray: Some(5),
            ..Default::default()
        };
        let json = serde_json::to_value(info).unwrap();
        assert_eq!(json["ray"], 5);
        assert!(json["bin"].is_null());
        let back: NavigationInfo = serde_json::from_value(json).unwrap();
        assert_eq!(back, info);
    }
}
