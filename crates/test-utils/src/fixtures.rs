//! Common test fixtures for polar radar tests.
//!
//! This module provides pre-defined radar sites, elevation schemes and
//! configuration snippets used across the test suite.

use std::path::PathBuf;

use tempfile::TempDir;

/// Radar sites with their ODIM source identifiers.
pub mod sites {
    use projection::PolarNavigator;

    /// A radar site given in degrees and metres.
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct RadarSite {
        pub name: &'static str,
        pub source: &'static str,
        pub lon: f64,
        pub lat: f64,
        pub height: f64,
    }

    impl RadarSite {
        /// Navigator placed at this site with the default earth model.
        pub fn navigator(&self) -> PolarNavigator {
            PolarNavigator::at_site(self.lon.to_radians(), self.lat.to_radians(), self.height)
        }

        /// Site position in radians.
        pub fn lon_lat_radians(&self) -> (f64, f64) {
            (self.lon.to_radians(), self.lat.to_radians())
        }
    }

    /// Ängelholm, Sweden
    pub const SEANG: RadarSite = RadarSite {
        name: "seang",
        source: "WMO:02606,RAD:SE50,PLC:Angelholm,NOD:seang",
        lon: 12.8517,
        lat: 56.3675,
        height: 209.0,
    };

    /// Karlskrona, Sweden
    pub const SEKKR: RadarSite = RadarSite {
        name: "sekkr",
        source: "WMO:02666,RAD:SE44,PLC:Karlskrona,NOD:sekkr",
        lon: 15.6102,
        lat: 56.2955,
        height: 88.0,
    };

    /// Vantaa, Finland
    pub const FIVAN: RadarSite = RadarSite {
        name: "fivan",
        source: "WMO:02975,RAD:FI42,PLC:Vantaa,NOD:fivan",
        lon: 24.869,
        lat: 60.2706,
        height: 83.0,
    };

    /// Site at latitude 60, longitude 12, sea level
    pub const REFERENCE: RadarSite = RadarSite {
        name: "reference",
        source: "NOD:reference",
        lon: 12.0,
        lat: 60.0,
        height: 0.0,
    };

    /// All named sites.
    pub const ALL: [RadarSite; 4] = [SEANG, SEKKR, FIVAN, REFERENCE];
}

/// Elevation schemes in degrees.
pub mod elevations {
    /// Three ascending elevations
    pub const SIMPLE: [f64; 3] = [0.5, 1.5, 2.5];

    /// The same elevations out of order
    pub const UNSORTED: [f64; 3] = [1.5, 0.5, 2.5];

    /// A typical operational scheme
    pub const OPERATIONAL: [f64; 10] = [0.5, 1.0, 1.5, 2.0, 2.5, 4.0, 8.0, 14.0, 24.0, 40.0];
}

/// Nominal date and time values.
pub mod time {
    pub const NOMINAL_DATE: &str = "20241019";
    pub const NOMINAL_TIME: &str = "120000";
}

/// Configuration snippets.
pub mod configs {
    /// Quality-control parameter sets.
    pub const QC_PARAMETER_SETS: &str = r#"
- name: SPIKE
  task: fi.fmi.ropo.detector
  parameters:
    threshold: 8
    width: 3
- name: CLEAR
  task: se.smhi.test.clear
  parameters:
    value: 255
"#;

    /// Polar data configuration overriding the default parameter.
    pub const POLAR_DATA_TH: &str = "default_parameter: TH\n";
}

/// Write `contents` to `name` inside a fresh temporary directory.
///
/// Keep the returned `TempDir` alive for as long as the file is needed.
pub fn write_temp_file(name: &str, contents: &str) -> std::io::Result<(TempDir, PathBuf)> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join(name);
    std::fs::write(&path, contents)?;
    Ok((dir, path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sites_are_distinct() {
        for (i, a) in sites::ALL.iter().enumerate() {
            for b in &sites::ALL[i + 1..] {
                assert_ne!(a.name, b.name);
            }
        }
    }

    #[test]
    fn test_site_navigator() {
        let nav = sites::SEANG.navigator();
        let (lon, lat) = sites::SEANG.lon_lat_radians();
        assert_eq!(nav.lon0(), lon);
        assert_eq!(nav.lat0(), lat);
        assert_eq!(nav.alt0(), 209.0);
    }

    #[test]
    fn test_elevation_schemes() {
        assert!(elevations::SIMPLE.windows(2).all(|w| w[0] <= w[1]));
        assert!(!elevations::UNSORTED.windows(2).all(|w| w[0] <= w[1]));
        assert!(elevations::OPERATIONAL.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_write_temp_file() {
        let (_dir, path) = write_temp_file("qc.yaml", configs::QC_PARAMETER_SETS).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("SPIKE"));
    }
}
