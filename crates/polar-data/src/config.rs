//! Configuration for newly created scans and volumes.

use std::path::Path;

use projection::{EarthModel, PolarNavigator, Projection, LONLAT_DEFINITION};
use radar_common::RadarResult;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Defaults applied when a scan or volume is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolarDataConfig {
    /// Quantity used when a value lookup names no parameter.
    pub default_parameter: String,

    /// Earth shape and refraction used by new navigators.
    pub earth: EarthModel,

    /// Identifier of the default projection.
    pub projection_id: String,

    /// PROJ.4 definition of the default projection.
    pub projection_definition: String,
}

impl Default for PolarDataConfig {
    fn default() -> Self {
        Self {
            default_parameter: "DBZH".to_string(),
            earth: EarthModel::default(),
            projection_id: "lonlat".to_string(),
            projection_definition: LONLAT_DEFINITION.to_string(),
        }
    }
}

impl PolarDataConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("RADAR_DEFAULT_PARAMETER") {
            config.default_parameter = val;
        }

        if let Ok(val) = std::env::var("RADAR_POLE_RADIUS") {
            if let Ok(radius) = val.parse() {
                config.earth.pole_radius = radius;
            }
        }

        if let Ok(val) = std::env::var("RADAR_EQUATOR_RADIUS") {
            if let Ok(radius) = val.parse() {
                config.earth.equator_radius = radius;
            }
        }

        if let Ok(val) = std::env::var("RADAR_DNDH") {
            if let Ok(dndh) = val.parse() {
                config.earth.dndh = dndh;
            }
        }

        if let Ok(val) = std::env::var("RADAR_PROJECTION_DEFINITION") {
            config.projection_definition = val;
        }

        config
    }

    /// Parse configuration from YAML. Missing keys keep their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Read configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.default_parameter.trim().is_empty() {
            return Err("default_parameter must not be empty".to_string());
        }

        if !(self.earth.pole_radius > 0.0) || !(self.earth.equator_radius > 0.0) {
            return Err("earth radii must be > 0".to_string());
        }

        if !self.earth.dndh.is_finite() {
            return Err("dndh must be finite".to_string());
        }

        if let Err(e) = self.projection() {
            return Err(e.to_string());
        }

        Ok(())
    }

    /// A navigator at (0, 0, 0) using the configured earth model.
    pub fn navigator(&self) -> PolarNavigator {
        PolarNavigator::with_earth_model(self.earth)
    }

    /// The configured default projection.
    pub fn projection(&self) -> RadarResult<Projection> {
        Projection::new(
            self.projection_id.clone(),
            self.projection_id.clone(),
            self.projection_definition.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = PolarDataConfig::default();
        assert_eq!(config.default_parameter, "DBZH");
        assert!(config.validate().is_ok());
        assert!(config.projection().unwrap().is_lonlat());
    }

    #[test]
    fn test_from_env() {
        // The only test touching RADAR_* variables; set and cleared in sequence.
        let vars = [
            ("RADAR_DEFAULT_PARAMETER", "TH"),
            ("RADAR_POLE_RADIUS", "6356752"),
            ("RADAR_EQUATOR_RADIUS", "6378137"),
            ("RADAR_DNDH", "not-a-number"),
            ("RADAR_PROJECTION_DEFINITION", "+proj=stere +lat_0=90 +lon_0=14"),
        ];
        for (key, value) in vars {
            std::env::set_var(key, value);
        }
        let config = PolarDataConfig::from_env();
        for (key, _) in vars {
            std::env::remove_var(key);
        }

        assert_eq!(config.default_parameter, "TH");
        assert_eq!(config.earth.pole_radius, 6356752.0);
        assert_eq!(config.earth.equator_radius, 6378137.0);
        // Unparseable numbers keep the default.
        assert_eq!(config.earth.dndh, EarthModel::default().dndh);
        assert!(config.validate().is_ok());
        assert!(!config.projection().unwrap().is_lonlat());

        let unset = PolarDataConfig::from_env();
        assert_eq!(unset.default_parameter, "DBZH");
        assert_eq!(unset.earth, EarthModel::default());
    }

    #[test]
    fn test_from_yaml_keeps_defaults() {
        let config = PolarDataConfig::from_yaml_str(
            "default_parameter: TH\nearth:\n  pole_radius: 6356000.0\n  equator_radius: 6378000.0\n  dndh: 0.0\n",
        )
        .unwrap();
        assert_eq!(config.default_parameter, "TH");
        assert_eq!(config.earth.dndh, 0.0);
        assert_eq!(config.projection_definition, LONLAT_DEFINITION);

        let nav = config.navigator();
        assert_eq!(nav.effective_earth_radius(), nav.earth_radius_origin());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = PolarDataConfig::default();
        config.default_parameter = " ".to_string();
        assert!(config.validate().is_err());

        let mut config = PolarDataConfig::default();
        config.earth.pole_radius = 0.0;
        assert!(config.validate().is_err());

        let mut config = PolarDataConfig::default();
        config.projection_definition = "latlong".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("polar.yaml");
        std::fs::write(&path, "default_parameter: VRADH\n").unwrap();

        let config = PolarDataConfig::from_yaml_file(&path).unwrap();
        assert_eq!(config.default_parameter, "VRADH");
        assert!(PolarDataConfig::from_yaml_file(dir.path().join("missing.yaml")).is_err());
    }

    #[test]
    fn test_invalid_yaml() {
        let err = PolarDataConfig::from_yaml_str("default_parameter: [").unwrap_err();
        assert!(matches!(err, crate::error::PolarDataError::Yaml(_)));
    }
}
