//! Polar navigation around a radar site.
//!
//! Converts between geodetic positions and the radar's polar frame
//! (distance/azimuth along the ground, range/elevation along the beam).
//!
//! The earth is modelled as an ellipsoid of revolution whose local radius at
//! the site latitude is used as a sphere. Beam propagation uses the
//! effective earth radius model: with a refractivity gradient `dndh` the
//! beam travels in a straight line over a sphere of radius
//! `1 / (1/R + dndh)`, which for the standard atmosphere is roughly 4/3 of
//! the true radius.
//!
//! All angles are radians and all lengths metres. The functions are pure and
//! never fail, but are only meaningful for physically sane input (finite,
//! non-negative distances and ranges, elevations within ±90°). Checking that
//! is left to the caller.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use radar_common::{ObjectType, RadarObject};

/// Default polar radius (metres).
pub const DEFAULT_POLE_RADIUS: f64 = 6356780.0;
/// Default equatorial radius (metres).
pub const DEFAULT_EQUATOR_RADIUS: f64 = 6378160.0;
/// Default refractivity gradient (per metre).
pub const DEFAULT_DNDH: f64 = -3.9e-5 / 1000.0;

/// Earth shape and refraction parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EarthModel {
    /// Polar radius in metres
    pub pole_radius: f64,
    /// Equatorial radius in metres
    pub equator_radius: f64,
    /// Refractivity gradient dn/dh per metre
    pub dndh: f64,
}

impl Default for EarthModel {
    fn default() -> Self {
        Self {
            pole_radius: DEFAULT_POLE_RADIUS,
            equator_radius: DEFAULT_EQUATOR_RADIUS,
            dndh: DEFAULT_DNDH,
        }
    }
}

impl EarthModel {
    /// Local earth radius at latitude `lat` (radians).
    pub fn radius_at(&self, lat: f64) -> f64 {
        let a = lat.sin() * self.pole_radius;
        let b = lat.cos() * self.equator_radius;
        (a * a + b * b).sqrt()
    }
}

/// Navigator for one radar site.
///
/// Holds the site position and caches the earth radius at the site and the
/// derived effective radius; both are recomputed whenever the latitude or
/// the earth model changes.
#[derive(Debug, Clone, PartialEq)]
pub struct PolarNavigator {
    /// Site longitude in radians
    lon0: f64,
    /// Site latitude in radians
    lat0: f64,
    /// Site altitude above sea level in metres
    alt0: f64,
    earth: EarthModel,
    /// Earth radius at lat0
    earth_radius_origin: f64,
    /// Effective earth radius for beam propagation
    effective_radius: f64,
}

impl Default for PolarNavigator {
    fn default() -> Self {
        Self::with_earth_model(EarthModel::default())
    }
}

impl RadarObject for PolarNavigator {
    const TYPE: ObjectType = ObjectType::new("PolarNavigator");

    fn clone_object(&self) -> Self {
        self.clone()
    }
}

impl PolarNavigator {
    /// Navigator at (0, 0, 0) with the default earth model.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_earth_model(earth: EarthModel) -> Self {
        let mut nav = Self {
            lon0: 0.0,
            lat0: 0.0,
            alt0: 0.0,
            earth,
            earth_radius_origin: 0.0,
            effective_radius: 0.0,
        };
        nav.update_radii();
        nav
    }

    /// Navigator for a site given in radians and metres.
    pub fn at_site(lon0: f64, lat0: f64, alt0: f64) -> Self {
        let mut nav = Self::new();
        nav.lon0 = lon0;
        nav.alt0 = alt0;
        nav.set_lat0(lat0);
        nav
    }

    fn update_radii(&mut self) {
        self.earth_radius_origin = self.earth.radius_at(self.lat0);
        self.effective_radius = 1.0 / (1.0 / self.earth_radius_origin + self.earth.dndh);
    }

    pub fn lon0(&self) -> f64 {
        self.lon0
    }

    pub fn set_lon0(&mut self, lon0: f64) {
        self.lon0 = lon0;
    }

    pub fn lat0(&self) -> f64 {
        self.lat0
    }

    pub fn set_lat0(&mut self, lat0: f64) {
        self.lat0 = lat0;
        self.update_radii();
    }

    pub fn alt0(&self) -> f64 {
        self.alt0
    }

    pub fn set_alt0(&mut self, alt0: f64) {
        self.alt0 = alt0;
    }

    pub fn earth_model(&self) -> EarthModel {
        self.earth
    }

    pub fn set_earth_model(&mut self, earth: EarthModel) {
        self.earth = earth;
        self.update_radii();
    }

    pub fn pole_radius(&self) -> f64 {
        self.earth.pole_radius
    }

    pub fn set_pole_radius(&mut self, radius: f64) {
        self.earth.pole_radius = radius;
        self.update_radii();
    }

    pub fn equator_radius(&self) -> f64 {
        self.earth.equator_radius
    }

    pub fn set_equator_radius(&mut self, radius: f64) {
        self.earth.equator_radius = radius;
        self.update_radii();
    }

    pub fn dndh(&self) -> f64 {
        self.earth.dndh
    }

    pub fn set_dndh(&mut self, dndh: f64) {
        self.earth.dndh = dndh;
        self.update_radii();
    }

    /// Earth radius at latitude `lat` (radians).
    pub fn earth_radius(&self, lat: f64) -> f64 {
        self.earth.radius_at(lat)
    }

    /// Earth radius at the site latitude.
    pub fn earth_radius_origin(&self) -> f64 {
        self.earth_radius_origin
    }

    /// Effective earth radius used for beam propagation.
    pub fn effective_earth_radius(&self) -> f64 {
        self.effective_radius
    }

    /// Great-circle distance from the site to (lat, lon).
    pub fn distance(&self, lat: f64, lon: f64) -> f64 {
        let dlat = lat - self.lat0;
        let dlon = lon - self.lon0;
        let a = (dlat / 2.0).sin().powi(2)
            + self.lat0.cos() * lat.cos() * (dlon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).max(0.0).sqrt());
        self.earth_radius_origin * c
    }

    /// Geodetic position to ground distance and azimuth.
    ///
    /// Returns `(distance, azimuth)` with the azimuth clockwise from north
    /// in `[0, 2π)`.
    pub fn ll_to_da(&self, lat: f64, lon: f64) -> (f64, f64) {
        let dlon = lon - self.lon0;
        let y = dlon.sin() * lat.cos();
        let x = self.lat0.cos() * lat.sin() - self.lat0.sin() * lat.cos() * dlon.cos();
        let mut azimuth = y.atan2(x);
        if azimuth < 0.0 {
            azimuth += 2.0 * PI;
        }
        (self.distance(lat, lon), azimuth)
    }

    /// Ground distance and azimuth to geodetic position.
    ///
    /// Returns `(lat, lon)`.
    pub fn da_to_ll(&self, distance: f64, azimuth: f64) -> (f64, f64) {
        let delta = distance / self.earth_radius_origin;
        let lat = (self.lat0.sin() * delta.cos()
            + self.lat0.cos() * delta.sin() * azimuth.cos())
        .asin();
        let lon = self.lon0
            + (azimuth.sin() * delta.sin() * self.lat0.cos())
                .atan2(delta.cos() - self.lat0.sin() * lat.sin());
        (lat, lon)
    }

    /// Ground distance and height above sea level to beam range and elevation.
    ///
    /// Returns `(range, elevation)`.
    pub fn dh_to_re(&self, distance: f64, height: f64) -> (f64, f64) {
        let rp = self.effective_radius;
        let gamma = distance / rp;
        let rh = rp + (height - self.alt0);
        let x = rh * gamma.sin();
        let y = rh * gamma.cos() - rp;
        (x.hypot(y), y.atan2(x))
    }

    /// Ground distance and elevation to beam range and height above sea level.
    ///
    /// Returns `(range, height)`.
    pub fn de_to_rh(&self, distance: f64, elevation: f64) -> (f64, f64) {
        let rp = self.effective_radius;
        let gamma = distance / rp;
        let denom = (elevation + gamma).cos();
        let range = rp * gamma.sin() / denom;
        let rh = rp * elevation.cos() / denom;
        (range, rh - rp + self.alt0)
    }

    /// Beam range and elevation to ground distance and height above sea level.
    ///
    /// Returns `(distance, height)`.
    pub fn re_to_dh(&self, range: f64, elevation: f64) -> (f64, f64) {
        let rp = self.effective_radius;
        let rh = (rp * rp + range * range + 2.0 * rp * range * elevation.sin()).sqrt();
        let gamma = (range * elevation.cos() / rh).clamp(-1.0, 1.0).asin();
        (rp * gamma, rh - rp + self.alt0)
    }
}
