//! Single-elevation polar scans.
//!
//! A scan holds any number of parameters keyed by quantity, all sharing one
//! bin/ray geometry, plus quality fields, a shared navigator and a shared
//! projection. The geometry is taken from the first parameter added to an
//! empty scan; later parameters must match it.
//!
//! Ranges are `rstart + rscale * bin` metres along the beam and azimuths are
//! `ray * 2π / nrays` radians clockwise from north.

use std::collections::BTreeMap;
use std::f64::consts::PI;

use chrono::NaiveDateTime;
use projection::{NavigationInfo, PolarNavigator, Projection};
use radar_common::{
    AttributeTable, AttributeValue, Handle, NominalDateTime, ObjectType, RadarError, RadarObject,
    RadarResult, RadarValue,
};
use tracing::{debug, warn};

use crate::config::PolarDataConfig;
use crate::error::{PolarDataError, Result};
use crate::field::QualityField;
use crate::param::{find_by_how_task, require_double, PolarScanParam};

/// Scan attributes stored as fields rather than in the attribute table.
const FIXED_ATTRIBUTES: [&str; 13] = [
    "what/date",
    "what/time",
    "what/source",
    "where/lon",
    "where/lat",
    "where/height",
    "where/elangle",
    "where/rscale",
    "where/rstart",
    "where/a1gate",
    "where/nbins",
    "where/nrays",
    "how/beamwidth",
];

/// Which part of the beam a cell position refers to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BeamEdge {
    /// Beam axis at the scan elevation.
    #[default]
    Center,
    /// Elevation minus half the beamwidth.
    Lower,
    /// Elevation plus half the beamwidth.
    Upper,
}

impl std::str::FromStr for BeamEdge {
    type Err = String;

    /// Parse from string (case-insensitive).
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "center" | "centre" => Ok(Self::Center),
            "lower" | "bottom" => Ok(Self::Lower),
            "upper" | "top" => Ok(Self::Upper),
            other => Err(format!("unknown beam edge '{}'", other)),
        }
    }
}

impl BeamEdge {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Center => "center",
            Self::Lower => "lower",
            Self::Upper => "upper",
        }
    }

    fn elevation_offset(&self, beamwidth: f64) -> f64 {
        match self {
            Self::Center => 0.0,
            Self::Lower => -beamwidth / 2.0,
            Self::Upper => beamwidth / 2.0,
        }
    }
}

impl std::fmt::Display for BeamEdge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One sweep of the antenna at a fixed elevation.
#[derive(Debug)]
pub struct PolarScan {
    parameters: BTreeMap<String, Handle<PolarScanParam>>,
    quality_fields: Vec<Handle<QualityField>>,
    navigator: Handle<PolarNavigator>,
    projection: Handle<Projection>,
    default_parameter: String,
    /// Elevation angle in radians
    elangle: f64,
    nbins: usize,
    nrays: usize,
    /// Bin length in metres
    rscale: f64,
    /// Range of the first bin in metres
    rstart: f64,
    a1gate: i64,
    /// Explicit beamwidth in radians
    beamwidth: Option<f64>,
    datetime: NominalDateTime,
    source: Option<String>,
    attributes: AttributeTable,
}

impl Default for PolarScan {
    fn default() -> Self {
        Self::from_parts(
            PolarNavigator::new(),
            Projection::lonlat(),
            "DBZH".to_string(),
        )
    }
}

impl RadarObject for PolarScan {
    const TYPE: ObjectType = ObjectType::new("PolarScan");

    fn clone_object(&self) -> Self {
        Self {
            parameters: self
                .parameters
                .iter()
                .map(|(k, p)| (k.clone(), p.deep_clone()))
                .collect(),
            quality_fields: self.quality_fields.iter().map(Handle::deep_clone).collect(),
            navigator: self.navigator.clone(),
            projection: self.projection.clone(),
            default_parameter: self.default_parameter.clone(),
            elangle: self.elangle,
            nbins: self.nbins,
            nrays: self.nrays,
            rscale: self.rscale,
            rstart: self.rstart,
            a1gate: self.a1gate,
            beamwidth: self.beamwidth,
            datetime: self.datetime,
            source: self.source.clone(),
            attributes: self.attributes.clone(),
        }
    }
}

impl PolarScan {
    /// Empty scan with the default navigator, lon/lat projection and `DBZH`
    /// as default parameter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty scan using the configured earth model, projection and default
    /// parameter.
    pub fn with_config(config: &PolarDataConfig) -> Result<Self> {
        config.validate().map_err(PolarDataError::Config)?;
        Ok(Self::from_parts(
            config.navigator(),
            config.projection()?,
            config.default_parameter.clone(),
        ))
    }

    fn from_parts(
        navigator: PolarNavigator,
        projection: Projection,
        default_parameter: String,
    ) -> Self {
        Self {
            parameters: BTreeMap::new(),
            quality_fields: Vec::new(),
            navigator: Handle::new(navigator),
            projection: Handle::new(projection),
            default_parameter,
            elangle: 0.0,
            nbins: 0,
            nrays: 0,
            rscale: 0.0,
            rstart: 0.0,
            a1gate: 0,
            beamwidth: None,
            datetime: NominalDateTime::new(),
            source: None,
            attributes: AttributeTable::new(),
        }
    }

    // ========================================================================
    // Geometry
    // ========================================================================

    pub fn elangle(&self) -> f64 {
        self.elangle
    }

    pub fn set_elangle(&mut self, elangle: f64) {
        self.elangle = elangle;
    }

    pub fn nbins(&self) -> usize {
        self.nbins
    }

    pub fn nrays(&self) -> usize {
        self.nrays
    }

    pub fn rscale(&self) -> f64 {
        self.rscale
    }

    pub fn set_rscale(&mut self, rscale: f64) {
        self.rscale = rscale;
    }

    pub fn rstart(&self) -> f64 {
        self.rstart
    }

    pub fn set_rstart(&mut self, rstart: f64) {
        self.rstart = rstart;
    }

    pub fn a1gate(&self) -> i64 {
        self.a1gate
    }

    pub fn set_a1gate(&mut self, a1gate: i64) {
        self.a1gate = a1gate;
    }

    /// Beamwidth in radians. Defaults to one ray (`2π / nrays`), or 0 for a
    /// scan without rays.
    pub fn beamwidth(&self) -> f64 {
        match self.beamwidth {
            Some(bw) => bw,
            None if self.nrays > 0 => 2.0 * PI / self.nrays as f64,
            None => 0.0,
        }
    }

    pub fn set_beamwidth(&mut self, beamwidth: f64) {
        self.beamwidth = Some(beamwidth);
    }

    /// True when bins, rays and bin length are all set.
    pub fn is_transformable(&self) -> bool {
        self.nbins > 0 && self.nrays > 0 && self.rscale > 0.0
    }

    // ========================================================================
    // Shared navigator and projection
    // ========================================================================

    pub fn navigator(&self) -> Handle<PolarNavigator> {
        self.navigator.clone()
    }

    pub fn set_navigator(&mut self, navigator: Handle<PolarNavigator>) {
        self.navigator = navigator;
    }

    pub fn projection(&self) -> Handle<Projection> {
        self.projection.clone()
    }

    pub fn set_projection(&mut self, projection: Handle<Projection>) {
        self.projection = projection;
    }

    /// Site longitude in radians.
    pub fn longitude(&self) -> f64 {
        self.navigator.borrow().lon0()
    }

    /// Set the site longitude on the shared navigator.
    pub fn set_longitude(&mut self, lon: f64) {
        self.navigator.borrow_mut().set_lon0(lon);
    }

    /// Site latitude in radians.
    pub fn latitude(&self) -> f64 {
        self.navigator.borrow().lat0()
    }

    pub fn set_latitude(&mut self, lat: f64) {
        self.navigator.borrow_mut().set_lat0(lat);
    }

    /// Site height above sea level in metres.
    pub fn height(&self) -> f64 {
        self.navigator.borrow().alt0()
    }

    pub fn set_height(&mut self, height: f64) {
        self.navigator.borrow_mut().set_alt0(height);
    }

    // ========================================================================
    // Nominal time and source
    // ========================================================================

    /// Nominal date as `YYYYMMDD`.
    pub fn date(&self) -> Option<String> {
        self.datetime.date()
    }

    pub fn set_date(&mut self, date: Option<&str>) -> RadarResult<()> {
        self.datetime.set_date(date)
    }

    /// Nominal time as `HHmmss`.
    pub fn time(&self) -> Option<String> {
        self.datetime.time()
    }

    pub fn set_time(&mut self, time: Option<&str>) -> RadarResult<()> {
        self.datetime.set_time(time)
    }

    pub fn datetime(&self) -> Option<NaiveDateTime> {
        self.datetime.datetime()
    }

    pub fn set_datetime(&mut self, datetime: NaiveDateTime) {
        self.datetime.set_datetime(datetime);
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn set_source(&mut self, source: Option<&str>) {
        self.source = source.map(str::to_string);
    }

    // ========================================================================
    // Parameters
    // ========================================================================

    pub fn default_parameter(&self) -> &str {
        &self.default_parameter
    }

    /// Quantity used by the lookups that name no parameter.
    pub fn set_default_parameter(&mut self, quantity: &str) -> Result<()> {
        if quantity.trim().is_empty() {
            return Err(PolarDataError::InvalidDefaultParameter(quantity.to_string()));
        }
        self.default_parameter = quantity.to_string();
        Ok(())
    }

    /// Add a parameter keyed by its quantity, replacing one with the same key.
    ///
    /// Fails without changing the scan when the quantity is empty, or when
    /// the scan already holds parameters of a different bin/ray geometry.
    pub fn add_parameter(&mut self, param: Handle<PolarScanParam>) -> Result<()> {
        let (quantity, nbins, nrays) = {
            let p = param.borrow();
            (p.quantity().to_string(), p.nbins(), p.nrays())
        };
        if quantity.is_empty() {
            warn!("Rejected parameter without quantity");
            return Err(PolarDataError::MissingQuantity);
        }

        // Stored parameters may have been resized through another handle, so
        // compare against their current geometry rather than the cached one.
        if let Some(expected) = self
            .stored_geometries()
            .find(|&geometry| geometry != (nbins, nrays))
        {
            warn!(
                quantity = %quantity,
                nbins,
                nrays,
                scan_nbins = expected.0,
                scan_nrays = expected.1,
                "Rejected parameter with mismatching geometry"
            );
            return Err(PolarDataError::GeometryMismatch {
                quantity,
                expected,
                actual: (nbins, nrays),
            });
        }

        self.nbins = nbins;
        self.nrays = nrays;
        debug!(quantity = %quantity, nbins, nrays, "Added parameter");
        self.parameters.insert(quantity, param);
        Ok(())
    }

    pub fn parameter(&self, quantity: &str) -> Option<Handle<PolarScanParam>> {
        self.parameters.get(quantity).cloned()
    }

    pub fn has_parameter(&self, quantity: &str) -> bool {
        self.parameters.contains_key(quantity)
    }

    /// Remove a parameter and hand it back to the caller.
    pub fn remove_parameter(&mut self, quantity: &str) -> Option<Handle<PolarScanParam>> {
        self.parameters.remove(quantity)
    }

    /// Quantities in name order.
    pub fn parameter_names(&self) -> Vec<String> {
        self.parameters.keys().cloned().collect()
    }

    pub fn parameter_count(&self) -> usize {
        self.parameters.len()
    }

    pub fn parameters(&self) -> impl Iterator<Item = &Handle<PolarScanParam>> {
        self.parameters.values()
    }

    // ========================================================================
    // Cell values
    // ========================================================================

    /// Raw value of the default parameter.
    pub fn value(&self, bin: usize, ray: usize) -> RadarValue {
        self.parameter_value(&self.default_parameter, bin, ray)
    }

    /// Raw value of a named parameter; `Undefined` when it does not exist.
    pub fn parameter_value(&self, quantity: &str, bin: usize, ray: usize) -> RadarValue {
        self.parameters
            .get(quantity)
            .map_or(RadarValue::Undefined, |p| p.borrow().value(bin, ray))
    }

    /// Converted value of the default parameter.
    pub fn converted_value(&self, bin: usize, ray: usize) -> RadarValue {
        self.converted_parameter_value(&self.default_parameter, bin, ray)
    }

    pub fn converted_parameter_value(&self, quantity: &str, bin: usize, ray: usize) -> RadarValue {
        self.parameters
            .get(quantity)
            .map_or(RadarValue::Undefined, |p| p.borrow().converted_value(bin, ray))
    }

    /// Store a raw value in the default parameter.
    pub fn set_value(&mut self, bin: usize, ray: usize, raw: f64) -> bool {
        let quantity = self.default_parameter.clone();
        self.set_parameter_value(&quantity, bin, ray, raw)
    }

    /// Store a raw value; false for a missing parameter or cell.
    pub fn set_parameter_value(&mut self, quantity: &str, bin: usize, ray: usize, raw: f64) -> bool {
        self.parameters.get(quantity).map_or(false, |p| {
            p.try_borrow_mut()
                .map_or(false, |mut p| p.set_value(bin, ray, raw))
        })
    }

    // ========================================================================
    // Index and geometry conversions
    // ========================================================================

    /// Bin containing `range` metres, if inside the scan.
    pub fn range_index(&self, range: f64) -> Option<usize> {
        if self.nbins == 0 || !(self.rscale > 0.0) {
            return None;
        }
        let index = ((range - self.rstart) / self.rscale).floor();
        if index.is_finite() && index >= 0.0 && index < self.nbins as f64 {
            Some(index as usize)
        } else {
            None
        }
    }

    /// Range in metres at the start of `bin`.
    pub fn range(&self, bin: usize) -> Option<f64> {
        if bin < self.nbins {
            Some(self.rstart + self.rscale * bin as f64)
        } else {
            None
        }
    }

    /// Ray nearest `azimuth` radians; azimuths outside [0, 2π) wrap around.
    pub fn azimuth_index(&self, azimuth: f64) -> Option<usize> {
        if self.nrays == 0 || !azimuth.is_finite() {
            return None;
        }
        let step = 2.0 * PI / self.nrays as f64;
        let index = (azimuth / step).round() as i64;
        Some(index.rem_euclid(self.nrays as i64) as usize)
    }

    /// Azimuth in radians of `ray`.
    pub fn azimuth(&self, ray: usize) -> Option<f64> {
        if ray < self.nrays {
            Some(ray as f64 * 2.0 * PI / self.nrays as f64)
        } else {
            None
        }
    }

    /// Cell `(bin, ray)` for an azimuth and range.
    pub fn index_from_azimuth_and_range(&self, azimuth: f64, range: f64) -> Option<(usize, usize)> {
        Some((self.range_index(range)?, self.azimuth_index(azimuth)?))
    }

    /// `(azimuth, range)` of a cell.
    pub fn azimuth_and_range_from_index(&self, bin: usize, ray: usize) -> Option<(f64, f64)> {
        Some((self.azimuth(ray)?, self.range(bin)?))
    }

    /// Raw value of the default parameter at an azimuth and range.
    pub fn value_at_azimuth_and_range(&self, azimuth: f64, range: f64) -> RadarValue {
        self.parameter_value_at_azimuth_and_range(&self.default_parameter, azimuth, range)
    }

    pub fn parameter_value_at_azimuth_and_range(
        &self,
        quantity: &str,
        azimuth: f64,
        range: f64,
    ) -> RadarValue {
        match self.index_from_azimuth_and_range(azimuth, range) {
            Some((bin, ray)) => self.parameter_value(quantity, bin, ray),
            None => RadarValue::Undefined,
        }
    }

    pub fn converted_parameter_value_at_azimuth_and_range(
        &self,
        quantity: &str,
        azimuth: f64,
        range: f64,
    ) -> RadarValue {
        match self.index_from_azimuth_and_range(azimuth, range) {
            Some((bin, ray)) => self.converted_parameter_value(quantity, bin, ray),
            None => RadarValue::Undefined,
        }
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    /// Navigate a geodetic position (radians) onto this scan.
    ///
    /// The position is projected onto the beam at the scan elevation; `bin`
    /// and `ray` are set when it falls inside the scan.
    pub fn navigation_info(&self, lon: f64, lat: f64) -> NavigationInfo {
        let nav = self.navigator.borrow();
        let (distance, azimuth) = nav.ll_to_da(lat, lon);
        let (range, height) = nav.de_to_rh(distance, self.elangle);
        let mut info = NavigationInfo {
            lon,
            lat,
            height,
            actual_height: height,
            distance,
            range,
            actual_range: range,
            azimuth,
            actual_azimuth: azimuth,
            elevation: self.elangle,
            ..Default::default()
        };

        info.ray = self.azimuth_index(azimuth);
        if let Some(actual) = info.ray.and_then(|ray| self.azimuth(ray)) {
            info.actual_azimuth = actual;
        }
        info.bin = self.range_index(range);
        if let Some(actual) = info.bin.and_then(|bin| self.range(bin)) {
            info.actual_range = actual;
            info.actual_height = nav.re_to_dh(actual, self.elangle).1;
        }
        info
    }

    /// Cell nearest a geodetic position.
    pub fn nearest_index(&self, lon: f64, lat: f64) -> Option<(usize, usize)> {
        self.navigation_info(lon, lat).cell()
    }

    /// Raw value of the default parameter nearest a geodetic position.
    pub fn nearest(&self, lon: f64, lat: f64) -> RadarValue {
        self.nearest_parameter_value(&self.default_parameter, lon, lat)
    }

    pub fn nearest_parameter_value(&self, quantity: &str, lon: f64, lat: f64) -> RadarValue {
        match self.nearest_index(lon, lat) {
            Some((bin, ray)) => self.parameter_value(quantity, bin, ray),
            None => RadarValue::Undefined,
        }
    }

    pub fn nearest_converted_parameter_value(
        &self,
        quantity: &str,
        lon: f64,
        lat: f64,
    ) -> RadarValue {
        match self.nearest_index(lon, lat) {
            Some((bin, ray)) => self.converted_parameter_value(quantity, bin, ray),
            None => RadarValue::Undefined,
        }
    }

    /// Geodetic position of a cell.
    ///
    /// `edge` selects the beam axis or the lower/upper edge of the beam,
    /// half a beamwidth below or above the scan elevation.
    pub fn lon_lat_navigation_info(
        &self,
        bin: usize,
        ray: usize,
        edge: BeamEdge,
    ) -> Option<NavigationInfo> {
        let (azimuth, range) = self.azimuth_and_range_from_index(bin, ray)?;
        let elevation = self.elangle + edge.elevation_offset(self.beamwidth());
        let nav = self.navigator.borrow();
        let (distance, height) = nav.re_to_dh(range, elevation);
        let (lat, lon) = nav.da_to_ll(distance, azimuth);
        Some(NavigationInfo {
            lon,
            lat,
            height,
            actual_height: height,
            distance,
            range,
            actual_range: range,
            azimuth,
            actual_azimuth: azimuth,
            elevation,
            elevation_index: None,
            bin: Some(bin),
            ray: Some(ray),
        })
    }

    /// `(lon, lat)` in radians of a cell on the beam axis.
    pub fn lon_lat_from_index(&self, bin: usize, ray: usize) -> Option<(f64, f64)> {
        self.lon_lat_navigation_info(bin, ray, BeamEdge::Center)
            .map(|info| (info.lon, info.lat))
    }

    /// Ground distance in metres from the site to a position in radians.
    pub fn distance(&self, lon: f64, lat: f64) -> f64 {
        self.navigator.borrow().distance(lat, lon)
    }

    /// Ground distance covered by the far end of the last bin.
    pub fn max_distance(&self) -> f64 {
        if self.nbins == 0 {
            return 0.0;
        }
        let range = self.rstart + self.rscale * self.nbins as f64;
        self.navigator.borrow().re_to_dh(range, self.elangle).0
    }

    // ========================================================================
    // Quality fields
    // ========================================================================

    pub fn add_quality_field(&mut self, field: Handle<QualityField>) {
        self.quality_fields.push(field);
    }

    pub fn quality_field(&self, index: usize) -> Option<Handle<QualityField>> {
        self.quality_fields.get(index).cloned()
    }

    pub fn quality_field_count(&self) -> usize {
        self.quality_fields.len()
    }

    pub fn quality_fields(&self) -> &[Handle<QualityField>] {
        &self.quality_fields
    }

    pub fn remove_quality_field(&mut self, index: usize) -> Option<Handle<QualityField>> {
        if index < self.quality_fields.len() {
            Some(self.quality_fields.remove(index))
        } else {
            None
        }
    }

    /// First scan-level field whose `how/task` equals `task`.
    pub fn quality_field_by_how_task(&self, task: &str) -> Option<Handle<QualityField>> {
        find_by_how_task(&self.quality_fields, task)
    }

    /// Quality value for a cell of `quantity`.
    ///
    /// A field with the given `how/task` on the parameter takes precedence
    /// over one on the scan. `None` when neither exists or the chosen field
    /// does not cover the cell.
    pub fn quality_value_at(&self, quantity: &str, bin: usize, ray: usize, task: &str) -> Option<f64> {
        let field = self
            .parameters
            .get(quantity)
            .and_then(|p| p.borrow().quality_field_by_how_task(task))
            .or_else(|| self.quality_field_by_how_task(task))?;
        let value = field.borrow().value(bin, ray);
        value
    }

    // ========================================================================
    // Attributes
    // ========================================================================

    /// Add an attribute.
    ///
    /// Date, time, source, site position, elevation, range geometry, a1gate
    /// and beamwidth are stored on the scan in radians and metres; the
    /// attributes carry degrees and, for `where/rstart`, kilometres.
    /// `where/nbins` and `where/nrays` are accepted but the geometry always
    /// follows the parameters.
    pub fn add_attribute(&mut self, name: &str, value: impl Into<AttributeValue>) -> RadarResult<()> {
        let result = self.store_attribute(name, value.into());
        if let Err(e) = &result {
            warn!(name, error = %e, "Rejected scan attribute");
        }
        result
    }

    fn store_attribute(&mut self, name: &str, value: AttributeValue) -> RadarResult<()> {
        match name {
            "what/date" => self.set_date(Some(require_str(name, &value)?))?,
            "what/time" => self.set_time(Some(require_str(name, &value)?))?,
            "what/source" => self.source = Some(require_str(name, &value)?.to_string()),
            "where/lon" => self.set_longitude(require_double(name, &value)?.to_radians()),
            "where/lat" => self.set_latitude(require_double(name, &value)?.to_radians()),
            "where/height" => self.set_height(require_double(name, &value)?),
            "where/elangle" => self.elangle = require_double(name, &value)?.to_radians(),
            "where/rscale" => self.rscale = require_double(name, &value)?,
            "where/rstart" => self.rstart = require_double(name, &value)? * 1000.0,
            "where/a1gate" => self.a1gate = require_long(name, &value)?,
            "where/nbins" | "where/nrays" => {
                require_long(name, &value)?;
            }
            "how/beamwidth" => {
                self.beamwidth = Some(require_double(name, &value)?.to_radians())
            }
            _ => self.attributes.set(name, value)?,
        }
        Ok(())
    }

    pub fn attribute(&self, name: &str) -> Option<AttributeValue> {
        match name {
            "what/date" => self.date().map(AttributeValue::from),
            "what/time" => self.time().map(AttributeValue::from),
            "what/source" => self.source.as_deref().map(AttributeValue::from),
            "where/lon" => Some(self.longitude().to_degrees().into()),
            "where/lat" => Some(self.latitude().to_degrees().into()),
            "where/height" => Some(self.height().into()),
            "where/elangle" => Some(self.elangle.to_degrees().into()),
            "where/rscale" => Some(self.rscale.into()),
            "where/rstart" => Some((self.rstart / 1000.0).into()),
            "where/a1gate" => Some(self.a1gate.into()),
            "where/nbins" => Some((self.nbins as i64).into()),
            "where/nrays" => Some((self.nrays as i64).into()),
            "how/beamwidth" => Some(self.beamwidth().to_degrees().into()),
            _ => self.attributes.get(name).cloned(),
        }
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    /// Names of all attributes that currently have a value.
    pub fn attribute_names(&self) -> Vec<String> {
        FIXED_ATTRIBUTES
            .iter()
            .filter(|name| self.attribute(name).is_some())
            .map(|name| name.to_string())
            .chain(self.attributes.names())
            .collect()
    }

    pub fn attribute_values(&self) -> Vec<(String, AttributeValue)> {
        self.attribute_names()
            .into_iter()
            .filter_map(|name| self.attribute(&name).map(|v| (name, v)))
            .collect()
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<AttributeValue> {
        self.attributes.remove(name)
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Geometry and at least one parameter are present, and every parameter
    /// still has the scan's bin/ray counts.
    pub fn has_data(&self) -> bool {
        self.is_transformable()
            && !self.parameters.is_empty()
            && self
                .stored_geometries()
                .all(|geometry| geometry == (self.nbins, self.nrays))
    }

    /// Current (nbins, nrays) of every stored parameter that can be borrowed.
    fn stored_geometries(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.parameters
            .values()
            .filter_map(|p| p.try_borrow().ok().map(|p| (p.nbins(), p.nrays())))
    }

    /// True when the scan can be stored on its own: geometry, at least one
    /// parameter, nominal date/time and source are all set.
    pub fn is_valid(&self) -> bool {
        self.has_data() && self.datetime.is_complete() && self.source.is_some()
    }
}

fn require_str<'a>(name: &str, value: &'a AttributeValue) -> RadarResult<&'a str> {
    value
        .as_str()
        .ok_or_else(|| RadarError::invalid_attribute(name, "expected a string"))
}

fn require_long(name: &str, value: &AttributeValue) -> RadarResult<i64> {
    value
        .as_long()
        .ok_or_else(|| RadarError::invalid_attribute(name, "expected an integer"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use radar_common::DataType;
    use test_utils::assert_approx_eq;

    fn scan_with_dbzh(nbins: usize, nrays: usize) -> PolarScan {
        let mut scan = PolarScan::new();
        scan.set_rscale(500.0);
        scan.set_elangle(0.5_f64.to_radians());
        let param = PolarScanParam::new("DBZH", nbins, nrays, DataType::UChar);
        scan.add_parameter(Handle::new(param)).unwrap();
        scan
    }

    #[test]
    fn test_first_parameter_fixes_geometry() {
        let mut scan = scan_with_dbzh(10, 36);
        assert_eq!((scan.nbins(), scan.nrays()), (10, 36));

        let err = scan
            .add_parameter(Handle::new(PolarScanParam::new("TH", 11, 36, DataType::UChar)))
            .unwrap_err();
        assert!(matches!(err, PolarDataError::GeometryMismatch { .. }));
        assert_eq!(scan.parameter_names(), vec!["DBZH".to_string()]);
    }

    #[test]
    fn test_replacement_must_match_geometry() {
        let mut scan = scan_with_dbzh(10, 36);
        let other = Handle::new(PolarScanParam::new("DBZH", 5, 5, DataType::UChar));
        assert!(scan.add_parameter(other).is_err());

        let same = Handle::new(PolarScanParam::new("DBZH", 10, 36, DataType::Short));
        scan.add_parameter(same.clone()).unwrap();
        assert!(scan.parameter("DBZH").unwrap().ptr_eq(&same));
        assert_eq!(scan.parameter_count(), 1);
    }

    #[test]
    fn test_empty_quantity_rejected() {
        let mut scan = PolarScan::new();
        let err = scan
            .add_parameter(Handle::new(PolarScanParam::default()))
            .unwrap_err();
        assert!(matches!(err, PolarDataError::MissingQuantity));
        assert_eq!(scan.nbins(), 0);
    }

    #[test]
    fn test_remove_parameter_returns_handle() {
        let mut scan = scan_with_dbzh(4, 4);
        let removed = scan.remove_parameter("DBZH").unwrap();
        assert_eq!(removed.ref_count(), 1);
        assert!(!scan.has_parameter("DBZH"));
        assert!(scan.remove_parameter("DBZH").is_none());

        // An empty scan takes the geometry of the next parameter.
        scan.add_parameter(Handle::new(PolarScanParam::new("TH", 8, 2, DataType::UChar)))
            .unwrap();
        assert_eq!((scan.nbins(), scan.nrays()), (8, 2));
    }

    #[test]
    fn test_value_of_missing_parameter_is_undefined() {
        let mut scan = scan_with_dbzh(4, 4);
        assert_eq!(scan.parameter_value("VRADH", 0, 0), RadarValue::Undefined);
        assert_eq!(scan.value(4, 0), RadarValue::Undefined);
        assert!(!scan.set_parameter_value("VRADH", 0, 0, 1.0));

        scan.set_default_parameter("VRADH").unwrap();
        assert_eq!(scan.value(0, 0), RadarValue::Undefined);
        assert!(scan.set_default_parameter("").is_err());
    }

    #[test]
    fn test_range_index() {
        let scan = scan_with_dbzh(10, 36);
        assert_eq!(scan.range_index(0.0), Some(0));
        assert_eq!(scan.range_index(499.9), Some(0));
        assert_eq!(scan.range_index(500.0), Some(1));
        assert_eq!(scan.range_index(4999.0), Some(9));
        assert_eq!(scan.range_index(5000.0), None);
        assert_eq!(scan.range_index(-1.0), None);
        assert_eq!(scan.range(9), Some(4500.0));
        assert_eq!(scan.range(10), None);
    }

    #[test]
    fn test_range_with_rstart() {
        let mut scan = scan_with_dbzh(10, 36);
        scan.set_rstart(1000.0);
        assert_eq!(scan.range_index(999.0), None);
        assert_eq!(scan.range_index(1000.0), Some(0));
        assert_eq!(scan.range(2), Some(2000.0));
    }

    #[test]
    fn test_azimuth_index_wraps() {
        let scan = scan_with_dbzh(10, 36);
        let step = 10.0_f64.to_radians();
        assert_eq!(scan.azimuth_index(0.0), Some(0));
        assert_eq!(scan.azimuth_index(step * 0.49), Some(0));
        assert_eq!(scan.azimuth_index(step * 0.51), Some(1));
        assert_eq!(scan.azimuth_index(2.0 * PI - step * 0.2), Some(0));
        assert_eq!(scan.azimuth_index(-step), Some(35));
        assert_eq!(scan.azimuth_index(f64::NAN), None);
        assert_eq!(scan.azimuth(36), None);
        assert_approx_eq!(scan.azimuth(9).unwrap(), PI / 2.0, 1e-12);
    }

    #[test]
    fn test_index_from_azimuth_and_range() {
        let scan = scan_with_dbzh(10, 36);
        let a = 50.0_f64.to_radians();
        assert_eq!(scan.index_from_azimuth_and_range(a, 1200.0), Some((2, 5)));
        assert_eq!(scan.index_from_azimuth_and_range(a, 6000.0), None);
        let (az, r) = scan.azimuth_and_range_from_index(2, 5).unwrap();
        assert_approx_eq!(az, a, 1e-12);
        assert_eq!(r, 1000.0);
    }

    #[test]
    fn test_beamwidth_default() {
        let mut scan = PolarScan::new();
        assert_eq!(scan.beamwidth(), 0.0);
        scan.add_parameter(Handle::new(PolarScanParam::new("DBZH", 2, 360, DataType::UChar)))
            .unwrap();
        assert_approx_eq!(scan.beamwidth(), 1.0_f64.to_radians(), 1e-12);
        scan.set_beamwidth(0.9_f64.to_radians());
        assert_approx_eq!(scan.beamwidth().to_degrees(), 0.9, 1e-12);
    }

    #[test]
    fn test_is_transformable() {
        let mut scan = PolarScan::new();
        assert!(!scan.is_transformable());
        scan.add_parameter(Handle::new(PolarScanParam::new("DBZH", 2, 2, DataType::UChar)))
            .unwrap();
        assert!(!scan.is_transformable());
        scan.set_rscale(250.0);
        assert!(scan.is_transformable());
    }

    #[test]
    fn test_navigation_round_trip() {
        let mut scan = scan_with_dbzh(200, 360);
        scan.set_longitude(14.0_f64.to_radians());
        scan.set_latitude(60.0_f64.to_radians());

        let info = scan
            .lon_lat_navigation_info(120, 45, BeamEdge::Center)
            .unwrap();
        assert_eq!(info.range, 60000.0);
        assert_approx_eq!(info.azimuth.to_degrees(), 45.0, 1e-9);

        // Middle of the same cell.
        let (lat, lon) = {
            let nav = scan.navigator();
            let nav = nav.borrow();
            let (d, _) = nav.re_to_dh(60250.0, scan.elangle());
            nav.da_to_ll(d, 45.0_f64.to_radians())
        };
        let back = scan.navigation_info(lon, lat);
        assert_eq!(back.cell(), Some((120, 45)));
        assert_approx_eq!(back.range, 60250.0, 1e-3);
        assert_approx_eq!(back.actual_range, 60000.0, 1e-9);
        assert_eq!(scan.nearest_index(lon, lat), Some((120, 45)));
    }

    #[test]
    fn test_beam_edges() {
        let mut scan = scan_with_dbzh(200, 360);
        scan.set_latitude(60.0_f64.to_radians());
        let lower = scan.lon_lat_navigation_info(100, 0, BeamEdge::Lower).unwrap();
        let center = scan.lon_lat_navigation_info(100, 0, BeamEdge::Center).unwrap();
        let upper = scan.lon_lat_navigation_info(100, 0, BeamEdge::Upper).unwrap();
        assert!(lower.height < center.height);
        assert!(center.height < upper.height);
        assert_approx_eq!(upper.elevation - lower.elevation, scan.beamwidth(), 1e-12);
        assert!(scan.lon_lat_navigation_info(200, 0, BeamEdge::Center).is_none());
    }

    #[test]
    fn test_beam_edge_from_str() {
        assert_eq!("Upper".parse::<BeamEdge>(), Ok(BeamEdge::Upper));
        assert_eq!("bottom".parse::<BeamEdge>(), Ok(BeamEdge::Lower));
        assert_eq!("center".parse::<BeamEdge>(), Ok(BeamEdge::Center));
        assert!("middle".parse::<BeamEdge>().is_err());
        for edge in [BeamEdge::Center, BeamEdge::Lower, BeamEdge::Upper] {
            assert_eq!(edge.to_string().parse::<BeamEdge>(), Ok(edge));
        }
    }

    #[test]
    fn test_lon_lat_from_index() {
        let mut scan = scan_with_dbzh(200, 360);
        scan.set_latitude(60.0_f64.to_radians());
        scan.set_longitude(12.0_f64.to_radians());

        let info = scan.lon_lat_navigation_info(100, 90, BeamEdge::Center).unwrap();
        let (lon, lat) = scan.lon_lat_from_index(100, 90).unwrap();
        assert_eq!((lon, lat), (info.lon, info.lat));
        // Due east the latitude barely changes while the longitude grows.
        assert!(lon > 12.0_f64.to_radians());
        assert_approx_eq!(lat.to_degrees(), 60.0, 0.1);
        assert_eq!(scan.nearest_index(lon, lat).map(|(_, ray)| ray), Some(90));

        assert!(scan.lon_lat_from_index(200, 0).is_none());
        assert!(scan.lon_lat_from_index(0, 360).is_none());
    }

    #[test]
    fn test_outside_scan_is_undefined() {
        let mut scan = scan_with_dbzh(10, 36);
        scan.set_latitude(60.0_f64.to_radians());
        let far_lat = 62.0_f64.to_radians();
        let info = scan.navigation_info(0.0, far_lat);
        assert!(!info.is_valid());
        assert!(info.ray.is_some());
        assert_eq!(scan.nearest(0.0, far_lat), RadarValue::Undefined);
    }

    #[test]
    fn test_max_distance() {
        let scan = scan_with_dbzh(10, 36);
        let d = scan.max_distance();
        assert!(d > 4990.0 && d < 5000.0, "max distance was {}", d);
        assert_eq!(PolarScan::new().max_distance(), 0.0);
    }

    #[test]
    fn test_quality_value_prefers_parameter_field() {
        let mut scan = scan_with_dbzh(4, 4);
        let mut scan_field = QualityField::for_task("se.smhi.qc", 4, 4, DataType::UChar);
        scan_field.set_value(1, 1, 10.0);
        scan.add_quality_field(Handle::new(scan_field));
        assert_eq!(scan.quality_value_at("DBZH", 1, 1, "se.smhi.qc"), Some(10.0));

        let mut param_field = QualityField::for_task("se.smhi.qc", 2, 2, DataType::UChar);
        param_field.set_value(1, 1, 20.0);
        scan.parameter("DBZH")
            .unwrap()
            .borrow_mut()
            .add_quality_field(Handle::new(param_field));

        assert_eq!(scan.quality_value_at("DBZH", 1, 1, "se.smhi.qc"), Some(20.0));
        assert_eq!(scan.quality_value_at("DBZH", 3, 3, "se.smhi.qc"), None);
        assert_eq!(scan.quality_value_at("TH", 3, 3, "se.smhi.qc"), Some(0.0));
        assert_eq!(scan.quality_value_at("DBZH", 1, 1, "other"), None);
    }

    #[test]
    fn test_fixed_attributes_use_odim_units() {
        let mut scan = PolarScan::new();
        scan.add_attribute("where/elangle", 0.5).unwrap();
        scan.add_attribute("where/rstart", 2.0).unwrap();
        scan.add_attribute("where/lat", 60.0).unwrap();
        scan.add_attribute("where/a1gate", 12_i64).unwrap();
        scan.add_attribute("where/nbins", 999_i64).unwrap();
        scan.add_attribute("what/date", "20241019").unwrap();
        scan.add_attribute("how/task", "x").unwrap();

        assert_approx_eq!(scan.elangle(), 0.5_f64.to_radians(), 1e-12);
        assert_eq!(scan.rstart(), 2000.0);
        assert_eq!(scan.a1gate(), 12);
        assert_eq!(scan.nbins(), 0);
        assert_eq!(scan.attribute("where/rstart"), Some(AttributeValue::Double(2.0)));
        assert_eq!(scan.date().as_deref(), Some("20241019"));

        assert!(scan.add_attribute("what/date", "2024-10-19").is_err());
        assert!(scan.add_attribute("where/elangle", "low").is_err());
        assert!(scan.add_attribute("nogroup", 1.0).is_err());

        let names = scan.attribute_names();
        assert!(names.contains(&"how/task".to_string()));
        assert!(names.contains(&"what/date".to_string()));
        assert!(!names.contains(&"what/time".to_string()));
    }

    #[test]
    fn test_is_valid() {
        let mut scan = scan_with_dbzh(4, 4);
        assert!(!scan.is_valid());
        scan.set_date(Some("20241019")).unwrap();
        scan.set_time(Some("120000")).unwrap();
        assert!(!scan.is_valid());
        scan.set_source(Some("NOD:sekkr"));
        assert!(scan.is_valid());
    }

    #[test]
    fn test_clone_object_shares_navigator_only() {
        let scan = scan_with_dbzh(4, 4);
        let copy = scan.clone_object();
        assert!(copy.navigator().ptr_eq(&scan.navigator()));
        assert!(copy.projection().ptr_eq(&scan.projection()));
        assert!(!copy.parameter("DBZH").unwrap().ptr_eq(&scan.parameter("DBZH").unwrap()));
    }
}
