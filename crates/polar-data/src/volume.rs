//! Polar volumes: ordered collections of scans from one site.
//!
//! Every scan added to a volume is given the volume's navigator, projection
//! and default parameter, so all scans navigate from the same site. The
//! elevation searches assume the scans are sorted by ascending elevation;
//! call [`PolarVolume::sort_by_elevations`] first when that is not known.

use chrono::NaiveDateTime;
use projection::{NavigationInfo, PolarNavigator, Projection};
use radar_common::{
    AttributeTable, AttributeValue, Handle, NominalDateTime, ObjectType, RadarError, RadarObject,
    RadarResult, RadarValue,
};
use tracing::debug;

use crate::config::PolarDataConfig;
use crate::error::{PolarDataError, Result};
use crate::param::require_double;
use crate::scan::PolarScan;

/// Volume attributes stored as fields rather than in the attribute table.
const FIXED_ATTRIBUTES: [&str; 7] = [
    "what/date",
    "what/time",
    "what/source",
    "where/lon",
    "where/lat",
    "where/height",
    "how/beamwidth",
];

/// Scans of one site at several elevations.
#[derive(Debug)]
pub struct PolarVolume {
    scans: Vec<Handle<PolarScan>>,
    navigator: Handle<PolarNavigator>,
    projection: Handle<Projection>,
    default_parameter: String,
    /// Beamwidth in radians, pushed to every scan when set
    beamwidth: Option<f64>,
    datetime: NominalDateTime,
    source: Option<String>,
    attributes: AttributeTable,
}

impl Default for PolarVolume {
    fn default() -> Self {
        Self::from_parts(
            PolarNavigator::new(),
            Projection::lonlat(),
            "DBZH".to_string(),
        )
    }
}

impl RadarObject for PolarVolume {
    const TYPE: ObjectType = ObjectType::new("PolarVolume");

    fn clone_object(&self) -> Self {
        Self {
            scans: self.scans.iter().map(Handle::deep_clone).collect(),
            navigator: self.navigator.clone(),
            projection: self.projection.clone(),
            default_parameter: self.default_parameter.clone(),
            beamwidth: self.beamwidth,
            datetime: self.datetime,
            source: self.source.clone(),
            attributes: self.attributes.clone(),
        }
    }
}

impl PolarVolume {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty volume using the configured earth model, projection and default
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
            scans: Vec::new(),
            navigator: Handle::new(navigator),
            projection: Handle::new(projection),
            default_parameter,
            beamwidth: None,
            datetime: NominalDateTime::new(),
            source: None,
            attributes: AttributeTable::new(),
        }
    }

    // ========================================================================
    // Scans
    // ========================================================================

    /// Append a scan, giving it the volume's navigator, projection, default
    /// parameter and (when set) beamwidth.
    ///
    /// # Panics
    ///
    /// Panics if the scan is currently borrowed.
    pub fn add_scan(&mut self, scan: Handle<PolarScan>) {
        {
            let mut s = scan.borrow_mut();
            s.set_navigator(self.navigator.clone());
            s.set_projection(self.projection.clone());
            // The volume's default parameter is never empty.
            let _ = s.set_default_parameter(&self.default_parameter);
            if let Some(bw) = self.beamwidth {
                s.set_beamwidth(bw);
            }
            debug!(
                index = self.scans.len(),
                elangle = s.elangle().to_degrees(),
                "Added scan to volume"
            );
        }
        self.scans.push(scan);
    }

    pub fn scan(&self, index: usize) -> Option<Handle<PolarScan>> {
        self.scans.get(index).cloned()
    }

    pub fn scan_count(&self) -> usize {
        self.scans.len()
    }

    pub fn scans(&self) -> &[Handle<PolarScan>] {
        &self.scans
    }

    /// Remove the scan at `index` and hand it back to the caller. The scan
    /// keeps sharing the volume's navigator and projection.
    pub fn remove_scan(&mut self, index: usize) -> Option<Handle<PolarScan>> {
        if index < self.scans.len() {
            Some(self.scans.remove(index))
        } else {
            None
        }
    }

    fn elangle(&self, index: usize) -> f64 {
        self.scans[index].borrow().elangle()
    }

    /// Index of the scan whose elevation is closest to `elevation` radians.
    ///
    /// Walks the scans in order and stops at the first one that is farther
    /// away than its predecessor, so the result is only meaningful for an
    /// ascending volume. With `inside_only`, elevations below the first or
    /// above the last scan give `None`.
    pub fn scan_index_closest_to_elevation(&self, elevation: f64, inside_only: bool) -> Option<usize> {
        let count = self.scans.len();
        if count == 0 {
            return None;
        }
        if inside_only && (elevation < self.elangle(0) || elevation > self.elangle(count - 1)) {
            return None;
        }

        let mut best = 0;
        let mut best_diff = (elevation - self.elangle(0)).abs();
        for index in 1..count {
            let diff = (elevation - self.elangle(index)).abs();
            if diff < best_diff {
                best = index;
                best_diff = diff;
            } else {
                break;
            }
        }
        Some(best)
    }

    pub fn scan_closest_to_elevation(&self, elevation: f64, inside_only: bool) -> Option<Handle<PolarScan>> {
        self.scan_index_closest_to_elevation(elevation, inside_only)
            .map(|i| self.scans[i].clone())
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    /// Navigate a geodetic position (radians) and height (metres) onto the
    /// scan with the closest elevation.
    ///
    /// The range is the slant range to the query point; the value is looked
    /// up in the chosen scan at that azimuth and range.
    pub fn navigation_info(&self, lon: f64, lat: f64, height: f64, inside_only: bool) -> NavigationInfo {
        let (distance, azimuth, range, elevation) = {
            let nav = self.navigator.borrow();
            let (distance, azimuth) = nav.ll_to_da(lat, lon);
            let (range, elevation) = nav.dh_to_re(distance, height);
            (distance, azimuth, range, elevation)
        };
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
            elevation,
            ..Default::default()
        };

        let Some(index) = self.scan_index_closest_to_elevation(elevation, inside_only) else {
            return info;
        };
        info.elevation_index = Some(index);

        let scan = self.scans[index].borrow();
        info.ray = scan.azimuth_index(azimuth);
        if let Some(actual) = info.ray.and_then(|ray| scan.azimuth(ray)) {
            info.actual_azimuth = actual;
        }
        info.bin = scan.range_index(range);
        if let Some(actual) = info.bin.and_then(|bin| scan.range(bin)) {
            info.actual_range = actual;
            info.actual_height = self.navigator.borrow().re_to_dh(actual, scan.elangle()).1;
        }
        info
    }

    fn value_at(
        &self,
        info: &NavigationInfo,
        lookup: impl Fn(&PolarScan, usize, usize) -> RadarValue,
    ) -> RadarValue {
        match (info.elevation_index, info.cell()) {
            (Some(ei), Some((bin, ray))) => lookup(&*self.scans[ei].borrow(), bin, ray),
            _ => RadarValue::Undefined,
        }
    }

    /// Raw value of the default parameter nearest a position and height.
    pub fn nearest(&self, lon: f64, lat: f64, height: f64, inside_only: bool) -> RadarValue {
        let info = self.navigation_info(lon, lat, height, inside_only);
        self.value_at(&info, |scan, bin, ray| scan.value(bin, ray))
    }

    pub fn nearest_parameter_value(
        &self,
        quantity: &str,
        lon: f64,
        lat: f64,
        height: f64,
        inside_only: bool,
    ) -> RadarValue {
        let info = self.navigation_info(lon, lat, height, inside_only);
        self.value_at(&info, |scan, bin, ray| scan.parameter_value(quantity, bin, ray))
    }

    pub fn nearest_converted_parameter_value(
        &self,
        quantity: &str,
        lon: f64,
        lat: f64,
        height: f64,
        inside_only: bool,
    ) -> RadarValue {
        let info = self.navigation_info(lon, lat, height, inside_only);
        self.value_at(&info, |scan, bin, ray| {
            scan.converted_parameter_value(quantity, bin, ray)
        })
    }

    /// Quality value of `quantity` in scan `elevation_index`.
    pub fn quality_value_at(
        &self,
        quantity: &str,
        elevation_index: usize,
        bin: usize,
        ray: usize,
        task: &str,
    ) -> Option<f64> {
        self.scans
            .get(elevation_index)?
            .borrow()
            .quality_value_at(quantity, bin, ray, task)
    }

    // ========================================================================
    // Shared settings
    // ========================================================================

    pub fn default_parameter(&self) -> &str {
        &self.default_parameter
    }

    /// Set the default parameter on the volume and every scan.
    pub fn set_default_parameter(&mut self, quantity: &str) -> Result<()> {
        if quantity.trim().is_empty() {
            return Err(PolarDataError::InvalidDefaultParameter(quantity.to_string()));
        }
        self.default_parameter = quantity.to_string();
        for scan in &self.scans {
            scan.borrow_mut().set_default_parameter(quantity)?;
        }
        debug!(quantity, scans = self.scans.len(), "Set default parameter");
        Ok(())
    }

    pub fn projection(&self) -> Handle<Projection> {
        self.projection.clone()
    }

    /// Replace the projection on the volume and every scan.
    pub fn set_projection(&mut self, projection: Handle<Projection>) {
        for scan in &self.scans {
            scan.borrow_mut().set_projection(projection.clone());
        }
        self.projection = projection;
    }

    pub fn navigator(&self) -> Handle<PolarNavigator> {
        self.navigator.clone()
    }

    /// Replace the navigator on the volume and every scan.
    pub fn set_navigator(&mut self, navigator: Handle<PolarNavigator>) {
        for scan in &self.scans {
            scan.borrow_mut().set_navigator(navigator.clone());
        }
        self.navigator = navigator;
    }

    pub fn beamwidth(&self) -> Option<f64> {
        self.beamwidth
    }

    /// Set the beamwidth (radians) on the volume and every scan.
    pub fn set_beamwidth(&mut self, beamwidth: f64) {
        self.beamwidth = Some(beamwidth);
        for scan in &self.scans {
            scan.borrow_mut().set_beamwidth(beamwidth);
        }
    }

    /// Site longitude in radians.
    pub fn longitude(&self) -> f64 {
        self.navigator.borrow().lon0()
    }

    /// Set the site longitude on the shared navigator, which every scan sees.
    pub fn set_longitude(&mut self, lon: f64) {
        self.navigator.borrow_mut().set_lon0(lon);
    }

    pub fn latitude(&self) -> f64 {
        self.navigator.borrow().lat0()
    }

    pub fn set_latitude(&mut self, lat: f64) {
        self.navigator.borrow_mut().set_lat0(lat);
    }

    pub fn height(&self) -> f64 {
        self.navigator.borrow().alt0()
    }

    pub fn set_height(&mut self, height: f64) {
        self.navigator.borrow_mut().set_alt0(height);
    }

    // ========================================================================
    // Ordering
    // ========================================================================

    /// Reorder the scans by elevation.
    pub fn sort_by_elevations(&mut self, ascending: bool) {
        self.scans.sort_by(|a, b| {
            let ordering = a.borrow().elangle().total_cmp(&b.borrow().elangle());
            if ascending {
                ordering
            } else {
                ordering.reverse()
            }
        });
        debug!(ascending, scans = self.scans.len(), "Sorted scans by elevation");
    }

    /// True when no scan has a lower elevation than its predecessor.
    pub fn is_ascending_scans(&self) -> bool {
        (1..self.scans.len()).all(|i| self.elangle(i) >= self.elangle(i - 1))
    }

    /// At least one scan, in ascending order.
    pub fn is_transformable(&self) -> bool {
        !self.scans.is_empty() && self.is_ascending_scans()
    }

    // ========================================================================
    // Distances
    // ========================================================================

    /// Ground distance in metres from the site to a position in radians.
    pub fn distance(&self, lon: f64, lat: f64) -> f64 {
        self.navigator.borrow().distance(lat, lon)
    }

    /// Largest ground distance covered by any scan.
    pub fn max_distance(&self) -> f64 {
        self.scans
            .iter()
            .map(|s| s.borrow().max_distance())
            .fold(0.0, f64::max)
    }

    /// The scan covering the largest ground distance; the first one on ties.
    pub fn scan_with_max_distance(&self) -> Option<Handle<PolarScan>> {
        let mut best: Option<(f64, &Handle<PolarScan>)> = None;
        for scan in &self.scans {
            let d = scan.borrow().max_distance();
            if best.map_or(true, |(bd, _)| d > bd) {
                best = Some((d, scan));
            }
        }
        best.map(|(_, scan)| scan.clone())
    }

    // ========================================================================
    // Nominal time and source
    // ========================================================================

    pub fn date(&self) -> Option<String> {
        self.datetime.date()
    }

    pub fn set_date(&mut self, date: Option<&str>) -> RadarResult<()> {
        self.datetime.set_date(date)
    }

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
    // Attributes
    // ========================================================================

    /// Add an attribute; site position and beamwidth are given in degrees.
    pub fn add_attribute(&mut self, name: &str, value: impl Into<AttributeValue>) -> RadarResult<()> {
        let value = value.into();
        match name {
            "what/date" | "what/time" | "what/source" => {
                let s = value
                    .as_str()
                    .ok_or_else(|| RadarError::invalid_attribute(name, "expected a string"))?;
                match name {
                    "what/date" => self.set_date(Some(s))?,
                    "what/time" => self.set_time(Some(s))?,
                    _ => self.source = Some(s.to_string()),
                }
            }
            "where/lon" => self.set_longitude(require_double(name, &value)?.to_radians()),
            "where/lat" => self.set_latitude(require_double(name, &value)?.to_radians()),
            "where/height" => self.set_height(require_double(name, &value)?),
            "how/beamwidth" => self.set_beamwidth(require_double(name, &value)?.to_radians()),
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
            "how/beamwidth" => self.beamwidth.map(|bw| bw.to_degrees().into()),
            _ => self.attributes.get(name).cloned(),
        }
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

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

    /// True when the volume can be stored: date, time and source are set and
    /// it holds at least one scan, each with geometry and a parameter.
    pub fn is_valid(&self) -> bool {
        self.datetime.is_complete()
            && self.source.is_some()
            && !self.scans.is_empty()
            && self.scans.iter().all(|s| s.borrow().has_data())
    }
}
