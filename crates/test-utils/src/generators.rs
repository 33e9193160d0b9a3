//! Test data generators for creating synthetic radar data.
//!
//! These generators create predictable, verifiable raster patterns and
//! ready-made scans and volumes that can be used across the test suite.
//! Rasters are ray-major: sample `(bin, ray)` is at `ray * nbins + bin`.

use polar_data::{PolarScan, PolarScanParam, PolarVolume};
use radar_common::{DataType, Handle};

use crate::fixtures::{sites::RadarSite, time};

/// ODIM scaling of 8-bit reflectivity.
pub const DBZH_GAIN: f64 = 0.5;
pub const DBZH_OFFSET: f64 = -32.0;
pub const DBZH_NODATA: f64 = 255.0;
pub const DBZH_UNDETECT: f64 = 0.0;

/// Creates a raster with predictable values.
///
/// Each sample is calculated as: `ray * 1000 + bin`
///
/// # Arguments
///
/// * `nbins` - Number of range bins
/// * `nrays` - Number of rays
///
/// # Example
///
/// ```
/// use test_utils::create_index_pattern;
///
/// let data = create_index_pattern(10, 4);
/// assert_eq!(data.len(), 40);
/// assert_eq!(data[1], 1.0);     // bin 1, ray 0
/// assert_eq!(data[10], 1000.0); // bin 0, ray 1
/// ```
pub fn create_index_pattern(nbins: usize, nrays: usize) -> Vec<f64> {
    let mut data = Vec::with_capacity(nbins * nrays);
    for ray in 0..nrays {
        for bin in 0..nbins {
            data.push((ray * 1000 + bin) as f64);
        }
    }
    data
}

/// Creates raw 8-bit reflectivity with scattered echoes.
///
/// About half the cells are undetect (0), a few are nodata (255) and the
/// rest hold raw values 1..=254. Deterministic for a given seed.
///
/// # Arguments
///
/// * `nbins` - Number of range bins
/// * `nrays` - Number of rays
/// * `seed` - Seed value for deterministic generation
pub fn create_reflectivity_pattern(nbins: usize, nrays: usize, seed: u32) -> Vec<f64> {
    let mut data = Vec::with_capacity(nbins * nrays);
    for ray in 0..nrays {
        for bin in 0..nbins {
            let hash = simple_hash(bin as u32, ray as u32, seed);
            let raw = match hash % 16 {
                0 => DBZH_NODATA,
                1..=7 => DBZH_UNDETECT,
                _ => (1 + (hash >> 8) % 254) as f64,
            };
            data.push(raw);
        }
    }
    data
}

/// Simple deterministic hash for reproducible test data.
fn simple_hash(x: u32, y: u32, seed: u32) -> u32 {
    let mut h = seed;
    h = h.wrapping_mul(31).wrapping_add(x);
    h = h.wrapping_mul(31).wrapping_add(y);
    h ^= h >> 16;
    h = h.wrapping_mul(0x85ebca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2ae35);
    h ^= h >> 16;
    h
}

/// Creates a zero-filled `DBZH` parameter with ODIM 8-bit scaling.
pub fn create_dbzh_param(nbins: usize, nrays: usize) -> PolarScanParam {
    let mut param = PolarScanParam::new("DBZH", nbins, nrays, DataType::UChar);
    param.set_gain(DBZH_GAIN);
    param.set_offset(DBZH_OFFSET);
    param.set_nodata(DBZH_NODATA);
    param.set_undetect(DBZH_UNDETECT);
    param
}

/// Creates a `Double` parameter filled with [`create_index_pattern`].
pub fn create_index_param(quantity: &str, nbins: usize, nrays: usize) -> PolarScanParam {
    let mut param = PolarScanParam::new(quantity, nbins, nrays, DataType::Double);
    param.set_nodata(-1.0);
    param.set_undetect(-2.0);
    // The pattern always has nbins * nrays samples.
    let _ = param.set_data(nbins, nrays, DataType::Double, create_index_pattern(nbins, nrays));
    param
}

/// Creates a scan with one zero-filled `DBZH` parameter.
///
/// # Arguments
///
/// * `elevation` - Elevation angle in degrees
/// * `nbins` - Number of range bins
/// * `nrays` - Number of rays
/// * `rscale` - Bin length in metres
pub fn create_scan(elevation: f64, nbins: usize, nrays: usize, rscale: f64) -> PolarScan {
    let mut scan = PolarScan::new();
    scan.set_elangle(elevation.to_radians());
    scan.set_rscale(rscale);
    // An empty scan accepts any parameter with a quantity.
    let _ = scan.add_parameter(Handle::new(create_dbzh_param(nbins, nrays)));
    scan
}

/// Creates a volume at `site` with one [`create_scan`] per elevation, in
/// the given order, and nominal date, time and source set.
pub fn create_volume(
    site: &RadarSite,
    elevations: &[f64],
    nbins: usize,
    nrays: usize,
    rscale: f64,
) -> PolarVolume {
    let mut volume = PolarVolume::new();
    volume.set_longitude(site.lon.to_radians());
    volume.set_latitude(site.lat.to_radians());
    volume.set_height(site.height);
    volume.set_source(Some(site.source));
    // Fixture values are well-formed.
    let _ = volume.set_date(Some(time::NOMINAL_DATE));
    let _ = volume.set_time(Some(time::NOMINAL_TIME));
    for &elevation in elevations {
        volume.add_scan(Handle::new(create_scan(elevation, nbins, nrays, rscale)));
    }
    volume
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{elevations, sites};

    #[test]
    fn test_create_index_pattern() {
        let data = create_index_pattern(10, 4);
        assert_eq!(data.len(), 40);
        assert_eq!(data[39], 3009.0);
    }

    #[test]
    fn test_reflectivity_pattern_deterministic() {
        let a = create_reflectivity_pattern(100, 36, 42);
        let b = create_reflectivity_pattern(100, 36, 42);
        assert_eq!(a, b, "Same seed should produce same data");

        let c = create_reflectivity_pattern(100, 36, 43);
        assert_ne!(a, c, "Different seed should produce different data");
        assert!(a.iter().all(|&v| (0.0..=255.0).contains(&v) && v.fract() == 0.0));
        assert!(a.iter().any(|&v| v == DBZH_UNDETECT));
        assert!(a.iter().any(|&v| v > 0.0 && v < 255.0));
    }

    #[test]
    fn test_create_scan() {
        let scan = create_scan(0.5, 10, 36, 500.0);
        assert_eq!(scan.nbins(), 10);
        assert_eq!(scan.nrays(), 36);
        assert!(scan.is_transformable());
        assert!(scan.has_parameter("DBZH"));
    }

    #[test]
    fn test_create_index_param() {
        let param = create_index_param("VRADH", 5, 3);
        assert_eq!(param.data().get(4, 2), Some(2004.0));
    }

    #[test]
    fn test_create_volume() {
        let volume = create_volume(&sites::SEANG, &elevations::SIMPLE, 20, 36, 1000.0);
        assert_eq!(volume.scan_count(), 3);
        assert!(volume.is_valid());
        assert!(volume.is_ascending_scans());
    }
}
