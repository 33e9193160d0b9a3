//! Polar radar data model
//!
//! Scans and volumes in the radar's own range/azimuth geometry, with the
//! per-cell measurements and quality information attached to them.
//!
//! # Architecture
//!
//! ```text
//! PolarVolume
//!      │  shares navigator, projection and default parameter with every scan
//!      ▼
//! PolarScan ──────────► PolarNavigator (shared)
//!      │                Projection (shared)
//!      ├─► PolarScanParam "DBZH" ──► QualityField ...
//!      ├─► PolarScanParam "VRADH"
//!      └─► QualityField ...
//! ```
//!
//! All entities live in [`radar_common::Handle`]s. Cloning a handle shares
//! the entity; [`radar_common::Handle::deep_clone`] copies it, sharing only
//! the navigator and projection.
//!
//! # Example
//!
//! ```ignore
//! use polar_data::{PolarScan, PolarScanParam, PolarVolume};
//! use radar_common::{DataType, Handle};
//!
//! let mut param = PolarScanParam::new("DBZH", 10, 36, DataType::UChar);
//! param.set_gain(0.5);
//! param.set_offset(-32.0);
//! param.set_value(2, 5, 64.0);
//!
//! let mut scan = PolarScan::new();
//! scan.set_rscale(500.0);
//! scan.add_parameter(Handle::new(param))?;
//!
//! let mut volume = PolarVolume::new();
//! volume.add_scan(Handle::new(scan));
//! ```

pub mod config;
pub mod error;
pub mod field;
pub mod param;
pub mod quality;
pub mod raster;
pub mod scan;
pub mod volume;

// Re-export commonly used types at crate root
pub use config::PolarDataConfig;
pub use error::{PolarDataError, Result};
pub use field::{QualityField, HOW_TASK, HOW_TASK_ARGS};
pub use param::PolarScanParam;
pub use quality::{
    apply_to_scan, apply_to_volume, find_parameter_set, load_parameter_sets,
    load_parameter_sets_file, ParameterSet, QualityControl,
};
pub use raster::Raster2D;
pub use scan::{BeamEdge, PolarScan};
pub use volume::PolarVolume;

pub use projection::{NavigationInfo, PolarNavigator, Projection};
