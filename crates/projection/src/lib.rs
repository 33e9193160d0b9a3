//! Radar site navigation and projection definitions.
//!
//! Implements the earth-curvature navigation directly rather than through a
//! projection library; map projections themselves are handled elsewhere and only
//! their definitions are carried here.

pub mod definition;
pub mod navigator;
pub mod navinfo;

pub use definition::{Projection, LONLAT_DEFINITION};
pub use navigator::{EarthModel, PolarNavigator};
pub use navinfo::NavigationInfo;
