//! Common types and utilities shared across the polar radar crates.
//!
//! This crate provides the object runtime every radar entity lives in
//! (shared handles, deep cloning, external bindings and instrumentation)
//! together with the small value types used by the data model:
//!
//! - [`Handle`]: reference-counted, single-threaded shared ownership
//! - [`AttributeTable`]: `group/name` keyed metadata
//! - [`NominalDateTime`]: ODIM style `YYYYMMDD` / `HHmmss` nominal time
//! - [`RadarValue`] and [`DataType`]: classified cell values and raw storage types

pub mod attribute;
pub mod binding;
pub mod error;
pub mod object;
pub mod stats;
pub mod time;
pub mod value;

pub use attribute::{AttributeTable, AttributeValue};
pub use binding::BindingTable;
pub use error::{RadarError, RadarResult};
pub use object::{Handle, ObjectId, ObjectType, RadarObject, WeakHandle};
pub use stats::{Instrumentation, ObjectObserver, ObjectStatistics, TypeCounters};
pub use time::NominalDateTime;
pub use value::{DataType, RadarValue, ValueType};
