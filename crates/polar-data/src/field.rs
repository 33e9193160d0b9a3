//! Quality fields: auxiliary rasters describing confidence or provenance.

use radar_common::{
    AttributeTable, AttributeValue, DataType, ObjectType, RadarObject, RadarResult,
};

use crate::error::Result;
use crate::raster::Raster2D;

/// Attribute naming the algorithm that produced a field.
pub const HOW_TASK: &str = "how/task";
/// Attribute holding the serialized arguments of that algorithm.
pub const HOW_TASK_ARGS: &str = "how/task_args";

/// A quality raster with its own geometry and attributes.
///
/// The raster is sized independently of any scan it is attached to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QualityField {
    data: Raster2D,
    attributes: AttributeTable,
}

impl RadarObject for QualityField {
    const TYPE: ObjectType = ObjectType::new("QualityField");

    fn clone_object(&self) -> Self {
        self.clone()
    }
}

impl QualityField {
    pub fn new(nbins: usize, nrays: usize, data_type: DataType) -> Self {
        Self {
            data: Raster2D::new(nbins, nrays, data_type),
            attributes: AttributeTable::new(),
        }
    }

    pub fn from_raster(data: Raster2D) -> Self {
        Self {
            data,
            attributes: AttributeTable::new(),
        }
    }

    /// Field produced by `task`, with `how/task` already set.
    pub fn for_task(task: &str, nbins: usize, nrays: usize, data_type: DataType) -> Self {
        let mut field = Self::new(nbins, nrays, data_type);
        // HOW_TASK is a well-formed name, so this cannot fail.
        let _ = field.attributes.set(HOW_TASK, task);
        field
    }

    pub fn nbins(&self) -> usize {
        self.data.nbins()
    }

    pub fn nrays(&self) -> usize {
        self.data.nrays()
    }

    pub fn data_type(&self) -> DataType {
        self.data.data_type()
    }

    pub fn data(&self) -> &Raster2D {
        &self.data
    }

    /// Replace the raster from ray-major values.
    pub fn set_data(
        &mut self,
        nbins: usize,
        nrays: usize,
        data_type: DataType,
        values: Vec<f64>,
    ) -> Result<()> {
        self.data = Raster2D::from_values(nbins, nrays, data_type, values)?;
        Ok(())
    }

    /// Replace the raster from a native-endian byte buffer.
    pub fn set_bytes(
        &mut self,
        nbins: usize,
        nrays: usize,
        data_type: DataType,
        bytes: &[u8],
    ) -> Result<()> {
        self.data = Raster2D::from_bytes(nbins, nrays, data_type, bytes)?;
        Ok(())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.data.to_bytes()
    }

    /// Stored value at (bin, ray).
    pub fn value(&self, bin: usize, ray: usize) -> Option<f64> {
        self.data.get(bin, ray)
    }

    pub fn set_value(&mut self, bin: usize, ray: usize, value: f64) -> bool {
        self.data.set(bin, ray, value)
    }

    /// Value scaled by the optional `what/gain` and `what/offset`.
    pub fn converted_value(&self, bin: usize, ray: usize) -> Option<f64> {
        let gain = self.attributes.get_double("what/gain").unwrap_or(1.0);
        let offset = self.attributes.get_double("what/offset").unwrap_or(0.0);
        self.value(bin, ray).map(|v| offset + gain * v)
    }

    /// Identifier of the algorithm that produced this field.
    pub fn how_task(&self) -> Option<&str> {
        self.attributes.get_str(HOW_TASK)
    }

    pub fn add_attribute(&mut self, name: &str, value: impl Into<AttributeValue>) -> RadarResult<()> {
        self.attributes.set(name, value)
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains(name)
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<AttributeValue> {
        self.attributes.remove(name)
    }

    pub fn attribute_names(&self) -> Vec<String> {
        self.attributes.names()
    }

    pub fn attributes(&self) -> &AttributeTable {
        &self.attributes
    }
}
