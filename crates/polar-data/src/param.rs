//! Scan parameters: one measured quantity over the scan's bins and rays.

use radar_common::{
    AttributeTable, AttributeValue, DataType, Handle, ObjectType, RadarError, RadarObject,
    RadarResult, RadarValue,
};

use crate::error::Result;
use crate::field::QualityField;
use crate::raster::Raster2D;

/// Parameter attributes stored as fields rather than in the attribute table.
const FIXED_ATTRIBUTES: [&str; 5] = [
    "what/quantity",
    "what/gain",
    "what/offset",
    "what/nodata",
    "what/undetect",
];

/// Raw samples of one quantity with their scaling and quality fields.
///
/// Converted value is `offset + gain * raw`, except for raw values equal to
/// the `nodata` or `undetect` codes.
#[derive(Debug, Clone)]
pub struct PolarScanParam {
    quantity: String,
    gain: f64,
    offset: f64,
    nodata: f64,
    undetect: f64,
    data: Raster2D,
    attributes: AttributeTable,
    quality_fields: Vec<Handle<QualityField>>,
}

impl Default for PolarScanParam {
    fn default() -> Self {
        Self {
            quantity: String::new(),
            gain: 1.0,
            offset: 0.0,
            nodata: 255.0,
            undetect: 0.0,
            data: Raster2D::default(),
            attributes: AttributeTable::new(),
            quality_fields: Vec::new(),
        }
    }
}

impl RadarObject for PolarScanParam {
    const TYPE: ObjectType = ObjectType::new("PolarScanParam");

    fn clone_object(&self) -> Self {
        Self {
            quality_fields: self.quality_fields.iter().map(Handle::deep_clone).collect(),
            ..self.clone()
        }
    }
}

impl PolarScanParam {
    /// Zero-filled parameter.
    ///
    /// # Arguments
    ///
    /// * `quantity` - Name of the measured variable, e.g. `DBZH`
    /// * `nbins` - Number of range bins
    /// * `nrays` - Number of rays
    /// * `data_type` - Storage type of the raw samples
    pub fn new(quantity: impl Into<String>, nbins: usize, nrays: usize, data_type: DataType) -> Self {
        Self {
            quantity: quantity.into(),
            data: Raster2D::new(nbins, nrays, data_type),
            ..Self::default()
        }
    }

    pub fn quantity(&self) -> &str {
        &self.quantity
    }

    /// Rename the quantity. A scan keeps the key it was added under.
    pub fn set_quantity(&mut self, quantity: impl Into<String>) {
        self.quantity = quantity.into();
    }

    pub fn gain(&self) -> f64 {
        self.gain
    }

    pub fn set_gain(&mut self, gain: f64) {
        self.gain = gain;
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn set_offset(&mut self, offset: f64) {
        self.offset = offset;
    }

    pub fn nodata(&self) -> f64 {
        self.nodata
    }

    pub fn set_nodata(&mut self, nodata: f64) {
        self.nodata = nodata;
    }

    pub fn undetect(&self) -> f64 {
        self.undetect
    }

    pub fn set_undetect(&mut self, undetect: f64) {
        self.undetect = undetect;
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

    /// Replace all samples. `values` is ray-major and must hold
    /// `nbins * nrays` entries.
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

    /// Replace all samples from a native-endian byte buffer.
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

    fn classify(&self, raw: f64, converted: f64) -> RadarValue {
        if raw == self.nodata {
            RadarValue::Nodata(raw)
        } else if raw == self.undetect {
            RadarValue::Undetect(raw)
        } else {
            RadarValue::Value(converted)
        }
    }

    /// Raw value at (bin, ray) with its classification.
    pub fn value(&self, bin: usize, ray: usize) -> RadarValue {
        match self.data.get(bin, ray) {
            Some(raw) => self.classify(raw, raw),
            None => RadarValue::Undefined,
        }
    }

    /// Converted value at (bin, ray) with its classification.
    pub fn converted_value(&self, bin: usize, ray: usize) -> RadarValue {
        match self.data.get(bin, ray) {
            Some(raw) => self.classify(raw, self.offset + self.gain * raw),
            None => RadarValue::Undefined,
        }
    }

    /// Store a raw value; false outside the raster.
    pub fn set_value(&mut self, bin: usize, ray: usize, raw: f64) -> bool {
        self.data.set(bin, ray, raw)
    }

    /// Store a value in physical units by inverting the gain and offset.
    ///
    /// Fails when the gain is zero.
    pub fn set_converted_value(&mut self, bin: usize, ray: usize, value: f64) -> bool {
        if self.gain == 0.0 {
            return false;
        }
        self.data.set(bin, ray, (value - self.offset) / self.gain)
    }

    /// Add an attribute. `what/quantity`, `what/gain`, `what/offset`,
    /// `what/nodata` and `what/undetect` update the corresponding fields.
    pub fn add_attribute(&mut self, name: &str, value: impl Into<AttributeValue>) -> RadarResult<()> {
        let value = value.into();
        match name {
            "what/quantity" => {
                let quantity = value
                    .as_str()
                    .ok_or_else(|| RadarError::invalid_attribute(name, "expected a string"))?;
                self.quantity = quantity.to_string();
            }
            "what/gain" => self.gain = require_double(name, &value)?,
            "what/offset" => self.offset = require_double(name, &value)?,
            "what/nodata" => self.nodata = require_double(name, &value)?,
            "what/undetect" => self.undetect = require_double(name, &value)?,
            _ => self.attributes.set(name, value)?,
        }
        Ok(())
    }

    pub fn attribute(&self, name: &str) -> Option<AttributeValue> {
        match name {
            "what/quantity" => Some(AttributeValue::from(self.quantity.as_str())),
            "what/gain" => Some(self.gain.into()),
            "what/offset" => Some(self.offset.into()),
            "what/nodata" => Some(self.nodata.into()),
            "what/undetect" => Some(self.undetect.into()),
            _ => self.attributes.get(name).cloned(),
        }
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        FIXED_ATTRIBUTES.contains(&name) || self.attributes.contains(name)
    }

    pub fn attribute_names(&self) -> Vec<String> {
        FIXED_ATTRIBUTES
            .iter()
            .map(|s| s.to_string())
            .chain(self.attributes.names())
            .collect()
    }

    /// Every attribute with its value, fixed ones first.
    pub fn attribute_values(&self) -> Vec<(String, AttributeValue)> {
        self.attribute_names()
            .into_iter()
            .filter_map(|name| self.attribute(&name).map(|v| (name, v)))
            .collect()
    }

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

    /// Remove and return the field at `index`.
    pub fn remove_quality_field(&mut self, index: usize) -> Option<Handle<QualityField>> {
        if index < self.quality_fields.len() {
            Some(self.quality_fields.remove(index))
        } else {
            None
        }
    }

    /// First field whose `how/task` equals `task`.
    pub fn quality_field_by_how_task(&self, task: &str) -> Option<Handle<QualityField>> {
        find_by_how_task(&self.quality_fields, task)
    }
}

pub(crate) fn find_by_how_task(
    fields: &[Handle<QualityField>],
    task: &str,
) -> Option<Handle<QualityField>> {
    fields
        .iter()
        .find(|f| f.borrow().how_task() == Some(task))
        .cloned()
}

pub(crate) fn require_double(name: &str, value: &AttributeValue) -> RadarResult<f64> {
    value.as_double().ok_or_else(|| {
        RadarError::invalid_attribute(name, format!("expected a number, got {}", value.type_name()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dbzh() -> PolarScanParam {
        let mut param = PolarScanParam::new("DBZH", 10, 36, DataType::UChar);
        param.set_gain(0.5);
        param.set_offset(-32.0);
        param.set_nodata(255.0);
        param.set_undetect(0.0);
        param
    }

    #[test]
    fn test_defaults() {
        let param = PolarScanParam::default();
        assert_eq!(param.gain(), 1.0);
        assert_eq!(param.offset(), 0.0);
        assert_eq!(param.nodata(), 255.0);
        assert_eq!(param.undetect(), 0.0);
        assert_eq!(param.data_type(), DataType::UChar);
    }

    #[test]
    fn test_converted_value_classification() {
        let mut param = dbzh();
        param.set_value(2, 5, 64.0);
        param.set_value(3, 5, 255.0);

        assert_eq!(param.converted_value(2, 5), RadarValue::Value(0.0));
        assert_eq!(param.value(2, 5), RadarValue::Value(64.0));
        assert_eq!(param.converted_value(3, 5), RadarValue::Nodata(255.0));
        assert_eq!(param.converted_value(4, 5), RadarValue::Undetect(0.0));
        assert_eq!(param.converted_value(10, 5), RadarValue::Undefined);
    }

    #[test]
    fn test_set_converted_value() {
        let mut param = dbzh();
        assert!(param.set_converted_value(1, 1, 10.0));
        assert_eq!(param.value(1, 1), RadarValue::Value(84.0));

        param.set_gain(0.0);
        assert!(!param.set_converted_value(1, 1, 10.0));
    }

    #[test]
    fn test_set_data_checks_length() {
        let mut param = dbzh();
        assert!(param.set_data(2, 2, DataType::UChar, vec![1.0; 5]).is_err());
        assert!(param.set_data(2, 2, DataType::UChar, vec![1.0; 4]).is_ok());
        assert_eq!(param.nbins(), 2);
        assert_eq!(param.nrays(), 2);
    }

    #[test]
    fn test_fixed_attributes_map_to_fields() {
        let mut param = PolarScanParam::default();
        param.add_attribute("what/quantity", "TH").unwrap();
        param.add_attribute("what/gain", 0.4).unwrap();
        param.add_attribute("what/nodata", 65535_i64).unwrap();
        param.add_attribute("how/comment", "calibrated").unwrap();

        assert_eq!(param.quantity(), "TH");
        assert_eq!(param.gain(), 0.4);
        assert_eq!(param.nodata(), 65535.0);
        assert!(param.has_attribute("how/comment"));
        assert!(param.has_attribute("what/offset"));
        assert!(param.add_attribute("what/gain", "high").is_err());
        assert!(param.add_attribute("what/quantity", 1.0).is_err());

        let names = param.attribute_names();
        assert_eq!(names.len(), 6);
        assert_eq!(
            param.attribute("what/quantity"),
            Some(AttributeValue::String("TH".into()))
        );
    }

    #[test]
    fn test_quality_fields() {
        let mut param = dbzh();
        param.add_quality_field(Handle::new(QualityField::for_task(
            "fi.fmi.ropo.detector",
            10,
            36,
            DataType::UChar,
        )));
        assert_eq!(param.quality_field_count(), 1);
        assert!(param.quality_field_by_how_task("fi.fmi.ropo.detector").is_some());
        assert!(param.quality_field_by_how_task("other").is_none());

        let removed = param.remove_quality_field(0).unwrap();
        assert_eq!(removed.ref_count(), 1);
        assert!(param.remove_quality_field(0).is_none());
    }

    #[test]
    fn test_clone_object_copies_quality_fields() {
        let mut param = dbzh();
        let field = Handle::new(QualityField::new(10, 36, DataType::UChar));
        param.add_quality_field(field.clone());

        let copy = param.clone_object();
        assert!(!copy.quality_field(0).unwrap().ptr_eq(&field));
        assert_eq!(field.ref_count(), 2);
    }
}
