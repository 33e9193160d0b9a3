//! Typed metadata attributes.
//!
//! Attribute names follow the ODIM two-level path convention `group/name`,
//! e.g. `how/task` or `where/lon`. Values are strings, integers, reals or
//! sequences of those.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{RadarError, RadarResult};

/// Typed attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    String(String),
    Long(i64),
    Double(f64),
    LongArray(Vec<i64>),
    DoubleArray(Vec<f64>),
}

impl AttributeValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric scalar value; integers are widened.
    pub fn as_double(&self) -> Option<f64> {
        match self {
            AttributeValue::Double(v) => Some(*v),
            AttributeValue::Long(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Integer scalar value; reals are accepted only when integral.
    pub fn as_long(&self) -> Option<i64> {
        match self {
            AttributeValue::Long(v) => Some(*v),
            AttributeValue::Double(v) if v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            AttributeValue::String(_) => "string",
            AttributeValue::Long(_) => "long",
            AttributeValue::Double(_) => "double",
            AttributeValue::LongArray(_) => "long array",
            AttributeValue::DoubleArray(_) => "double array",
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::String(s) => write!(f, "{}", s),
            AttributeValue::Long(v) => write!(f, "{}", v),
            AttributeValue::Double(v) => write!(f, "{}", v),
            AttributeValue::LongArray(v) => write!(f, "{:?}", v),
            AttributeValue::DoubleArray(v) => write!(f, "{:?}", v),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::String(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::String(s)
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        AttributeValue::Long(v)
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        AttributeValue::Double(v)
    }
}

impl From<Vec<i64>> for AttributeValue {
    fn from(v: Vec<i64>) -> Self {
        AttributeValue::LongArray(v)
    }
}

impl From<Vec<f64>> for AttributeValue {
    fn from(v: Vec<f64>) -> Self {
        AttributeValue::DoubleArray(v)
    }
}

/// Check that `name` has the form `group/name` with both parts non-empty.
pub fn validate_name(name: &str) -> RadarResult<()> {
    match name.split_once('/') {
        Some((group, rest)) if !group.is_empty() && !rest.is_empty() && !rest.starts_with('/') => {
            Ok(())
        }
        _ => Err(RadarError::InvalidAttributeName(name.to_string())),
    }
}

/// Attributes keyed by `group/name`, kept in name order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeTable {
    values: BTreeMap<String, AttributeValue>,
}

impl AttributeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an attribute.
    pub fn set(&mut self, name: &str, value: impl Into<AttributeValue>) -> RadarResult<()> {
        validate_name(name)?;
        self.values.insert(name.to_string(), value.into());
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.values.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(AttributeValue::as_str)
    }

    pub fn get_double(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(AttributeValue::as_double)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<AttributeValue> {
        self.values.remove(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("how/task").is_ok());
        assert!(validate_name("where/lon").is_ok());
        assert!(validate_name("task").is_err());
        assert!(validate_name("/task").is_err());
        assert!(validate_name("how/").is_err());
        assert!(validate_name("how//task").is_err());
    }

    #[test]
    fn test_set_get_and_names() {
        let mut table = AttributeTable::new();
        table.set("how/task", "se.smhi.test").unwrap();
        table.set("how/gain", 0.5).unwrap();
        table.set("how/count", 3i64).unwrap();
        table.set("how/angles", vec![0.5, 1.5]).unwrap();

        assert_eq!(table.get_str("how/task"), Some("se.smhi.test"));
        assert_eq!(table.get_double("how/gain"), Some(0.5));
        assert_eq!(table.get_double("how/count"), Some(3.0));
        assert_eq!(
            table.get("how/angles"),
            Some(&AttributeValue::DoubleArray(vec![0.5, 1.5]))
        );
        assert_eq!(
            table.names(),
            vec!["how/angles", "how/count", "how/gain", "how/task"]
        );
    }

    #[test]
    fn test_set_invalid_name_leaves_table_unchanged() {
        let mut table = AttributeTable::new();
        assert!(matches!(
            table.set("task", "x"),
            Err(RadarError::InvalidAttributeName(_))
        ));
        assert!(table.is_empty());
    }

    #[test]
    fn test_untagged_json() {
        let values: Vec<AttributeValue> =
            serde_json::from_str(r#"["RAVE", 3, 0.5, [1, 2], [0.5, 1]]"#).unwrap();
        assert_eq!(
            values,
            vec![
                AttributeValue::String("RAVE".into()),
                AttributeValue::Long(3),
                AttributeValue::Double(0.5),
                AttributeValue::LongArray(vec![1, 2]),
                AttributeValue::DoubleArray(vec![0.5, 1.0]),
            ]
        );
        assert_eq!(serde_json::to_string(&values[1]).unwrap(), "3");
    }

    #[test]
    fn test_as_long() {
        assert_eq!(AttributeValue::Double(3.0).as_long(), Some(3));
        assert_eq!(AttributeValue::Double(3.5).as_long(), None);
        assert_eq!(AttributeValue::String("3".into()).as_long(), None);
    }
}
