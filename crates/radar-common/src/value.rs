//! Cell values and raw storage types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a cell lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    /// No value could be looked up (missing parameter, cell out of range).
    Undefined,
    /// Below detection threshold.
    Undetect,
    /// Not measured.
    Nodata,
    /// A measured value.
    Value,
}

/// Result of a cell lookup.
///
/// `Nodata` and `Undetect` carry the raw code that was stored in the cell;
/// `Value` carries the raw or converted value depending on the accessor used.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RadarValue {
    Undefined,
    Undetect(f64),
    Nodata(f64),
    Value(f64),
}

impl RadarValue {
    pub fn value_type(&self) -> ValueType {
        match self {
            RadarValue::Undefined => ValueType::Undefined,
            RadarValue::Undetect(_) => ValueType::Undetect,
            RadarValue::Nodata(_) => ValueType::Nodata,
            RadarValue::Value(_) => ValueType::Value,
        }
    }

    /// The measured value, if this is one.
    pub fn value(&self) -> Option<f64> {
        match self {
            RadarValue::Value(v) => Some(*v),
            _ => None,
        }
    }

    /// The number carried by the lookup, whatever its classification.
    pub fn raw(&self) -> Option<f64> {
        match self {
            RadarValue::Undefined => None,
            RadarValue::Undetect(v) | RadarValue::Nodata(v) | RadarValue::Value(v) => Some(*v),
        }
    }

    pub fn is_value(&self) -> bool {
        matches!(self, RadarValue::Value(_))
    }

    pub fn is_defined(&self) -> bool {
        !matches!(self, RadarValue::Undefined)
    }
}

/// Numeric storage type of a raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Char,
    UChar,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    Float,
    Double,
}

impl Default for DataType {
    fn default() -> Self {
        Self::UChar
    }
}

impl DataType {
    /// Size of one sample in bytes.
    pub fn size_bytes(&self) -> usize {
        match self {
            Self::Char | Self::UChar => 1,
            Self::Short | Self::UShort => 2,
            Self::Int | Self::UInt | Self::Float => 4,
            Self::Long | Self::Double => 8,
        }
    }

    /// Coerce a value into the range representable by this type.
    ///
    /// Integer types truncate toward zero and saturate at their bounds;
    /// NaN becomes 0 for integer types.
    pub fn saturate(&self, value: f64) -> f64 {
        match self {
            Self::Char => value as i8 as f64,
            Self::UChar => value as u8 as f64,
            Self::Short => value as i16 as f64,
            Self::UShort => value as u16 as f64,
            Self::Int => value as i32 as f64,
            Self::UInt => value as u32 as f64,
            Self::Long => value as i64 as f64,
            Self::Float => value as f32 as f64,
            Self::Double => value,
        }
    }

    pub fn is_integer(&self) -> bool {
        !matches!(self, Self::Float | Self::Double)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Char => "char",
            Self::UChar => "uchar",
            Self::Short => "short",
            Self::UShort => "ushort",
            Self::Int => "int",
            Self::UInt => "uint",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
        }
    }

    /// Parse from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "char" | "int8" => Some(Self::Char),
            "uchar" | "uint8" => Some(Self::UChar),
            "short" | "int16" => Some(Self::Short),
            "ushort" | "uint16" => Some(Self::UShort),
            "int" | "int32" => Some(Self::Int),
            "uint" | "uint32" => Some(Self::UInt),
            "long" | "int64" => Some(Self::Long),
            "float" | "float32" => Some(Self::Float),
            "double" | "float64" => Some(Self::Double),
            _ => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
