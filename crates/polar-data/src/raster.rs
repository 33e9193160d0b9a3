//! Two-dimensional sample storage shared by parameters and quality fields.
//!
//! Samples are kept as `f64` and coerced into the declared storage type on
//! every write, so a `UChar` raster never holds anything outside 0..=255.
//! Layout is ray-major: sample `(bin, ray)` lives at `ray * nbins + bin`.

use bytemuck::Pod;
use radar_common::DataType;

use crate::error::{PolarDataError, Result};

/// Bin × ray raster with a declared storage type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Raster2D {
    nbins: usize,
    nrays: usize,
    data_type: DataType,
    data: Vec<f64>,
}

impl Raster2D {
    /// Zero-filled raster.
    pub fn new(nbins: usize, nrays: usize, data_type: DataType) -> Self {
        Self {
            nbins,
            nrays,
            data_type,
            data: vec![0.0; nbins * nrays],
        }
    }

    /// Raster from ray-major values, each coerced into `data_type`.
    pub fn from_values(
        nbins: usize,
        nrays: usize,
        data_type: DataType,
        values: Vec<f64>,
    ) -> Result<Self> {
        let expected = nbins * nrays;
        if values.len() != expected {
            return Err(PolarDataError::data_length(expected, values.len()));
        }
        let data = values.into_iter().map(|v| data_type.saturate(v)).collect();
        Ok(Self {
            nbins,
            nrays,
            data_type,
            data,
        })
    }

    /// Raster from a native-endian buffer of `data_type` samples.
    pub fn from_bytes(
        nbins: usize,
        nrays: usize,
        data_type: DataType,
        bytes: &[u8],
    ) -> Result<Self> {
        let expected = nbins * nrays * data_type.size_bytes();
        if bytes.len() != expected {
            return Err(PolarDataError::data_length(expected, bytes.len()));
        }
        let data = match data_type {
            DataType::Char => decode::<i8>(bytes, |v| v as f64),
            DataType::UChar => decode::<u8>(bytes, |v| v as f64),
            DataType::Short => decode::<i16>(bytes, |v| v as f64),
            DataType::UShort => decode::<u16>(bytes, |v| v as f64),
            DataType::Int => decode::<i32>(bytes, |v| v as f64),
            DataType::UInt => decode::<u32>(bytes, |v| v as f64),
            DataType::Long => decode::<i64>(bytes, |v| v as f64),
            DataType::Float => decode::<f32>(bytes, |v| v as f64),
            DataType::Double => decode::<f64>(bytes, |v| v),
        };
        Ok(Self {
            nbins,
            nrays,
            data_type,
            data,
        })
    }

    pub fn nbins(&self) -> usize {
        self.nbins
    }

    pub fn nrays(&self) -> usize {
        self.nrays
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn index(&self, bin: usize, ray: usize) -> Option<usize> {
        if bin < self.nbins && ray < self.nrays {
            Some(ray * self.nbins + bin)
        } else {
            None
        }
    }

    /// Sample at (bin, ray), `None` outside the raster.
    pub fn get(&self, bin: usize, ray: usize) -> Option<f64> {
        self.index(bin, ray).map(|i| self.data[i])
    }

    /// Store a sample; returns false outside the raster.
    pub fn set(&mut self, bin: usize, ray: usize, value: f64) -> bool {
        match self.index(bin, ray) {
            Some(i) => {
                self.data[i] = self.data_type.saturate(value);
                true
            }
            None => false,
        }
    }

    pub fn fill(&mut self, value: f64) {
        let value = self.data_type.saturate(value);
        self.data.iter_mut().for_each(|v| *v = value);
    }

    /// All samples in ray-major order.
    pub fn values(&self) -> &[f64] {
        &self.data
    }

    /// Change the storage type, coercing the stored samples.
    pub fn set_data_type(&mut self, data_type: DataType) {
        self.data_type = data_type;
        for v in self.data.iter_mut() {
            *v = data_type.saturate(*v);
        }
    }

    /// Native-endian buffer of the samples in the storage type.
    ///
    /// `Long` samples beyond 2^53 are not exact since storage is `f64`.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self.data_type {
            DataType::Char => encode(&self.data, |v| v as i8),
            DataType::UChar => encode(&self.data, |v| v as u8),
            DataType::Short => encode(&self.data, |v| v as i16),
            DataType::UShort => encode(&self.data, |v| v as u16),
            DataType::Int => encode(&self.data, |v| v as i32),
            DataType::UInt => encode(&self.data, |v| v as u32),
            DataType::Long => encode(&self.data, |v| v as i64),
            DataType::Float => encode(&self.data, |v| v as f32),
            DataType::Double => encode(&self.data, |v| v),
        }
    }
}

fn encode<T: Pod>(values: &[f64], convert: impl Fn(f64) -> T) -> Vec<u8> {
    let typed: Vec<T> = values.iter().map(|&v| convert(v)).collect();
    bytemuck::cast_slice(&typed).to_vec()
}

fn decode<T: Pod>(bytes: &[u8], convert: impl Fn(T) -> f64) -> Vec<f64> {
    bytes
        .chunks_exact(std::mem::size_of::<T>())
        .map(|chunk| convert(bytemuck::pod_read_unaligned::<T>(chunk)))
        .collect()
}
