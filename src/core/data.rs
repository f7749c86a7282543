//! Raw property payloads as delivered by the parsers.

use crate::util::DataType;

/// Flat payload of one property, tagged by type.
///
/// String values are string table ids here; resolving them is the caller's
/// business (see [`crate::model::Values`]). Half values are widened to `f32`.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyData {
    Int(Vec<i32>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    Half(Vec<f32>),
    String(Vec<u32>),
    Boolean(Vec<bool>),
    Short(Vec<i16>),
    Byte(Vec<u8>),
    Int64(Vec<i64>),
}

impl PropertyData {
    /// Empty payload of the given type with room for `capacity` values.
    pub fn with_capacity(ty: DataType, capacity: usize) -> Self {
        match ty {
            DataType::Int => Self::Int(Vec::with_capacity(capacity)),
            DataType::Float => Self::Float(Vec::with_capacity(capacity)),
            DataType::Double => Self::Double(Vec::with_capacity(capacity)),
            DataType::Half => Self::Half(Vec::with_capacity(capacity)),
            DataType::String => Self::String(Vec::with_capacity(capacity)),
            DataType::Boolean => Self::Boolean(Vec::with_capacity(capacity)),
            DataType::Short => Self::Short(Vec::with_capacity(capacity)),
            DataType::Byte => Self::Byte(Vec::with_capacity(capacity)),
            DataType::Int64 => Self::Int64(Vec::with_capacity(capacity)),
        }
    }

    /// Type tag of this payload.
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Int(_) => DataType::Int,
            Self::Float(_) => DataType::Float,
            Self::Double(_) => DataType::Double,
            Self::Half(_) => DataType::Half,
            Self::String(_) => DataType::String,
            Self::Boolean(_) => DataType::Boolean,
            Self::Short(_) => DataType::Short,
            Self::Byte(_) => DataType::Byte,
            Self::Int64(_) => DataType::Int64,
        }
    }

    /// Number of scalar values.
    pub fn len(&self) -> usize {
        match self {
            Self::Int(v) => v.len(),
            Self::Float(v) => v.len(),
            Self::Double(v) => v.len(),
            Self::Half(v) => v.len(),
            Self::String(v) => v.len(),
            Self::Boolean(v) => v.len(),
            Self::Short(v) => v.len(),
            Self::Byte(v) => v.len(),
            Self::Int64(v) => v.len(),
        }
    }

    /// Check if the payload holds no values.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_follows_variant() {
        for ty in DataType::ALL {
            let data = PropertyData::with_capacity(ty, 4);
            assert_eq!(data.data_type(), ty);
            assert!(data.is_empty());
        }
        assert_eq!(PropertyData::Short(vec![1, 2, 3]).len(), 3);
    }
}
