//! DataType - the type tag carried by every property.

use std::fmt;

/// Element type of a property.
///
/// The discriminant is the on-disk type byte of the binary format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum DataType {
    /// Signed 32-bit integer
    #[default]
    Int = 0,
    /// 32-bit floating point
    Float = 1,
    /// 64-bit floating point
    Double = 2,
    /// 16-bit floating point (IEEE 754 half precision)
    Half = 3,
    /// String, stored as a string table id
    String = 4,
    /// Boolean (stored as u8: 0 = false, non-zero = true)
    Boolean = 5,
    /// Signed 16-bit integer
    Short = 6,
    /// Unsigned 8-bit integer
    Byte = 7,
    /// Signed 64-bit integer
    Int64 = 8,
}

impl DataType {
    /// Number of known types.
    pub const COUNT: usize = 9;

    /// All types in tag order.
    pub const ALL: [DataType; Self::COUNT] = [
        Self::Int,
        Self::Float,
        Self::Double,
        Self::Half,
        Self::String,
        Self::Boolean,
        Self::Short,
        Self::Byte,
        Self::Int64,
    ];

    /// Size in bytes of one value in the binary data region.
    #[inline]
    pub const fn num_bytes(self) -> usize {
        match self {
            Self::Int => 4,
            Self::Float => 4,
            Self::Double => 8,
            Self::Half => 2,
            Self::String => 4,
            Self::Boolean => 1,
            Self::Short => 2,
            Self::Byte => 1,
            Self::Int64 => 8,
        }
    }

    /// Type name as written in the text format.
    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Double => "double",
            Self::Half => "half",
            Self::String => "string",
            Self::Boolean => "bool",
            Self::Short => "short",
            Self::Byte => "byte",
            Self::Int64 => "int64",
        }
    }

    /// Parse a type from its text-format name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.name() == name)
    }

    /// Convert from the binary type byte.
    pub const fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Int),
            1 => Some(Self::Float),
            2 => Some(Self::Double),
            3 => Some(Self::Half),
            4 => Some(Self::String),
            5 => Some(Self::Boolean),
            6 => Some(Self::Short),
            7 => Some(Self::Byte),
            8 => Some(Self::Int64),
            _ => None,
        }
    }

    /// Binary type byte.
    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Returns true for Float, Double and Half.
    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::Float | Self::Double | Self::Half)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
