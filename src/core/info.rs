//! Structural records describing a GTO stream.
//!
//! These mirror the binary header arrays: one [`Header`], then one
//! [`ObjectInfo`] per object, one [`ComponentInfo`] per component and one
//! [`PropertyInfo`] per property, each referencing names by string table id.

use crate::util::DataType;

/// Magic constant leading every binary stream.
pub const GTO_MAGIC: u32 = 0x0000_029F;

/// Format version written by default.
pub const GTO_VERSION: u32 = 4;

/// Oldest format version this crate reads and writes.
pub const MIN_VERSION: u32 = 2;

/// First version with component child levels and property dims.
pub const NESTING_VERSION: u32 = 4;

/// Stream header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
    pub magic: u32,
    pub num_strings: u32,
    pub num_objects: u32,
    pub version: u32,
    pub flags: u32,
}

impl Header {
    /// Header flag: property data is stored transposed.
    pub const TRANSPOSED: u32 = 1;

    /// Create a header for the given version with zero counts.
    pub fn new(version: u32) -> Self {
        Self {
            magic: GTO_MAGIC,
            num_strings: 0,
            num_objects: 0,
            version,
            flags: 0,
        }
    }

    /// Check whether a version is readable/writable.
    #[inline]
    pub fn is_supported_version(version: u32) -> bool {
        (MIN_VERSION..=GTO_VERSION).contains(&version)
    }

    /// Check the transposed flag.
    #[inline]
    pub fn is_transposed(&self) -> bool {
        self.flags & Self::TRANSPOSED != 0
    }
}

impl Default for Header {
    fn default() -> Self {
        Self::new(GTO_VERSION)
    }
}

/// Shape of one property element: a width and up to four dimensions.
///
/// Unused dimensions are zero and count as one. The number of scalar values
/// per element is `width * product(dims)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Layout {
    pub width: u32,
    pub dims: [u32; 4],
}

impl Layout {
    /// One value per element.
    pub const SCALAR: Self = Self {
        width: 1,
        dims: [0; 4],
    };

    /// Fixed-width vector elements.
    pub const fn width(width: u32) -> Self {
        Self {
            width,
            dims: [0; 4],
        }
    }

    /// Multi-dimensional elements. Extra entries beyond four are ignored.
    pub fn dims(dims: &[u32]) -> Self {
        let mut out = [0; 4];
        for (slot, d) in out.iter_mut().zip(dims) {
            *slot = *d;
        }
        Self { width: 1, dims: out }
    }

    /// Product of the used dimensions (saturating).
    pub fn dims_product(&self) -> usize {
        self.dims
            .iter()
            .filter(|&&d| d != 0)
            .fold(1usize, |acc, &d| acc.saturating_mul(d as usize))
    }

    /// Check if any dimension is set.
    #[inline]
    pub fn has_dims(&self) -> bool {
        self.dims.iter().any(|&d| d != 0)
    }

    /// Used dimensions, leading entries only.
    pub fn used_dims(&self) -> &[u32] {
        let n = self.dims.iter().position(|&d| d == 0).unwrap_or(4);
        &self.dims[..n]
    }

    /// Scalar values per element.
    #[inline]
    pub fn element_width(&self) -> usize {
        (self.width.max(1) as usize).saturating_mul(self.dims_product())
    }

    /// Canonical form: zero dims are moved past the used ones, and a lone
    /// dimension is a width.
    pub fn normalized(self) -> Self {
        let mut dims = [0; 4];
        for (slot, &d) in dims.iter_mut().zip(self.dims.iter().filter(|&&d| d != 0)) {
            *slot = d;
        }
        let compact = Self {
            width: self.width,
            dims,
        };
        match compact.used_dims() {
            [d] if compact.width <= 1 => Self::width(*d),
            _ => compact,
        }
    }

    /// Fold dims into width, for versions without dims.
    pub fn flattened(self) -> Self {
        Self::width(self.element_width() as u32)
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self::SCALAR
    }
}

/// Object record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ObjectInfo {
    /// Name string id
    pub name: u32,
    /// Protocol string id
    pub protocol: u32,
    pub protocol_version: u32,
    pub num_components: u32,
    /// Index of this object's first component in the flat component list
    pub component_offset: usize,
}

/// Component record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ComponentInfo {
    /// Name string id
    pub name: u32,
    /// Interpretation string id
    pub interpretation: u32,
    pub num_properties: u32,
    pub flags: u32,
    /// Nesting depth (version 4 and later)
    pub child_level: u32,
    /// Index of the owning object
    pub object: usize,
    /// Index of this component's first property in the flat property list
    pub property_offset: usize,
}

impl ComponentInfo {
    /// Component flag: data is stored transposed.
    pub const TRANSPOSED: u32 = 1;
}

/// Property record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PropertyInfo {
    /// Name string id
    pub name: u32,
    /// Interpretation string id
    pub interpretation: u32,
    pub ty: DataType,
    /// Number of elements
    pub size: u32,
    pub layout: Layout,
    /// Index of the owning component
    pub component: usize,
    /// Byte offset of the payload in a retained binary source
    pub data_offset: Option<usize>,
}

impl PropertyInfo {
    /// Total number of scalar values: `size * width * product(dims)`.
    #[inline]
    pub fn total_count(&self) -> usize {
        (self.size as usize).saturating_mul(self.layout.element_width())
    }

    /// Payload size in the binary data region.
    #[inline]
    pub fn byte_size(&self) -> usize {
        self.total_count().saturating_mul(self.ty.num_bytes())
    }

    /// Width of one element.
    #[inline]
    pub fn width(&self) -> u32 {
        self.layout.width
    }
}

/// Flat index of every structural record in one stream.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Index {
    pub objects: Vec<ObjectInfo>,
    pub components: Vec<ComponentInfo>,
    pub properties: Vec<PropertyInfo>,
}

impl Index {
    /// Drop all records.
    pub fn clear(&mut self) {
        self.objects.clear();
        self.components.clear();
        self.properties.clear();
    }

    /// Components belonging to object `index`.
    pub fn components_of(&self, index: usize) -> &[ComponentInfo] {
        match self.objects.get(index) {
            Some(o) => {
                let end = (o.component_offset + o.num_components as usize).min(self.components.len());
                &self.components[o.component_offset.min(end)..end]
            }
            None => &[],
        }
    }

    /// Properties belonging to component `index`.
    pub fn properties_of(&self, index: usize) -> &[PropertyInfo] {
        match self.components.get(index) {
            Some(c) => {
                let end = (c.property_offset + c.num_properties as usize).min(self.properties.len());
                &self.properties[c.property_offset.min(end)..end]
            }
            None => &[],
        }
    }
}
