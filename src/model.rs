//! Materialized object model.
//!
//! This is what [`crate::simple::SimpleReader`] builds and what
//! [`crate::simple::SimpleWriter`] consumes. Components and properties keep
//! their stream order; lookups by name scan in that order.

use crate::core::{Header, Layout, PropertyData, StringTable, GTO_VERSION};
use crate::util::{DataType, Result};

/// Values of one type, one entry per element.
///
/// Properties whose elements hold more than one value store one fixed-length
/// group per element; everything else is a plain sequence.
#[derive(Clone, Debug, PartialEq)]
pub enum Column<T> {
    /// One value per element.
    Scalar(Vec<T>),
    /// One group of `width * product(dims)` values per element.
    Grouped(Vec<Vec<T>>),
}

impl<T: Clone> Column<T> {
    /// Split flat values into groups of `width`. A width of one stays scalar.
    pub fn from_flat(values: Vec<T>, width: usize) -> Self {
        if width <= 1 {
            Column::Scalar(values)
        } else {
            Column::Grouped(values.chunks(width).map(<[T]>::to_vec).collect())
        }
    }

    /// All values in element order.
    pub fn to_flat(&self) -> Vec<T> {
        match self {
            Column::Scalar(v) => v.clone(),
            Column::Grouped(g) => g.concat(),
        }
    }

    pub fn into_flat(self) -> Vec<T> {
        match self {
            Column::Scalar(v) => v,
            Column::Grouped(g) => g.into_iter().flatten().collect(),
        }
    }

    /// Regroup for a new element width.
    pub fn regrouped(self, width: usize) -> Self {
        Self::from_flat(self.into_flat(), width)
    }
}

impl<T> Column<T> {
    /// Number of scalar values.
    pub fn len(&self) -> usize {
        match self {
            Column::Scalar(v) => v.len(),
            Column::Grouped(g) => g.iter().map(Vec::len).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of elements of `width` values.
    pub fn num_elements(&self, width: usize) -> usize {
        match self {
            Column::Scalar(v) => v.len() / width.max(1),
            Column::Grouped(g) => g.len(),
        }
    }

    /// Check that every group holds exactly `width` values.
    pub fn fits(&self, width: usize) -> bool {
        match self {
            Column::Scalar(_) => true,
            Column::Grouped(g) => g.iter().all(|v| v.len() == width),
        }
    }

    /// Values of element `i`.
    pub fn element(&self, i: usize, width: usize) -> &[T] {
        match self {
            Column::Scalar(v) => &v[i * width..(i + 1) * width],
            Column::Grouped(g) => &g[i],
        }
    }
}

impl<T> From<Vec<T>> for Column<T> {
    fn from(values: Vec<T>) -> Self {
        Column::Scalar(values)
    }
}

/// Property values with strings resolved to text.
#[derive(Clone, Debug, PartialEq)]
pub enum Values {
    Int(Column<i32>),
    Float(Column<f32>),
    Double(Column<f64>),
    Half(Column<f32>),
    String(Column<String>),
    Boolean(Column<bool>),
    Short(Column<i16>),
    Byte(Column<u8>),
    Int64(Column<i64>),
}

// Apply one expression to the column of any variant.
macro_rules! each_column {
    ($values:expr, $c:ident => $body:expr) => {
        match $values {
            Values::Int($c) => $body,
            Values::Float($c) => $body,
            Values::Double($c) => $body,
            Values::Half($c) => $body,
            Values::String($c) => $body,
            Values::Boolean($c) => $body,
            Values::Short($c) => $body,
            Values::Byte($c) => $body,
            Values::Int64($c) => $body,
        }
    };
}

/// One element of a property: `width * product(dims)` consecutive values.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Element<'a> {
    Int(&'a [i32]),
    Float(&'a [f32]),
    Double(&'a [f64]),
    Half(&'a [f32]),
    String(&'a [String]),
    Boolean(&'a [bool]),
    Short(&'a [i16]),
    Byte(&'a [u8]),
    Int64(&'a [i64]),
}

impl Element<'_> {
    /// Number of values in the element.
    pub fn len(&self) -> usize {
        match self {
            Element::Int(v) => v.len(),
            Element::Float(v) => v.len(),
            Element::Double(v) => v.len(),
            Element::Half(v) => v.len(),
            Element::String(v) => v.len(),
            Element::Boolean(v) => v.len(),
            Element::Short(v) => v.len(),
            Element::Byte(v) => v.len(),
            Element::Int64(v) => v.len(),
        }
    }

    /// Check if the element holds no values.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Values {
    /// Type tag of these values.
    pub fn data_type(&self) -> DataType {
        match self {
            Values::Int(_) => DataType::Int,
            Values::Float(_) => DataType::Float,
            Values::Double(_) => DataType::Double,
            Values::Half(_) => DataType::Half,
            Values::String(_) => DataType::String,
            Values::Boolean(_) => DataType::Boolean,
            Values::Short(_) => DataType::Short,
            Values::Byte(_) => DataType::Byte,
            Values::Int64(_) => DataType::Int64,
        }
    }

    /// Number of scalar values.
    pub fn len(&self) -> usize {
        each_column!(self, c => c.len())
    }

    /// Check if there are no values.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of elements of `width` values.
    pub fn num_elements(&self, width: usize) -> usize {
        each_column!(self, c => c.num_elements(width))
    }

    /// Check if the values are stored one group per element.
    pub fn is_grouped(&self) -> bool {
        each_column!(self, c => matches!(c, Column::Grouped(_)))
    }

    /// Check that every group holds exactly `width` values.
    pub fn fits(&self, width: usize) -> bool {
        each_column!(self, c => c.fits(width))
    }

    /// Resolve a raw payload, turning string ids back into text and
    /// grouping by `width`.
    pub fn resolve(data: PropertyData, strings: &StringTable, width: usize) -> Result<Self> {
        Ok(match data {
            PropertyData::Int(v) => Values::Int(Column::from_flat(v, width)),
            PropertyData::Float(v) => Values::Float(Column::from_flat(v, width)),
            PropertyData::Double(v) => Values::Double(Column::from_flat(v, width)),
            PropertyData::Half(v) => Values::Half(Column::from_flat(v, width)),
            PropertyData::String(ids) => {
                let text = ids
                    .iter()
                    .map(|&id| strings.id_to_string(id).map(str::to_string))
                    .collect::<Result<Vec<_>>>()?;
                Values::String(Column::from_flat(text, width))
            }
            PropertyData::Boolean(v) => Values::Boolean(Column::from_flat(v, width)),
            PropertyData::Short(v) => Values::Short(Column::from_flat(v, width)),
            PropertyData::Byte(v) => Values::Byte(Column::from_flat(v, width)),
            PropertyData::Int64(v) => Values::Int64(Column::from_flat(v, width)),
        })
    }

    /// Flatten to a raw payload, interning string values into `strings`.
    pub fn to_data(&self, strings: &mut StringTable) -> PropertyData {
        match self {
            Values::Int(c) => PropertyData::Int(c.to_flat()),
            Values::Float(c) => PropertyData::Float(c.to_flat()),
            Values::Double(c) => PropertyData::Double(c.to_flat()),
            Values::Half(c) => PropertyData::Half(c.to_flat()),
            Values::String(c) => {
                let flat = match c {
                    Column::Scalar(v) => v.iter().map(|s| strings.intern(s)).collect(),
                    Column::Grouped(g) => g.iter().flatten().map(|s| strings.intern(s)).collect(),
                };
                PropertyData::String(flat)
            }
            Values::Boolean(c) => PropertyData::Boolean(c.to_flat()),
            Values::Short(c) => PropertyData::Short(c.to_flat()),
            Values::Byte(c) => PropertyData::Byte(c.to_flat()),
            Values::Int64(c) => PropertyData::Int64(c.to_flat()),
        }
    }

    /// Regroup for a new element width.
    pub fn regrouped(self, width: usize) -> Self {
        match self {
            Values::Int(c) => Values::Int(c.regrouped(width)),
            Values::Float(c) => Values::Float(c.regrouped(width)),
            Values::Double(c) => Values::Double(c.regrouped(width)),
            Values::Half(c) => Values::Half(c.regrouped(width)),
            Values::String(c) => Values::String(c.regrouped(width)),
            Values::Boolean(c) => Values::Boolean(c.regrouped(width)),
            Values::Short(c) => Values::Short(c.regrouped(width)),
            Values::Byte(c) => Values::Byte(c.regrouped(width)),
            Values::Int64(c) => Values::Int64(c.regrouped(width)),
        }
    }

    /// Element `i` of `width` values.
    pub fn element(&self, i: usize, width: usize) -> Element<'_> {
        match self {
            Values::Int(c) => Element::Int(c.element(i, width)),
            Values::Float(c) => Element::Float(c.element(i, width)),
            Values::Double(c) => Element::Double(c.element(i, width)),
            Values::Half(c) => Element::Half(c.element(i, width)),
            Values::String(c) => Element::String(c.element(i, width)),
            Values::Boolean(c) => Element::Boolean(c.element(i, width)),
            Values::Short(c) => Element::Short(c.element(i, width)),
            Values::Byte(c) => Element::Byte(c.element(i, width)),
            Values::Int64(c) => Element::Int64(c.element(i, width)),
        }
    }
}

/// A named group of properties.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Component {
    pub name: String,
    pub interpretation: String,
    pub flags: u32,
    pub child_level: u32,
    pub properties: Vec<Property>,
}

impl Component {
    /// Empty component.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the interpretation hint.
    pub fn with_interpretation(mut self, interpretation: impl Into<String>) -> Self {
        self.interpretation = interpretation.into();
        self
    }

    /// Append a property.
    pub fn with_property(mut self, property: Property) -> Self {
        self.properties.push(property);
        self
    }

    /// Find a property by name.
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// A top-level entity with an opaque protocol tag.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Object {
    pub name: String,
    pub protocol: String,
    pub protocol_version: u32,
    pub components: Vec<Component>,
}

impl Object {
    /// Empty object.
    pub fn new(name: impl Into<String>, protocol: impl Into<String>, protocol_version: u32) -> Self {
        Self {
            name: name.into(),
            protocol: protocol.into(),
            protocol_version,
            components: Vec::new(),
        }
    }

    /// Append a component.
    pub fn with_component(mut self, component: Component) -> Self {
        self.components.push(component);
        self
    }

    /// Find a component by name.
    pub fn component(&self, name: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.name == name)
    }
}

/// A whole stream.
#[derive(Clone, Debug, PartialEq)]
pub struct Model {
    pub version: u32,
    /// Header flag bits, see [`Header::TRANSPOSED`].
    pub flags: u32,
    pub objects: Vec<Object>,
}

impl Model {
    /// Empty model at the default version.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check the transposed header flag.
    pub fn is_transposed(&self) -> bool {
        self.flags & Header::TRANSPOSED != 0
    }

    /// Find an object by name.
    pub fn object(&self, name: &str) -> Option<&Object> {
        self.objects.iter().find(|o| o.name == name)
    }

    /// Look up `object.component.property`.
    pub fn property(&self, object: &str, component: &str, property: &str) -> Option<&Property> {
        self.object(object)?.component(component)?.property(property)
    }
}

impl Default for Model {
    fn default() -> Self {
        Self {
            version: GTO_VERSION,
            flags: 0,
            objects: Vec::new(),
        }
    }
}
