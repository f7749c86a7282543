//! GTO writer.
//!
//! The writer is a small state machine driven by declarations:
//!
//! ```text
//! Closed --open--> Initial --begin_object--> Object --begin_component--> Component
//!                     ^                        |  ^                         |
//!                     +-------end_object-------+  +-----end_component-------+
//!
//! Initial --begin_data--> Data --end_data--> Initial --close--> Closed
//! ```
//!
//! Properties are declared inside a component either with their data
//! ([`Writer::property_with_data`]) or shape first ([`Writer::property`]),
//! with the payloads supplied later between [`Writer::begin_data`] and
//! [`Writer::end_data`] in declaration order. Both routes produce identical
//! output. Nothing is emitted until [`Writer::close`].

mod binary;
mod text;

use crate::binary::Endian;
use crate::core::{
    ComponentInfo, Header, Index, Layout, ObjectInfo, PropertyData, PropertyInfo, StringTable,
    GTO_VERSION, NESTING_VERSION,
};
use crate::model::Values;
use crate::util::{DataType, Error, Result};

pub use binary::binary_size;

/// Output encoding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Format {
    Text,
    #[default]
    Binary,
}

/// Writer configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WriterOptions {
    /// Format version, 2 through 4.
    pub version: u32,
    /// Byte order of binary output.
    pub byte_order: Endian,
    /// Header flag bits.
    pub flags: u32,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            version: GTO_VERSION,
            byte_order: Endian::Little,
            flags: 0,
        }
    }
}

impl WriterOptions {
    /// Options for the given version.
    pub fn version(version: u32) -> Self {
        Self {
            version,
            ..Default::default()
        }
    }

    /// Set the binary byte order.
    pub fn with_byte_order(mut self, byte_order: Endian) -> Self {
        self.byte_order = byte_order;
        self
    }

    /// Set the header flag bits.
    pub fn with_flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Closed,
    Initial,
    Object,
    Component,
    Data,
}

impl State {
    fn name(self) -> &'static str {
        match self {
            State::Closed => "closed",
            State::Initial => "initial",
            State::Object => "object",
            State::Component => "component",
            State::Data => "data",
        }
    }
}

/// Accumulating GTO writer. One instance can be reused across passes; each
/// [`Writer::open`] starts with a fresh string table.
#[derive(Debug)]
pub struct Writer {
    state: State,
    format: Format,
    options: WriterOptions,
    strings: StringTable,
    index: Index,
    payloads: Vec<Option<PropertyData>>,
    /// Next property waiting for data in the Data state
    next_data: usize,
}

impl Default for Writer {
    fn default() -> Self {
        Self::new()
    }
}

impl Writer {
    /// Create a closed writer.
    pub fn new() -> Self {
        Self {
            state: State::Closed,
            format: Format::default(),
            options: WriterOptions::default(),
            strings: StringTable::new(),
            index: Index::default(),
            payloads: Vec::new(),
            next_data: 0,
        }
    }

    /// Start a pass.
    pub fn open(&mut self, format: Format, options: WriterOptions) -> Result<()> {
        self.require(State::Closed, "open")?;
        if !Header::is_supported_version(options.version) {
            return Err(Error::UnsupportedVersion(options.version));
        }
        self.format = format;
        self.options = options;
        self.strings.clear();
        self.index.clear();
        self.payloads.clear();
        self.next_data = 0;
        self.state = State::Initial;
        tracing::trace!(?format, version = options.version, "writer opened");
        Ok(())
    }

    /// Check if a pass is in progress.
    pub fn is_open(&self) -> bool {
        self.state != State::Closed
    }

    /// Options of the current pass.
    pub fn options(&self) -> &WriterOptions {
        &self.options
    }

    /// Intern a string, e.g. to build string payloads by id.
    pub fn intern(&mut self, s: &str) -> u32 {
        self.strings.intern(s)
    }

    /// Flatten resolved values to a payload, interning strings.
    pub fn intern_values(&mut self, values: &Values) -> PropertyData {
        values.to_data(&mut self.strings)
    }

    /// String table of the current pass.
    pub fn string_table(&self) -> &StringTable {
        &self.strings
    }

    fn require(&self, state: State, op: &'static str) -> Result<()> {
        if self.state == state {
            Ok(())
        } else {
            Err(Error::InvalidState {
                op,
                state: self.state.name(),
            })
        }
    }

    /// Open an object block.
    pub fn begin_object(&mut self, name: &str, protocol: &str, protocol_version: u32) -> Result<()> {
        self.require(State::Initial, "begin an object")?;
        let info = ObjectInfo {
            name: self.strings.intern(name),
            protocol: self.strings.intern(protocol),
            protocol_version,
            num_components: 0,
            component_offset: self.index.components.len(),
        };
        self.index.objects.push(info);
        self.state = State::Object;
        Ok(())
    }

    /// Close the current object block.
    pub fn end_object(&mut self) -> Result<()> {
        self.require(State::Object, "end an object")?;
        self.state = State::Initial;
        Ok(())
    }

    /// Open a component of the current object.
    pub fn begin_component(&mut self, name: &str, interpretation: &str) -> Result<()> {
        self.begin_component_with_flags(name, interpretation, 0, 0)
    }

    /// Open a component with explicit flag bits and nesting level.
    ///
    /// The nesting level is only stored from version 4 on.
    pub fn begin_component_with_flags(
        &mut self,
        name: &str,
        interpretation: &str,
        flags: u32,
        child_level: u32,
    ) -> Result<()> {
        self.require(State::Object, "begin a component")?;
        let object = self.index.objects.len() - 1;
        let info = ComponentInfo {
            name: self.strings.intern(name),
            interpretation: self.strings.intern(interpretation),
            num_properties: 0,
            flags,
            child_level: if self.options.version >= NESTING_VERSION {
                child_level
            } else {
                0
            },
            object,
            property_offset: self.index.properties.len(),
        };
        self.index.components.push(info);
        self.index.objects[object].num_components += 1;
        self.state = State::Component;
        Ok(())
    }

    /// Close the current component.
    pub fn end_component(&mut self) -> Result<()> {
        self.require(State::Component, "end a component")?;
        self.state = State::Object;
        Ok(())
    }

    /// Declare a property whose data follows after [`Writer::begin_data`].
    pub fn property(
        &mut self,
        name: &str,
        interpretation: &str,
        ty: DataType,
        layout: Layout,
        size: u32,
    ) -> Result<()> {
        self.require(State::Component, "declare a property")?;
        self.declare(name, interpretation, ty, layout, size);
        self.payloads.push(None);
        Ok(())
    }

    /// Declare a property together with its data.
    ///
    /// The element count is derived from the data length, which must be a
    /// multiple of the layout's element width.
    pub fn property_with_data(
        &mut self,
        name: &str,
        interpretation: &str,
        layout: Layout,
        data: PropertyData,
    ) -> Result<()> {
        self.require(State::Component, "declare a property")?;
        let layout = layout.normalized();
        let element_width = layout.element_width();
        if data.len() % element_width != 0 {
            return Err(Error::mismatch(
                name,
                format!(
                    "{} values do not divide into elements of width {}",
                    data.len(),
                    element_width
                ),
            ));
        }
        let size = u32::try_from(data.len() / element_width)
            .map_err(|_| Error::mismatch(name, "too many elements"))?;
        self.check_string_ids(&data)?;
        self.declare(name, interpretation, data.data_type(), layout, size);
        self.payloads.push(Some(data));
        Ok(())
    }

    fn declare(
        &mut self,
        name: &str,
        interpretation: &str,
        ty: DataType,
        layout: Layout,
        size: u32,
    ) {
        let component = self.index.components.len() - 1;
        let layout = if self.options.version >= NESTING_VERSION {
            layout.normalized()
        } else {
            layout.flattened()
        };
        let info = PropertyInfo {
            name: self.strings.intern(name),
            interpretation: self.strings.intern(interpretation),
            ty,
            size,
            layout,
            component,
            data_offset: None,
        };
        self.index.properties.push(info);
        self.index.components[component].num_properties += 1;
    }

    fn property_name(&self, property: usize) -> String {
        self.strings
            .get(self.index.properties[property].name)
            .unwrap_or_default()
            .to_string()
    }

    fn check_data(&self, property: usize, data: &PropertyData) -> Result<()> {
        let info = &self.index.properties[property];
        if data.data_type() != info.ty {
            return Err(Error::mismatch(
                self.property_name(property),
                format!("declared {} but given {} data", info.ty, data.data_type()),
            ));
        }
        if data.len() != info.total_count() {
            return Err(Error::mismatch(
                self.property_name(property),
                format!("expected {} values, got {}", info.total_count(), data.len()),
            ));
        }
        self.check_string_ids(data)
    }

    fn check_string_ids(&self, data: &PropertyData) -> Result<()> {
        if let PropertyData::String(ids) = data {
            if let Some(&id) = ids.iter().find(|&&id| id as usize >= self.strings.len()) {
                return Err(Error::StringIdOutOfRange {
                    id,
                    count: self.strings.len(),
                });
            }
        }
        Ok(())
    }

    /// Enter the data phase for shape-first declarations.
    pub fn begin_data(&mut self) -> Result<()> {
        self.require(State::Initial, "begin data")?;
        self.next_data = 0;
        self.state = State::Data;
        Ok(())
    }

    /// Supply the payload of the next declared property still lacking data.
    pub fn property_data(&mut self, data: PropertyData) -> Result<()> {
        self.require(State::Data, "write property data")?;
        let property = (self.next_data..self.payloads.len())
            .find(|&i| self.payloads[i].is_none())
            .ok_or(Error::UndeclaredData)?;
        self.check_data(property, &data)?;
        self.payloads[property] = Some(data);
        self.next_data = property + 1;
        Ok(())
    }

    /// Leave the data phase.
    pub fn end_data(&mut self) -> Result<()> {
        self.require(State::Data, "end data")?;
        self.check_complete()?;
        self.state = State::Initial;
        Ok(())
    }

    fn check_complete(&self) -> Result<()> {
        match self.payloads.iter().position(Option::is_none) {
            Some(property) => Err(Error::MissingData(self.property_name(property))),
            None => Ok(()),
        }
    }

    /// Finish the pass and return the encoded stream.
    ///
    /// The writer returns to the closed state whether or not encoding
    /// succeeds.
    pub fn close(&mut self) -> Result<Vec<u8>> {
        self.require(State::Initial, "close")?;
        self.state = State::Closed;
        self.check_complete()?;

        let payloads: Vec<&PropertyData> = self.payloads.iter().flatten().collect();
        let out = match self.format {
            Format::Binary => binary::encode(&self.options, &self.strings, &self.index, &payloads)?,
            Format::Text => {
                text::encode(self.options.version, &self.strings, &self.index, &payloads)?.into_bytes()
            }
        };
        tracing::debug!(
            format = ?self.format,
            objects = self.index.objects.len(),
            properties = self.index.properties.len(),
            bytes = out.len(),
            "writer closed"
        );
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(format: Format) -> Writer {
        let mut w = Writer::new();
        w.open(format, WriterOptions::default()).unwrap();
        w
    }

    #[test]
    fn test_state_violations_fail() {
        let mut w = open(Format::Text);
        assert!(matches!(
            w.begin_component("c", ""),
            Err(Error::InvalidState { state: "initial", .. })
        ));
        w.begin_object("o", "p", 1).unwrap();
        assert!(w.property_with_data("x", "", Layout::SCALAR, PropertyData::Int(vec![1])).is_err());
        assert!(w.end_component().is_err());
        assert!(w.close().is_err());
        w.end_object().unwrap();
        assert!(w.end_object().is_err());
        w.close().unwrap();
        assert!(w.close().is_err());
        assert!(w.begin_object("o", "p", 1).is_err());
    }

    #[test]
    fn test_open_twice_fails() {
        let mut w = open(Format::Binary);
        assert!(w.open(Format::Binary, WriterOptions::default()).is_err());
    }

    #[test]
    fn test_unsupported_version_rejected() {
        let mut w = Writer::new();
        assert!(matches!(
            w.open(Format::Binary, WriterOptions::version(5)),
            Err(Error::UnsupportedVersion(5))
        ));
        assert!(!w.is_open());
    }

    #[test]
    fn test_data_must_fit_layout() {
        let mut w = open(Format::Binary);
        w.begin_object("o", "p", 1).unwrap();
        w.begin_component("c", "").unwrap();
        let err = w
            .property_with_data("v", "", Layout::width(3), PropertyData::Float(vec![1.0; 4]))
            .unwrap_err();
        assert!(matches!(err, Error::DataMismatch { .. }));
    }

    #[test]
    fn test_two_phase_checks_declarations() {
        let mut w = open(Format::Binary);
        w.begin_object("o", "p", 1).unwrap();
        w.begin_component("c", "").unwrap();
        w.property("a", "", DataType::Int, Layout::SCALAR, 2).unwrap();
        w.end_component().unwrap();
        w.end_object().unwrap();

        w.begin_data().unwrap();
        // wrong type, then wrong length
        assert!(w.property_data(PropertyData::Float(vec![1.0, 2.0])).is_err());
        assert!(w.property_data(PropertyData::Int(vec![1])).is_err());
        w.property_data(PropertyData::Int(vec![1, 2])).unwrap();
        assert!(matches!(
            w.property_data(PropertyData::Int(vec![3])),
            Err(Error::UndeclaredData)
        ));
        w.end_data().unwrap();
        assert!(!w.close().unwrap().is_empty());
    }

    #[test]
    fn test_missing_data_fails_close() {
        let mut w = open(Format::Text);
        w.begin_object("o", "p", 1).unwrap();
        w.begin_component("c", "").unwrap();
        w.property("a", "", DataType::Int, Layout::SCALAR, 1).unwrap();
        w.end_component().unwrap();
        w.end_object().unwrap();
        assert!(matches!(w.close(), Err(Error::MissingData(name)) if name == "a"));
        assert!(!w.is_open());
    }

    #[test]
    fn test_unknown_string_id_rejected() {
        let mut w = open(Format::Binary);
        w.begin_object("o", "p", 1).unwrap();
        w.begin_component("c", "").unwrap();
        assert!(matches!(
            w.property_with_data("s", "", Layout::SCALAR, PropertyData::String(vec![99])),
            Err(Error::StringIdOutOfRange { id: 99, .. })
        ));
    }

    #[test]
    fn test_reopen_resets_strings() {
        let mut w = open(Format::Binary);
        w.intern("leftover");
        w.close().unwrap();
        w.open(Format::Binary, WriterOptions::default()).unwrap();
        assert!(w.string_table().is_empty());
    }
}
