//! Default materializers.
//!
//! [`SimpleReader`] turns parse callbacks into a [`Model`];
//! [`SimpleWriter`] drives a [`Writer`] from one. A model that went through
//! one of them comes back unchanged through the other, in either encoding.

use crate::core::{
    ComponentInfo, Header, ObjectInfo, PropertyData, PropertyInfo, ReadHandler, Request,
    StringTable,
};
use crate::model::{Component, Model, Object, Property, Values};
use crate::reader::{ReadMode, Reader};
use crate::util::{Error, Result};
use crate::writer::{Format, Writer, WriterOptions};

/// A structural unit offered to a [`SimpleReader`] filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Selection<'a> {
    Object { name: &'a str, protocol: &'a str },
    Component { name: &'a str, interpretation: &'a str },
    Property { name: &'a str, interpretation: &'a str },
}

type Filter = Box<dyn FnMut(Selection<'_>) -> bool>;

/// Handler that materializes everything it is allowed to read.
#[derive(Default)]
pub struct SimpleReader {
    model: Model,
    filter: Option<Filter>,
    error: Option<Error>,
}

impl std::fmt::Debug for SimpleReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimpleReader")
            .field("model", &self.model)
            .field("filtered", &self.filter.is_some())
            .field("error", &self.error)
            .finish()
    }
}

impl SimpleReader {
    /// Materialize everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Materialize only what `filter` accepts. A rejected object or
    /// component drops everything beneath it.
    pub fn with_filter(filter: impl FnMut(Selection<'_>) -> bool + 'static) -> Self {
        Self {
            filter: Some(Box::new(filter)),
            ..Default::default()
        }
    }

    fn accept(&mut self, selection: Selection<'_>) -> Request {
        match self.filter.as_mut() {
            Some(filter) => Request::from(filter(selection)),
            None => Request::Read,
        }
    }

    /// Model built so far.
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Take the finished model, failing if any payload could not be resolved.
    pub fn finish(self) -> Result<Model> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.model),
        }
    }

    /// Clear the model for another pass.
    pub fn reset(&mut self) {
        self.model = Model::default();
        self.error = None;
    }

    fn store(&mut self, info: &PropertyInfo, data: PropertyData, strings: &StringTable) -> Result<()> {
        let layout = info.layout.normalized();
        let property = Property {
            name: strings.id_to_string(info.name)?.to_string(),
            interpretation: strings.id_to_string(info.interpretation)?.to_string(),
            layout,
            values: Values::resolve(data, strings, layout.element_width())?,
        };
        self.model
            .objects
            .last_mut()
            .and_then(|o| o.components.last_mut())
            .ok_or_else(|| Error::invalid("property data outside a component"))?
            .properties
            .push(property);
        Ok(())
    }
}

impl ReadHandler for SimpleReader {
    fn header(&mut self, header: &Header) {
        self.model.version = header.version;
        self.model.flags = header.flags;
    }

    fn object(&mut self, name: &str, protocol: &str, protocol_version: u32, _: &ObjectInfo) -> Request {
        let request = self.accept(Selection::Object { name, protocol });
        if request.is_read() {
            self.model.objects.push(Object::new(name, protocol, protocol_version));
        }
        request
    }

    fn component(&mut self, name: &str, interpretation: &str, info: &ComponentInfo) -> Request {
        let request = self.accept(Selection::Component { name, interpretation });
        if request.is_read() {
            if let Some(object) = self.model.objects.last_mut() {
                object.components.push(Component {
                    name: name.to_string(),
                    interpretation: interpretation.to_string(),
                    flags: info.flags,
                    child_level: info.child_level,
                    properties: Vec::new(),
                });
            }
        }
        request
    }

    fn property(&mut self, name: &str, interpretation: &str, _: &PropertyInfo) -> Request {
        self.accept(Selection::Property { name, interpretation })
    }

    fn data_read(&mut self, info: &PropertyInfo, data: PropertyData, strings: &StringTable) {
        if self.error.is_some() {
            return;
        }
        if let Err(err) = self.store(info, data, strings) {
            self.error = Some(err);
        }
    }
}

/// Drives a [`Writer`] from a [`Model`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SimpleWriter {
    options: WriterOptions,
}

impl SimpleWriter {
    pub fn new(options: WriterOptions) -> Self {
        Self { options }
    }

    /// Encode a whole model.
    pub fn write(&self, model: &Model, format: Format) -> Result<Vec<u8>> {
        let mut writer = Writer::new();
        writer.open(format, self.options)?;
        Self::declare(&mut writer, model)?;
        writer.close()
    }

    /// Declare every object of `model` on an open writer, data inline.
    pub fn declare(writer: &mut Writer, model: &Model) -> Result<()> {
        for object in &model.objects {
            writer.begin_object(&object.name, &object.protocol, object.protocol_version)?;
            for component in &object.components {
                writer.begin_component_with_flags(
                    &component.name,
                    &component.interpretation,
                    component.flags,
                    component.child_level,
                )?;
                for property in &component.properties {
                    let width = property.layout.element_width();
                    if !property.values.fits(width) {
                        return Err(Error::mismatch(
                            &property.name,
                            format!("every group must hold {} values", width),
                        ));
                    }
                    // Groups are flattened back into one payload
                    let data = writer.intern_values(&property.values);
                    writer.property_with_data(
                        &property.name,
                        &property.interpretation,
                        property.layout,
                        data,
                    )?;
                }
                writer.end_component()?;
            }
            writer.end_object()?;
        }
        Ok(())
    }
}

/// Materialize a whole text or binary stream.
pub fn read_model(bytes: &[u8]) -> Result<Model> {
    let mut handler = SimpleReader::new();
    Reader::new(ReadMode::NONE).read(bytes, &mut handler)?;
    handler.finish()
}

fn model_options(model: &Model) -> WriterOptions {
    WriterOptions::version(model.version).with_flags(model.flags)
}

/// Encode a model as text at the model's version.
///
/// Header flags have no text syntax and are dropped.
pub fn write_text(model: &Model) -> Result<String> {
    let bytes = SimpleWriter::new(model_options(model)).write(model, Format::Text)?;
    String::from_utf8(bytes).map_err(|e| Error::Utf8(e.utf8_error()))
}

/// Encode a model as little-endian binary at the model's version and flags.
pub fn write_binary(model: &Model) -> Result<Vec<u8>> {
    SimpleWriter::new(model_options(model)).write(model, Format::Binary)
}
