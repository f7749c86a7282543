//! # GTO
//!
//! Reader and writer for the GTO scene description format: named objects
//! carrying named components carrying typed properties, stored either as
//! human-readable text or as compact binary in either byte order.
//!
//! ## Modules
//!
//! - [`util`] - Type tags, half-float codec, errors
//! - [`core`] - String table, structural records, callback protocol
//! - [`text`] - Lexer and recursive-descent parser for the text encoding
//! - [`binary`] - Versioned binary decoder with byte-order detection
//! - [`reader`] - Format-sniffing entry point, random access, async gzip path
//! - [`writer`] - Text and binary writer
//! - [`model`] / [`simple`] - Materialized object model and default handlers
//! - [`compression`] - Gzip detection and the decompression seam
//!
//! ## Example
//!
//! ```
//! use gto::prelude::*;
//!
//! let model = Model {
//!     objects: vec![Object::new("cube", "polygon", 2).with_component(
//!         Component::new("points").with_property(
//!             Property::new("position", Values::Float(vec![0.0, 1.0, 2.0].into())).with_width(3),
//!         ),
//!     )],
//!     ..Default::default()
//! };
//!
//! let bytes = gto::write_binary(&model)?;
//! assert_eq!(gto::read_model(&bytes)?, model);
//! # Ok::<(), gto::Error>(())
//! ```

pub mod binary;
pub mod compression;
pub mod core;
pub mod model;
pub mod reader;
pub mod simple;
pub mod text;
pub mod util;
pub mod writer;

// Re-export commonly used types
pub use model::{Column, Component, Model, Object, Property, Values};
pub use reader::{FileType, ReadMode, Reader};
pub use simple::{read_model, write_binary, write_text, SimpleReader, SimpleWriter};
pub use util::{DataType, Error, Result};
pub use writer::{Format, Writer, WriterOptions};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::binary::Endian;
    pub use crate::compression::{Decompressor, GzipDecompressor};
    pub use crate::core::{
        ComponentInfo, Header, Layout, ObjectInfo, PropertyData, PropertyInfo, ReadHandler,
        Request, StringTable,
    };
    pub use crate::model::{Column, Component, Element, Model, Object, Property, Values};
    pub use crate::reader::{FileType, ReadMode, Reader};
    pub use crate::simple::{SimpleReader, SimpleWriter};
    pub use crate::util::{DataType, Error, Result};
    pub use crate::writer::{Format, Writer, WriterOptions};
}
