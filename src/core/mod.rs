//! Core structures shared by the parsers and the writer.
//!
//! - [`StringTable`] - Per-pass string interning
//! - [`Header`], [`ObjectInfo`], [`ComponentInfo`], [`PropertyInfo`] - Structural records
//! - [`Layout`] - Property element shape
//! - [`PropertyData`] - Raw typed payloads
//! - [`ReadHandler`] / [`Request`] - Callback protocol

mod data;
mod handler;
mod info;
mod string_table;

pub use data::*;
pub use handler::*;
pub use info::*;
pub use string_table::*;
