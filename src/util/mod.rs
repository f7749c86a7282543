//! Utility types and functions for GTO.
//!
//! This module contains fundamental types used throughout the library:
//! - [`DataType`] - Property type tag
//! - Half-float codec ([`half_to_float`], [`float_to_half`])
//! - [`Error`] / [`Result`] - Error handling

mod data_type;
mod error;
mod float16;

pub use data_type::*;
pub use error::*;
pub use float16::*;
