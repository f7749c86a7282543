//! Text GTO encoding.
//!
//! A text stream opens with `GTOa (version)` followed by object blocks:
//!
//! ```text
//! GTOa (4)
//!
//! sphere : polygon (2)
//! {
//!     points
//!     {
//!         float[3] position = [ [ 0.0 1.0 0.0 ] [ 1.0 0.0 0.0 ] ]
//!     }
//! }
//! ```
//!
//! `#` starts a comment running to the end of the line.

mod lexer;
mod parser;

pub use lexer::*;
pub use parser::*;

/// Check whether `bytes` look like a text stream: optional whitespace and
/// comments, then the `GTOa` keyword.
pub fn is_text(bytes: &[u8]) -> bool {
    let mut rest = bytes;
    loop {
        match rest.first() {
            Some(b) if b.is_ascii_whitespace() => rest = &rest[1..],
            Some(b'#') => {
                let end = rest.iter().position(|&b| b == b'\n').unwrap_or(rest.len());
                rest = &rest[end..];
            }
            _ => break,
        }
    }
    rest.starts_with(TEXT_MAGIC.as_bytes())
}
