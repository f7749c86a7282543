//! Binary GTO encoding.
//!
//! All multi-byte fields share one byte order, detected on read from the
//! leading magic word.
//!
//! ```text
//! +---------------------+
//! | Magic 0x0000029F    |  4 bytes
//! +---------------------+
//! | numStrings          |  4 bytes
//! | numObjects          |  4 bytes
//! | version             |  4 bytes
//! | flags               |  4 bytes
//! +---------------------+
//! | String table        |  numStrings NUL-terminated UTF-8 strings
//! +---------------------+
//! | Object headers      |  20 bytes each
//! +---------------------+
//! | Component headers   |  16 bytes each (20 from version 4)
//! +---------------------+
//! | Property headers    |  20 bytes each (36 from version 4)
//! +---------------------+
//! | Data                |  payloads in declaration order
//! +---------------------+
//! ```

mod cursor;
mod format;
mod reader;

pub use cursor::*;
pub use format::*;
pub use reader::*;
