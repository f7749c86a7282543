//! Binary format constants and record sizes.

use crate::core::NESTING_VERSION;

/// Size of the stream header including the magic.
pub const HEADER_SIZE: usize = 20;

/// Size of one object header record.
pub const OBJECT_HEADER_SIZE: usize = 20;

/// Component header size before version 4.
pub const COMPONENT_HEADER_SIZE_V3: usize = 16;

/// Component header size from version 4 (adds the child level).
pub const COMPONENT_HEADER_SIZE_V4: usize = 20;

/// Property header size before version 4.
pub const PROPERTY_HEADER_SIZE_V3: usize = 20;

/// Property header size from version 4 (adds four dims).
pub const PROPERTY_HEADER_SIZE_V4: usize = 36;

/// Leading bytes of a gzip member.
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Component header record size for a format version.
#[inline]
pub const fn component_header_size(version: u32) -> usize {
    if version >= NESTING_VERSION {
        COMPONENT_HEADER_SIZE_V4
    } else {
        COMPONENT_HEADER_SIZE_V3
    }
}

/// Property header record size for a format version.
#[inline]
pub const fn property_header_size(version: u32) -> usize {
    if version >= NESTING_VERSION {
        PROPERTY_HEADER_SIZE_V4
    } else {
        PROPERTY_HEADER_SIZE_V3
    }
}
