//! Binary emission: measure the whole stream, allocate once, then write.

use super::WriterOptions;
use crate::binary::{
    component_header_size, encode_data, property_header_size, write_u32, HEADER_SIZE,
    OBJECT_HEADER_SIZE,
};
use crate::core::{Index, PropertyData, StringTable, GTO_MAGIC, NESTING_VERSION};
use crate::util::{Error, Result};

/// Exact byte length of a binary stream with this structure.
pub fn binary_size(version: u32, strings: &StringTable, index: &Index) -> usize {
    HEADER_SIZE
        + strings.serialized_len()
        + index.objects.len() * OBJECT_HEADER_SIZE
        + index.components.len() * component_header_size(version)
        + index.properties.len() * property_header_size(version)
        + index.properties.iter().map(|p| p.byte_size()).sum::<usize>()
}

pub(super) fn encode(
    options: &WriterOptions,
    strings: &StringTable,
    index: &Index,
    payloads: &[&PropertyData],
) -> Result<Vec<u8>> {
    let version = options.version;
    let endian = options.byte_order;
    let size = binary_size(version, strings, index);
    let mut out = Vec::with_capacity(size);

    for v in [
        GTO_MAGIC,
        strings.len() as u32,
        index.objects.len() as u32,
        version,
        options.flags,
    ] {
        write_u32(&mut out, v, endian)?;
    }
    strings.write_to(&mut out)?;

    for o in &index.objects {
        for v in [o.name, o.protocol, o.protocol_version, o.num_components, 0] {
            write_u32(&mut out, v, endian)?;
        }
    }

    for c in &index.components {
        for v in [c.name, c.interpretation, c.num_properties, c.flags] {
            write_u32(&mut out, v, endian)?;
        }
        if version >= NESTING_VERSION {
            write_u32(&mut out, c.child_level, endian)?;
        }
    }

    for p in &index.properties {
        write_u32(&mut out, p.name, endian)?;
        write_u32(&mut out, p.interpretation, endian)?;
        out.extend_from_slice(&[p.ty.as_u8(), 0, 0, 0]);
        write_u32(&mut out, p.size, endian)?;
        write_u32(&mut out, p.layout.width, endian)?;
        if version >= NESTING_VERSION {
            for d in p.layout.dims {
                write_u32(&mut out, d, endian)?;
            }
        }
    }

    for data in payloads {
        encode_data(&mut out, data, endian)?;
    }

    if out.len() != size {
        return Err(Error::invalid(format!(
            "encoded {} bytes, measured {}",
            out.len(),
            size
        )));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::super::{Format, Writer};
    use super::*;
    use crate::binary::Endian;
    use crate::core::Layout;

    fn single_int(options: WriterOptions) -> Vec<u8> {
        let mut w = Writer::new();
        w.open(Format::Binary, options).unwrap();
        w.begin_object("obj", "proto", 1).unwrap();
        w.begin_component("comp", "").unwrap();
        w.property_with_data("v", "", Layout::SCALAR, PropertyData::Int(vec![10, 20, 30]))
            .unwrap();
        w.end_component().unwrap();
        w.end_object().unwrap();
        w.close().unwrap()
    }

    #[test]
    fn test_exact_size_v4() {
        let bytes = single_int(WriterOptions::default());
        // strings: obj proto comp "" v
        let strings = 4 + 6 + 5 + 1 + 2;
        assert_eq!(bytes.len(), 20 + strings + 20 + 20 + 36 + 3 * 4);
    }

    #[test]
    fn test_exact_size_v3() {
        let bytes = single_int(WriterOptions::version(3));
        let strings = 4 + 6 + 5 + 1 + 2;
        assert_eq!(bytes.len(), 20 + strings + 20 + 16 + 20 + 3 * 4);
    }

    #[test]
    fn test_byte_order_of_output() {
        let le = single_int(WriterOptions::default());
        let be = single_int(WriterOptions::default().with_byte_order(Endian::Big));
        assert_eq!(&le[..4], &[0x9f, 0x02, 0, 0]);
        assert_eq!(&be[..4], &[0, 0, 0x02, 0x9f]);
        assert_eq!(le.len(), be.len());
        assert_eq!(&le[le.len() - 4..], &30i32.to_le_bytes());
        assert_eq!(&be[be.len() - 4..], &30i32.to_be_bytes());
    }
}
