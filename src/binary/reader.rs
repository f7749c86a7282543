//! Binary stream decoder.
//!
//! Header arrays are decoded first into an [`Index`]; the data region is then
//! walked once in declaration order, driving the same callbacks as the text
//! parser. Skipped payloads are stepped over, never decoded.

use super::cursor::{ByteCursor, Endian};
use super::format::*;
use crate::core::{
    ComponentInfo, Header, Index, Layout, ObjectInfo, PropertyInfo, ReadHandler, Request,
    StringTable, NESTING_VERSION,
};
use crate::util::{DataType, Error, Result};

/// Decode a binary stream, driving `handler`.
///
/// With `header_only` decoding stops after the fixed header. Returns the
/// header and the detected byte order.
pub fn parse_binary<H: ReadHandler + ?Sized>(
    bytes: &[u8],
    strings: &mut StringTable,
    index: &mut Index,
    handler: &mut H,
    header_only: bool,
) -> Result<(Header, Endian)> {
    let endian = Endian::detect(bytes).map_err(Error::InvalidMagic)?;
    let mut cur = ByteCursor::new(bytes, endian);
    let header = read_header(&mut cur)?;
    tracing::debug!(
        ?endian,
        version = header.version,
        strings = header.num_strings,
        objects = header.num_objects,
        "binary header"
    );
    handler.header(&header);
    if header_only {
        return Ok((header, endian));
    }

    let consumed = strings.read_from(cur.remaining(), header.num_strings as usize)?;
    cur.skip(consumed)?;

    read_index(&mut cur, &header, index)?;
    assign_data_offsets(cur.position(), index);
    handler.description_complete();

    let objects = index.objects.len();
    for object in 0..objects {
        walk_object(&mut cur, strings, index, object, handler)?;
    }
    Ok((header, endian))
}

fn read_header(cur: &mut ByteCursor<'_>) -> Result<Header> {
    cur.ensure(HEADER_SIZE)?;
    let header = Header {
        magic: cur.read_u32()?,
        num_strings: cur.read_u32()?,
        num_objects: cur.read_u32()?,
        version: cur.read_u32()?,
        flags: cur.read_u32()?,
    };
    if !Header::is_supported_version(header.version) {
        return Err(Error::UnsupportedVersion(header.version));
    }
    Ok(header)
}

fn read_index(cur: &mut ByteCursor<'_>, header: &Header, index: &mut Index) -> Result<()> {
    let version = header.version;
    let num_objects = header.num_objects as usize;
    cur.ensure(num_objects.saturating_mul(OBJECT_HEADER_SIZE))?;

    index.objects.reserve(num_objects);
    let mut num_components = 0usize;
    for _ in 0..num_objects {
        let info = ObjectInfo {
            name: cur.read_u32()?,
            protocol: cur.read_u32()?,
            protocol_version: cur.read_u32()?,
            num_components: cur.read_u32()?,
            component_offset: num_components,
        };
        cur.skip(4)?; // pad
        num_components = num_components.saturating_add(info.num_components as usize);
        index.objects.push(info);
    }

    cur.ensure(num_components.saturating_mul(component_header_size(version)))?;
    index.components.reserve(num_components);
    let mut num_properties = 0usize;
    for (object, o) in index.objects.iter().enumerate() {
        for _ in 0..o.num_components {
            let mut info = ComponentInfo {
                name: cur.read_u32()?,
                interpretation: cur.read_u32()?,
                num_properties: cur.read_u32()?,
                flags: cur.read_u32()?,
                child_level: 0,
                object,
                property_offset: num_properties,
            };
            if version >= NESTING_VERSION {
                info.child_level = cur.read_u32()?;
            }
            num_properties = num_properties.saturating_add(info.num_properties as usize);
            index.components.push(info);
        }
    }

    cur.ensure(num_properties.saturating_mul(property_header_size(version)))?;
    index.properties.reserve(num_properties);
    for (component, c) in index.components.iter().enumerate() {
        for _ in 0..c.num_properties {
            let name = cur.read_u32()?;
            let interpretation = cur.read_u32()?;
            let tag = cur.read_u8()?;
            cur.skip(3)?; // pad
            let ty = DataType::from_u8(tag).ok_or(Error::UnknownTypeTag(tag))?;
            let size = cur.read_u32()?;
            let width = cur.read_u32()?;
            let mut layout = Layout::width(width);
            if version >= NESTING_VERSION {
                for d in layout.dims.iter_mut() {
                    *d = cur.read_u32()?;
                }
            }
            index.properties.push(PropertyInfo {
                name,
                interpretation,
                ty,
                size,
                layout,
                component,
                data_offset: None,
            });
        }
    }
    Ok(())
}

fn assign_data_offsets(start: usize, index: &mut Index) {
    let mut offset = start;
    for p in index.properties.iter_mut() {
        p.data_offset = Some(offset);
        offset = offset.saturating_add(p.byte_size());
    }
}

fn walk_object<H: ReadHandler + ?Sized>(
    cur: &mut ByteCursor<'_>,
    strings: &StringTable,
    index: &Index,
    object: usize,
    handler: &mut H,
) -> Result<()> {
    let o = &index.objects[object];
    let request = handler.object(
        strings.id_to_string(o.name)?,
        strings.id_to_string(o.protocol)?,
        o.protocol_version,
        o,
    );

    let first = o.component_offset;
    for component in first..first + o.num_components as usize {
        let c = &index.components[component];
        let c_request = if request.is_read() {
            handler.component(
                strings.id_to_string(c.name)?,
                strings.id_to_string(c.interpretation)?,
                c,
            )
        } else {
            Request::Skip
        };

        let first_prop = c.property_offset;
        for p in &index.properties[first_prop..first_prop + c.num_properties as usize] {
            let p_request = if c_request.is_read() {
                handler.property(
                    strings.id_to_string(p.name)?,
                    strings.id_to_string(p.interpretation)?,
                    p,
                )
            } else {
                Request::Skip
            };
            if let Some(offset) = p.data_offset {
                cur.seek(offset)?;
            }
            read_payload(cur, strings, p, p_request, handler)?;
        }
    }
    Ok(())
}

fn read_payload<H: ReadHandler + ?Sized>(
    cur: &mut ByteCursor<'_>,
    strings: &StringTable,
    info: &PropertyInfo,
    request: Request,
    handler: &mut H,
) -> Result<()> {
    let count = info.total_count();
    if request.is_read() && handler.data_ready(info, count).is_read() {
        let data = cur.read_data(info.ty, count)?;
        handler.data_read(info, data, strings);
    } else {
        cur.skip(info.byte_size())?;
    }
    Ok(())
}

/// Replay callbacks for one object of an already indexed stream.
///
/// Payloads are located through the retained data offsets, so nothing before
/// the object is decoded again.
pub fn replay_object<H: ReadHandler + ?Sized>(
    bytes: &[u8],
    endian: Endian,
    strings: &StringTable,
    index: &Index,
    object: usize,
    handler: &mut H,
) -> Result<()> {
    if object >= index.objects.len() {
        return Err(Error::ObjectOutOfBounds {
            index: object,
            count: index.objects.len(),
        });
    }
    let mut cur = ByteCursor::new(bytes, endian);
    walk_object(&mut cur, strings, index, object, handler)
}
