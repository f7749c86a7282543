//! Bounds-checked cursor with runtime byte order.

use byteorder::{BigEndian, ByteOrder, LittleEndian, WriteBytesExt};

use crate::core::{PropertyData, GTO_MAGIC};
use crate::util::{floats_to_halves, halves_to_floats, DataType, Error, Result};

/// Byte order of a binary stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Endian {
    #[default]
    Little,
    Big,
}

impl Endian {
    /// Detect the byte order from the leading magic word.
    ///
    /// Returns the little-endian reading of the word when it matches
    /// neither order.
    pub fn detect(bytes: &[u8]) -> std::result::Result<Self, u32> {
        if bytes.len() < 4 {
            return Err(0);
        }
        let le = LittleEndian::read_u32(bytes);
        if le == GTO_MAGIC {
            return Ok(Self::Little);
        }
        if BigEndian::read_u32(bytes) == GTO_MAGIC {
            return Ok(Self::Big);
        }
        Err(le)
    }

    #[inline]
    pub fn read_u32(self, b: &[u8]) -> u32 {
        match self {
            Self::Little => LittleEndian::read_u32(b),
            Self::Big => BigEndian::read_u32(b),
        }
    }
}

/// Read cursor over a borrowed buffer.
///
/// Every read is checked against the buffer end, so counts taken from a
/// corrupt header produce [`Error::UnexpectedEof`] instead of a panic.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
    endian: Endian,
}

impl<'a> ByteCursor<'a> {
    /// Create a cursor at the start of `data`.
    pub fn new(data: &'a [u8], endian: Endian) -> Self {
        Self {
            data,
            pos: 0,
            endian,
        }
    }

    /// Current offset.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Byte order used for multi-byte reads.
    #[inline]
    pub fn endian(&self) -> Endian {
        self.endian
    }

    /// Unread bytes.
    #[inline]
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    /// Fail unless `n` more bytes are available.
    pub fn ensure(&self, n: usize) -> Result<()> {
        match self.pos.checked_add(n) {
            Some(end) if end <= self.data.len() => Ok(()),
            _ => Err(Error::UnexpectedEof {
                pos: self.pos,
                needed: n,
            }),
        }
    }

    /// Move to an absolute offset.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(Error::UnexpectedEof {
                pos: self.data.len(),
                needed: pos - self.data.len(),
            });
        }
        self.pos = pos;
        Ok(())
    }

    /// Borrow the next `n` bytes and advance.
    pub fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        self.ensure(n)?;
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    /// Advance `n` bytes without reading them.
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.ensure(n)?;
        self.pos += n;
        Ok(())
    }

    /// Read one byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    /// Read a 32-bit word in the stream's byte order.
    pub fn read_u32(&mut self) -> Result<u32> {
        let endian = self.endian;
        Ok(endian.read_u32(self.take(4)?))
    }

    /// Decode `count` values of type `ty`.
    pub fn read_data(&mut self, ty: DataType, count: usize) -> Result<PropertyData> {
        let bytes = self.take(count.saturating_mul(ty.num_bytes()))?;
        Ok(match self.endian {
            Endian::Little => decode::<LittleEndian>(bytes, ty, count),
            Endian::Big => decode::<BigEndian>(bytes, ty, count),
        })
    }
}

fn decode<B: ByteOrder>(bytes: &[u8], ty: DataType, count: usize) -> PropertyData {
    match ty {
        DataType::Int => {
            let mut v = vec![0i32; count];
            B::read_i32_into(bytes, &mut v);
            PropertyData::Int(v)
        }
        DataType::Float => {
            let mut v = vec![0f32; count];
            B::read_f32_into(bytes, &mut v);
            PropertyData::Float(v)
        }
        DataType::Double => {
            let mut v = vec![0f64; count];
            B::read_f64_into(bytes, &mut v);
            PropertyData::Double(v)
        }
        DataType::Half => {
            let mut h = vec![0u16; count];
            B::read_u16_into(bytes, &mut h);
            PropertyData::Half(halves_to_floats(&h))
        }
        DataType::String => {
            let mut v = vec![0u32; count];
            B::read_u32_into(bytes, &mut v);
            PropertyData::String(v)
        }
        DataType::Boolean => PropertyData::Boolean(bytes.iter().map(|&b| b != 0).collect()),
        DataType::Short => {
            let mut v = vec![0i16; count];
            B::read_i16_into(bytes, &mut v);
            PropertyData::Short(v)
        }
        DataType::Byte => PropertyData::Byte(bytes.to_vec()),
        DataType::Int64 => {
            let mut v = vec![0i64; count];
            B::read_i64_into(bytes, &mut v);
            PropertyData::Int64(v)
        }
    }
}

/// Append `data` to `out` in the given byte order.
pub fn encode_data(out: &mut Vec<u8>, data: &PropertyData, endian: Endian) -> Result<()> {
    match endian {
        Endian::Little => encode::<LittleEndian>(out, data),
        Endian::Big => encode::<BigEndian>(out, data),
    }
}

fn encode<B: ByteOrder>(out: &mut Vec<u8>, data: &PropertyData) -> Result<()> {
    match data {
        PropertyData::Int(v) => v.iter().try_for_each(|&x| out.write_i32::<B>(x))?,
        PropertyData::Float(v) => v.iter().try_for_each(|&x| out.write_f32::<B>(x))?,
        PropertyData::Double(v) => v.iter().try_for_each(|&x| out.write_f64::<B>(x))?,
        PropertyData::Half(v) => floats_to_halves(v)
            .into_iter()
            .try_for_each(|h| out.write_u16::<B>(h))?,
        PropertyData::String(v) => v.iter().try_for_each(|&x| out.write_u32::<B>(x))?,
        PropertyData::Boolean(v) => out.extend(v.iter().map(|&b| b as u8)),
        PropertyData::Short(v) => v.iter().try_for_each(|&x| out.write_i16::<B>(x))?,
        PropertyData::Byte(v) => out.extend_from_slice(v),
        PropertyData::Int64(v) => v.iter().try_for_each(|&x| out.write_i64::<B>(x))?,
    }
    Ok(())
}

/// Append a 32-bit word in the given byte order.
#[inline]
pub fn write_u32(out: &mut Vec<u8>, value: u32, endian: Endian) -> Result<()> {
    match endian {
        Endian::Little => out.write_u32::<LittleEndian>(value)?,
        Endian::Big => out.write_u32::<BigEndian>(value)?,
    }
    Ok(())
}
