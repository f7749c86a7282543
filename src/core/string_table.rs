//! Per-pass string interning.
//!
//! Every name, interpretation and string-typed value in a GTO stream is
//! stored once in the string table and referenced by a dense `u32` id.
//! On disk the table is a run of NUL-terminated UTF-8 strings in id order.

use std::collections::HashMap;

use crate::util::{Error, Result};

/// Append-only string table owned by one reader or writer pass.
#[derive(Debug, Clone, Default)]
pub struct StringTable {
    strings: Vec<String>,
    index: HashMap<String, u32>,
}

impl StringTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the id for `s`, assigning the next id if it is new.
    pub fn intern(&mut self, s: &str) -> u32 {
        if let Some(&id) = self.index.get(s) {
            return id;
        }
        self.append(s.to_string())
    }

    /// Look up an existing id without interning.
    pub fn lookup(&self, s: &str) -> Option<u32> {
        self.index.get(s).copied()
    }

    /// Resolve an id back to its string.
    pub fn get(&self, id: u32) -> Option<&str> {
        self.strings.get(id as usize).map(String::as_str)
    }

    /// Resolve an id, failing for out-of-range ids.
    pub fn id_to_string(&self, id: u32) -> Result<&str> {
        self.get(id).ok_or(Error::StringIdOutOfRange {
            id,
            count: self.strings.len(),
        })
    }

    /// Number of strings in the table.
    #[inline]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Check if the table is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Reset to the empty state.
    pub fn clear(&mut self) {
        self.strings.clear();
        self.index.clear();
    }

    /// Strings in id order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.strings.iter().map(String::as_str)
    }

    // A stream may legally repeat a string; ids must still follow position,
    // so the reverse index keeps the first occurrence.
    fn append(&mut self, s: String) -> u32 {
        let id = self.strings.len() as u32;
        self.index.entry(s.clone()).or_insert(id);
        self.strings.push(s);
        id
    }

    /// Exact byte length of the serialized table.
    pub fn serialized_len(&self) -> usize {
        self.strings.iter().map(|s| s.len() + 1).sum()
    }

    /// Append the serialized table to `out`.
    ///
    /// Fails for strings with an interior NUL, which the on-disk encoding
    /// cannot delimit.
    pub fn write_to(&self, out: &mut Vec<u8>) -> Result<()> {
        for s in &self.strings {
            if s.as_bytes().contains(&0) {
                return Err(Error::InvalidString(s.clone()));
            }
            out.extend_from_slice(s.as_bytes());
            out.push(0);
        }
        Ok(())
    }

    /// Serialize the table into a new buffer.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.serialized_len());
        self.write_to(&mut out)?;
        Ok(out)
    }

    /// Populate the table with `count` entries read from the start of `bytes`.
    ///
    /// Returns the number of bytes consumed.
    pub fn read_from(&mut self, bytes: &[u8], count: usize) -> Result<usize> {
        let mut pos = 0;
        for _ in 0..count {
            let rest = &bytes[pos..];
            let len = rest.iter().position(|&b| b == 0).ok_or(Error::UnexpectedEof {
                pos: bytes.len(),
                needed: 1,
            })?;
            let s = std::str::from_utf8(&rest[..len])?;
            self.append(s.to_string());
            pos += len + 1;
        }
        Ok(pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_is_stable() {
        let mut table = StringTable::new();
        let a = table.intern("points");
        let b = table.intern("points");
        assert_eq!(a, b);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_ids_are_dense_in_first_seen_order() {
        let mut table = StringTable::new();
        let ids: Vec<u32> = ["object", "polygon", "points", "object", "position"]
            .iter()
            .map(|s| table.intern(s))
            .collect();
        assert_eq!(ids, vec![0, 1, 2, 0, 3]);
        assert_eq!(table.id_to_string(3).unwrap(), "position");
        assert_eq!(table.lookup("polygon"), Some(1));
        assert_eq!(table.lookup("missing"), None);
    }

    #[test]
    fn test_out_of_range_id() {
        let table = StringTable::new();
        assert!(matches!(
            table.id_to_string(0),
            Err(Error::StringIdOutOfRange { id: 0, count: 0 })
        ));
    }

    #[test]
    fn test_clear() {
        let mut table = StringTable::new();
        table.intern("a");
        table.intern("b");
        table.clear();
        assert!(table.is_empty());
        assert_eq!(table.intern("b"), 0);
    }

    #[test]
    fn test_serialized_form_round_trips_utf8() {
        let mut table = StringTable::new();
        for s in ["", "plain", "naïve", "日本語", "emoji 🎬"] {
            table.intern(s);
        }
        let bytes = table.to_bytes().unwrap();
        assert_eq!(bytes.len(), table.serialized_len());

        let mut tail = bytes.clone();
        tail.extend_from_slice(&[0xaa, 0xbb]);

        let mut back = StringTable::new();
        let consumed = back.read_from(&tail, table.len()).unwrap();
        assert_eq!(consumed, bytes.len());
        assert_eq!(back.iter().collect::<Vec<_>>(), table.iter().collect::<Vec<_>>());
    }

    #[test]
    fn test_truncated_table() {
        let mut table = StringTable::new();
        assert!(table.read_from(b"abc\0de", 2).is_err());
    }

    #[test]
    fn test_interior_nul_rejected() {
        let mut table = StringTable::new();
        table.intern("bad\0name");
        assert!(matches!(table.to_bytes(), Err(Error::InvalidString(_))));
    }
}
