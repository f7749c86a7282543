//! Stream entry point.
//!
//! [`Reader`] sniffs the encoding, runs the matching parser against a
//! [`ReadHandler`] and keeps what the [`ReadMode`] asks it to keep.

use std::fs::File;
use std::path::Path;

use bitflags::bitflags;
use memmap2::Mmap;

use crate::binary::{self, Endian};
use crate::compression::{is_gzip, Decompressor};
use crate::core::{
    ComponentInfo, Header, Index, ObjectFilter, ObjectInfo, PropertyInfo, ReadHandler,
    StringTable,
};
use crate::text;
use crate::util::{Error, Result};

bitflags! {
    /// Reader behavior flags. Combinable.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct ReadMode: u32 {
        /// Stop after the stream header.
        const HEADER_ONLY = 1 << 0;
        /// Keep the source and the full index for [`Reader::access_object`].
        const RANDOM_ACCESS = 1 << 1;
        /// Reject text input.
        const BINARY_ONLY = 1 << 2;
        /// Reject binary input.
        const TEXT_ONLY = 1 << 3;
    }
}

impl ReadMode {
    pub const NONE: Self = Self::empty();
}

/// Encoding of the last stream read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FileType {
    Binary,
    Text,
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            FileType::Binary => "binary",
            FileType::Text => "text",
        })
    }
}

/// Source bytes retained for random access.
enum Source {
    Owned(Vec<u8>),
    Mapped(Mmap),
}

impl Source {
    fn bytes(&self) -> &[u8] {
        match self {
            Source::Owned(v) => v.as_slice(),
            Source::Mapped(m) => &m[..],
        }
    }
}

/// GTO reader.
///
/// One instance handles one stream at a time; every open resets the string
/// table and index.
pub struct Reader {
    mode: ReadMode,
    strings: StringTable,
    index: Index,
    header: Option<Header>,
    file_type: Option<FileType>,
    endian: Endian,
    compressed: bool,
    source: Option<Source>,
    why: String,
}

impl std::fmt::Debug for Reader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reader")
            .field("mode", &self.mode)
            .field("header", &self.header)
            .field("file_type", &self.file_type)
            .field("endian", &self.endian)
            .field("compressed", &self.compressed)
            .field("retained", &self.source.is_some())
            .finish()
    }
}

impl Default for Reader {
    fn default() -> Self {
        Self::new(ReadMode::NONE)
    }
}

impl Reader {
    pub fn new(mode: ReadMode) -> Self {
        Self {
            mode,
            strings: StringTable::new(),
            index: Index::default(),
            header: None,
            file_type: None,
            endian: Endian::default(),
            compressed: false,
            source: None,
            why: String::new(),
        }
    }

    #[inline]
    pub fn mode(&self) -> ReadMode {
        self.mode
    }

    fn reset(&mut self) {
        self.strings.clear();
        self.index.clear();
        self.header = None;
        self.file_type = None;
        self.endian = Endian::default();
        self.compressed = false;
        self.source = None;
        self.why.clear();
    }

    fn report(&mut self, result: Result<()>) -> bool {
        match result {
            Ok(()) => true,
            Err(err) => {
                tracing::error!(error = %err, "failed to read GTO stream");
                self.why = err.to_string();
                false
            }
        }
    }

    /// Read a stream, logging any failure. The message stays available
    /// through [`Reader::why`].
    pub fn open<H: ReadHandler + ?Sized>(&mut self, bytes: &[u8], handler: &mut H) -> bool {
        let result = self.read(bytes, handler);
        self.report(result)
    }

    /// Read a stream, returning the failure.
    ///
    /// Gzip-framed input is rejected; use [`Reader::read_async`].
    pub fn read<H: ReadHandler + ?Sized>(&mut self, bytes: &[u8], handler: &mut H) -> Result<()> {
        self.reset();
        if is_gzip(bytes) {
            return Err(Error::Compressed);
        }
        self.parse(bytes, handler)?;
        if self.mode.contains(ReadMode::RANDOM_ACCESS) {
            self.source = Some(Source::Owned(bytes.to_vec()));
        }
        Ok(())
    }

    /// Memory-map and read a file, logging any failure.
    pub fn open_file<H: ReadHandler + ?Sized>(
        &mut self,
        path: impl AsRef<Path>,
        handler: &mut H,
    ) -> bool {
        let result = self.read_file(path, handler);
        self.report(result)
    }

    /// Memory-map and read a file.
    pub fn read_file<H: ReadHandler + ?Sized>(
        &mut self,
        path: impl AsRef<Path>,
        handler: &mut H,
    ) -> Result<()> {
        self.reset();
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound(path.to_path_buf())
            } else {
                Error::Io(e)
            }
        })?;
        if file.metadata()?.len() == 0 {
            return Err(Error::UnrecognizedFormat);
        }
        // Safety: the map is read-only and lives as long as any borrow of it.
        let map = unsafe { Mmap::map(&file) }?;
        tracing::debug!(path = %path.display(), bytes = map.len(), "mapped file");

        if is_gzip(&map) {
            return Err(Error::Compressed);
        }
        self.parse(&map, handler)?;
        if self.mode.contains(ReadMode::RANDOM_ACCESS) {
            self.source = Some(Source::Mapped(map));
        }
        Ok(())
    }

    /// Read a stream that may be gzip-framed, logging any failure.
    pub async fn open_async<H, D>(&mut self, bytes: &[u8], decompressor: &D, handler: &mut H) -> bool
    where
        H: ReadHandler + ?Sized,
        D: Decompressor + ?Sized,
    {
        let result = self.read_async(bytes, decompressor, handler).await;
        self.report(result)
    }

    /// Read a stream that may be gzip-framed.
    ///
    /// Compressed input is inflated by `decompressor`; parsing itself stays
    /// synchronous once the bytes are in hand.
    pub async fn read_async<H, D>(&mut self, bytes: &[u8], decompressor: &D, handler: &mut H) -> Result<()>
    where
        H: ReadHandler + ?Sized,
        D: Decompressor + ?Sized,
    {
        if !is_gzip(bytes) {
            return self.read(bytes, handler);
        }
        self.reset();
        let inflated = decompressor.decompress(bytes).await?;
        tracing::debug!(compressed = bytes.len(), inflated = inflated.len(), "inflated gzip stream");
        self.compressed = true;
        self.parse(&inflated, handler)?;
        if self.mode.contains(ReadMode::RANDOM_ACCESS) {
            self.source = Some(Source::Owned(inflated));
        }
        Ok(())
    }

    fn parse<H: ReadHandler + ?Sized>(&mut self, bytes: &[u8], handler: &mut H) -> Result<()> {
        let header_only = self.mode.contains(ReadMode::HEADER_ONLY);
        let file_type = self.detect(bytes)?;
        self.file_type = Some(file_type);

        let header = match file_type {
            FileType::Binary => {
                let (header, endian) =
                    binary::parse_binary(bytes, &mut self.strings, &mut self.index, handler, header_only)?;
                self.endian = endian;
                header
            }
            FileType::Text => {
                let src = std::str::from_utf8(bytes)?;
                text::parse_text(src, &mut self.strings, &mut self.index, handler, header_only)?
            }
        };
        tracing::debug!(
            %file_type,
            version = header.version,
            objects = header.num_objects,
            "read GTO stream"
        );
        self.header = Some(header);

        if !self.mode.contains(ReadMode::RANDOM_ACCESS) {
            self.index.clear();
            self.strings.clear();
        }
        Ok(())
    }

    fn detect(&self, bytes: &[u8]) -> Result<FileType> {
        if let Ok(endian) = Endian::detect(bytes) {
            tracing::trace!(?endian, "binary magic");
            if self.mode.contains(ReadMode::TEXT_ONLY) {
                return Err(Error::FormatRestricted("binary input in text-only mode"));
            }
            return Ok(FileType::Binary);
        }
        if text::is_text(bytes) {
            if self.mode.contains(ReadMode::BINARY_ONLY) {
                return Err(Error::FormatRestricted("text input in binary-only mode"));
            }
            return Ok(FileType::Text);
        }
        match Endian::detect(bytes) {
            Err(word) if self.mode.contains(ReadMode::BINARY_ONLY) => Err(Error::InvalidMagic(word)),
            _ => Err(Error::UnrecognizedFormat),
        }
    }

    /// Replay callbacks for one object of the last stream.
    ///
    /// Requires [`ReadMode::RANDOM_ACCESS`]. Binary sources seek straight to
    /// the object's payloads; text sources are re-parsed with every other
    /// object skipped.
    pub fn access_object<H: ReadHandler + ?Sized>(&self, object: usize, handler: &mut H) -> Result<()> {
        let source = self.source.as_ref().ok_or(Error::NoRandomAccess)?;
        if object >= self.index.objects.len() {
            return Err(Error::ObjectOutOfBounds {
                index: object,
                count: self.index.objects.len(),
            });
        }
        match self.file_type {
            Some(FileType::Binary) => binary::replay_object(
                source.bytes(),
                self.endian,
                &self.strings,
                &self.index,
                object,
                handler,
            ),
            Some(FileType::Text) => {
                let src = std::str::from_utf8(source.bytes())?;
                let mut strings = StringTable::new();
                let mut index = Index::default();
                let mut filter = ObjectFilter {
                    inner: handler,
                    target: object,
                    seen: 0,
                };
                text::parse_text(src, &mut strings, &mut index, &mut filter, false).map(|_| ())
            }
            None => Err(Error::NoRandomAccess),
        }
    }

    /// Index of the object with the given name, if retained.
    pub fn find_object(&self, name: &str) -> Option<usize> {
        let id = self.strings.lookup(name)?;
        self.index.objects.iter().position(|o| o.name == id)
    }

    /// Message of the last failure, empty after a success.
    pub fn why(&self) -> &str {
        &self.why
    }

    /// Header of the last stream.
    pub fn header(&self) -> Option<&Header> {
        self.header.as_ref()
    }

    pub fn file_type(&self) -> Option<FileType> {
        self.file_type
    }

    /// Byte order of the last binary stream.
    pub fn endian(&self) -> Endian {
        self.endian
    }

    /// Whether the last stream arrived gzip-framed.
    pub fn is_compressed(&self) -> bool {
        self.compressed
    }

    /// Retained object records (random access only).
    pub fn objects(&self) -> &[ObjectInfo] {
        &self.index.objects
    }

    /// Retained component records (random access only).
    pub fn components(&self) -> &[ComponentInfo] {
        &self.index.components
    }

    /// Retained property records (random access only).
    pub fn properties(&self) -> &[PropertyInfo] {
        &self.index.properties
    }

    /// Retained string table (random access only).
    pub fn string_table(&self) -> &StringTable {
        &self.strings
    }

    /// Resolve a retained string id.
    pub fn string(&self, id: u32) -> Result<&str> {
        self.strings.id_to_string(id)
    }
}
