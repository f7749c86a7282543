//! The callback protocol shared by the text and binary parsers.
//!
//! A parse walks objects, components and properties in stream order and asks
//! the handler at each level whether to descend. Gating is strict: a Skip on
//! an object suppresses every callback for its components, a Skip on a
//! component suppresses its properties, and a Skip on a property (or on
//! [`ReadHandler::data_ready`]) suppresses [`ReadHandler::data_read`]. The
//! parser still consumes the skipped bytes or tokens so siblings parse
//! normally.

use super::{ComponentInfo, Header, ObjectInfo, PropertyData, PropertyInfo, StringTable};

/// Verdict returned by handler callbacks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Request {
    Skip = 0,
    #[default]
    Read = 1,
}

impl Request {
    /// Check for a Read verdict.
    #[inline]
    pub fn is_read(self) -> bool {
        self == Self::Read
    }
}

impl From<bool> for Request {
    fn from(read: bool) -> Self {
        if read {
            Self::Read
        } else {
            Self::Skip
        }
    }
}

/// Receiver of parse events.
///
/// Every method has a default, so a handler overrides only what it needs:
/// the defaults read everything and discard the data.
pub trait ReadHandler {
    /// Called once the stream header is known.
    fn header(&mut self, _header: &Header) {}

    /// Called for each object before its body is parsed.
    fn object(
        &mut self,
        _name: &str,
        _protocol: &str,
        _protocol_version: u32,
        _info: &ObjectInfo,
    ) -> Request {
        Request::Read
    }

    /// Called for each component of a Read object.
    fn component(&mut self, _name: &str, _interpretation: &str, _info: &ComponentInfo) -> Request {
        Request::Read
    }

    /// Called for each property of a Read component.
    fn property(&mut self, _name: &str, _interpretation: &str, _info: &PropertyInfo) -> Request {
        Request::Read
    }

    /// Called before the payload of a Read property is decoded.
    ///
    /// `count` is the number of scalar values about to be delivered, so the
    /// handler can size its destination. Skip drops the payload.
    fn data_ready(&mut self, _info: &PropertyInfo, _count: usize) -> Request {
        Request::Read
    }

    /// Receives the payload of a Read property.
    fn data_read(&mut self, _info: &PropertyInfo, _data: PropertyData, _strings: &StringTable) {}

    /// Called once every structural record has been described.
    fn description_complete(&mut self) {}
}

impl<H: ReadHandler + ?Sized> ReadHandler for &mut H {
    fn header(&mut self, header: &Header) {
        (**self).header(header)
    }

    fn object(
        &mut self,
        name: &str,
        protocol: &str,
        protocol_version: u32,
        info: &ObjectInfo,
    ) -> Request {
        (**self).object(name, protocol, protocol_version, info)
    }

    fn component(&mut self, name: &str, interpretation: &str, info: &ComponentInfo) -> Request {
        (**self).component(name, interpretation, info)
    }

    fn property(&mut self, name: &str, interpretation: &str, info: &PropertyInfo) -> Request {
        (**self).property(name, interpretation, info)
    }

    fn data_ready(&mut self, info: &PropertyInfo, count: usize) -> Request {
        (**self).data_ready(info, count)
    }

    fn data_read(&mut self, info: &PropertyInfo, data: PropertyData, strings: &StringTable) {
        (**self).data_read(info, data, strings)
    }

    fn description_complete(&mut self) {
        (**self).description_complete()
    }
}

/// Handler that only answers object requests with a filter, delegating the
/// rest. Used to replay a single object from a retained source.
pub(crate) struct ObjectFilter<'h, H: ?Sized> {
    pub inner: &'h mut H,
    pub target: usize,
    pub seen: usize,
}

impl<H: ReadHandler + ?Sized> ReadHandler for ObjectFilter<'_, H> {
    fn object(
        &mut self,
        name: &str,
        protocol: &str,
        protocol_version: u32,
        info: &ObjectInfo,
    ) -> Request {
        let index = self.seen;
        self.seen += 1;
        if index == self.target {
            self.inner.object(name, protocol, protocol_version, info)
        } else {
            Request::Skip
        }
    }

    fn component(&mut self, name: &str, interpretation: &str, info: &ComponentInfo) -> Request {
        self.inner.component(name, interpretation, info)
    }

    fn property(&mut self, name: &str, interpretation: &str, info: &PropertyInfo) -> Request {
        self.inner.property(name, interpretation, info)
    }

    fn data_ready(&mut self, info: &PropertyInfo, count: usize) -> Request {
        self.inner.data_ready(info, count)
    }

    fn data_read(&mut self, info: &PropertyInfo, data: PropertyData, strings: &StringTable) {
        self.inner.data_read(info, data, strings)
    }
}
