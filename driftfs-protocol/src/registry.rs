//! Tag-to-factory registry and decode-side dispatch.
//!
//! An inbound message passes through two states: the transport reads the
//! tag, then the registry turns the remaining payload into a typed record.
//! The registry is populated once at startup and is read-only afterwards,
//! so any number of dispatch calls may share it without synchronization;
//! every dispatch decodes into a fresh record from its own payload slice.

use crate::error::ProtocolError;
use crate::ops::{OpKind, Tag};
use crate::record::Record;
use crate::xdr::XdrReader;
use std::collections::HashMap;

/// Zero-argument constructor producing the empty record for one tag.
pub type RecordFactory = Box<dyn Fn() -> Record + Send + Sync>;

/// Maps wire tags to record factories.
pub struct OpRegistry {
    factories: HashMap<Tag, RecordFactory>,
}

impl OpRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Creates a registry with every operation kind of this protocol version
    /// registered, requests and responses both: a peer decodes traffic in
    /// either direction.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for kind in OpKind::ALL {
            // Tags in the protocol table are unique, so direct insertion
            // cannot collide.
            let factory: RecordFactory = Box::new(move || Record::empty(kind));
            registry.factories.insert(kind.tag(), factory);
            tracing::debug!("registered operation {} (tag {})", kind, kind.tag());
        }
        registry
    }

    /// Associates `tag` with a factory. Registration happens once, at
    /// startup, before any traffic is dispatched; a collision means two
    /// operation types claim the same wire identity.
    pub fn register(&mut self, tag: Tag, factory: RecordFactory) -> Result<(), ProtocolError> {
        if self.factories.contains_key(&tag) {
            return Err(ProtocolError::DuplicateTag(tag));
        }
        self.factories.insert(tag, factory);
        tracing::debug!("registered tag {}", tag);
        Ok(())
    }

    /// Looks up the factory for `tag`.
    ///
    /// An unknown tag is a normal outcome under protocol version skew
    /// between peers; it is reported to the caller, never treated as fatal.
    pub fn resolve(&self, tag: Tag) -> Result<&RecordFactory, ProtocolError> {
        self.factories
            .get(&tag)
            .ok_or(ProtocolError::UnknownTag(tag))
    }

    /// Turns `(tag, payload)` into a populated, typed record.
    ///
    /// This is the single entry point a transport uses once it has framed a
    /// message; it needs no knowledge of the operation set. The payload must
    /// contain exactly the record's wire image: trailing bytes mean the
    /// stream is desynchronized and are rejected.
    pub fn dispatch(&self, tag: Tag, payload: &[u8]) -> Result<Record, ProtocolError> {
        let factory = self.resolve(tag)?;
        let mut record = factory();
        let mut reader = XdrReader::new(payload);
        record.decode_wire(&mut reader)?;
        if reader.remaining() != 0 {
            return Err(ProtocolError::MalformedWireData {
                reason: format!(
                    "{} trailing bytes after {} payload",
                    reader.remaining(),
                    record.op_kind()
                ),
            });
        }
        tracing::trace!("dispatched {} ({} bytes)", record.op_kind(), payload.len());
        Ok(record)
    }

    /// Number of registered tags.
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl Default for OpRegistry {
    fn default() -> Self {
        Self::new()
    }
}
