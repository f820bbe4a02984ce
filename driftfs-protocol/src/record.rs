//! Table-driven operation records.
//!
//! Every operation kind declares one canonical, ordered field table
//! ([`OpKind::fields`]). The wire codec, the mapping representation, and the
//! positional sequence representation are all derived from that single
//! table, so the three surfaces cannot drift apart: adding or reordering a
//! field changes all of them together.

use crate::error::ProtocolError;
use crate::ops::{OpKind, Tag};
use crate::xdr::{self, XdrReader, XdrWriter};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Primitive kind of a record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// UTF-8 string, length-prefixed and padded.
    Str,
    /// Raw byte buffer, length-prefixed and padded.
    Opaque,
    /// 32-bit unsigned integer, big-endian.
    UInt,
    /// 64-bit unsigned integer, big-endian.
    UHyper,
    /// Counted sequence of strings.
    StrSeq,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::Str => "string",
            FieldKind::Opaque => "opaque",
            FieldKind::UInt => "uint",
            FieldKind::UHyper => "uhyper",
            FieldKind::StrSeq => "string sequence",
        };
        write!(f, "{}", name)
    }
}

/// One entry in an operation's canonical field table.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

/// A single field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Str(String),
    Opaque(Vec<u8>),
    UInt(u32),
    UHyper(u64),
    StrSeq(Vec<String>),
}

impl Value {
    /// The field kind this value belongs to.
    pub fn kind(&self) -> FieldKind {
        match self {
            Value::Str(_) => FieldKind::Str,
            Value::Opaque(_) => FieldKind::Opaque,
            Value::UInt(_) => FieldKind::UInt,
            Value::UHyper(_) => FieldKind::UHyper,
            Value::StrSeq(_) => FieldKind::StrSeq,
        }
    }

    /// The defaulted value for a field kind. Strings default to the empty
    /// string, never to an absent value.
    pub fn default_for(kind: FieldKind) -> Value {
        match kind {
            FieldKind::Str => Value::Str(String::new()),
            FieldKind::Opaque => Value::Opaque(Vec::new()),
            FieldKind::UInt => Value::UInt(0),
            FieldKind::UHyper => Value::UHyper(0),
            FieldKind::StrSeq => Value::StrSeq(Vec::new()),
        }
    }

    /// Whether this value equals the default for its kind.
    pub fn is_default(&self) -> bool {
        *self == Value::default_for(self.kind())
    }

    /// Wire size of this value via the primitive size functions.
    pub fn wire_size(&self) -> usize {
        match self {
            Value::Str(s) => xdr::string_size(s),
            Value::Opaque(b) => xdr::opaque_size(b),
            Value::UInt(_) => 4,
            Value::UHyper(_) => 8,
            Value::StrSeq(v) => xdr::string_seq_size(v),
        }
    }

    fn encode(&self, writer: &mut XdrWriter) {
        match self {
            Value::Str(s) => writer.put_string(s),
            Value::Opaque(b) => writer.put_opaque(b),
            Value::UInt(n) => writer.put_u32(*n),
            Value::UHyper(n) => writer.put_u64(*n),
            Value::StrSeq(v) => writer.put_string_seq(v),
        }
    }

    fn decode(kind: FieldKind, reader: &mut XdrReader<'_>) -> Result<Value, ProtocolError> {
        match kind {
            FieldKind::Str => reader.get_string().map(Value::Str),
            FieldKind::Opaque => reader.get_opaque().map(Value::Opaque),
            FieldKind::UInt => reader.get_u32().map(Value::UInt),
            FieldKind::UHyper => reader.get_u64().map(Value::UHyper),
            FieldKind::StrSeq => reader.get_string_seq().map(Value::StrSeq),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_opaque(&self) -> Option<&[u8]> {
        match self {
            Value::Opaque(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_uint(&self) -> Option<u32> {
        match self {
            Value::UInt(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_uhyper(&self) -> Option<u64> {
        match self {
            Value::UHyper(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::UInt(n)
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::UHyper(n)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Opaque(b) => write!(f, "<{} bytes>", b.len()),
            Value::UInt(n) => write!(f, "{}", n),
            Value::UHyper(n) => write!(f, "{}", n),
            Value::StrSeq(v) => write!(f, "{:?}", v),
        }
    }
}

/// The typed request or response payload for one tagged operation.
///
/// Field values are stored in canonical order; the field set and order for a
/// kind never change, only the values do. A record is constructed empty
/// (all fields defaulted), from explicit values, or by decoding any of the
/// three representations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub(crate) kind: OpKind,
    pub(crate) values: Vec<Value>,
}

impl Record {
    /// Creates a record with every field at its default value.
    pub fn empty(kind: OpKind) -> Self {
        let values = kind
            .fields()
            .iter()
            .map(|f| Value::default_for(f.kind))
            .collect();
        Self { kind, values }
    }

    /// Creates a record from values in canonical field order.
    pub fn from_seq(kind: OpKind, values: Vec<Value>) -> Result<Self, ProtocolError> {
        let fields = kind.fields();
        if values.len() != fields.len() {
            return Err(ProtocolError::ArityMismatch {
                kind: kind.name(),
                expected: fields.len(),
                actual: values.len(),
            });
        }
        for (spec, value) in fields.iter().zip(&values) {
            if value.kind() != spec.kind {
                return Err(ProtocolError::TypeMismatch {
                    field: spec.name,
                    expected: spec.kind,
                    actual: value.kind(),
                });
            }
        }
        Ok(Self { kind, values })
    }

    /// Creates a record from a name-to-value mapping. Every declared field
    /// must be present with a value of its declared kind; surplus keys are
    /// ignored.
    pub fn from_map<N: AsRef<str>>(
        kind: OpKind,
        entries: &[(N, Value)],
    ) -> Result<Self, ProtocolError> {
        let fields = kind.fields();
        let mut values = Vec::with_capacity(fields.len());
        for spec in fields {
            let value = entries
                .iter()
                .find(|(name, _)| name.as_ref() == spec.name)
                .map(|(_, value)| value)
                .ok_or(ProtocolError::MissingField(spec.name))?;
            if value.kind() != spec.kind {
                return Err(ProtocolError::TypeMismatch {
                    field: spec.name,
                    expected: spec.kind,
                    actual: value.kind(),
                });
            }
            values.push(value.clone());
        }
        Ok(Self { kind, values })
    }

    /// Decodes a record of the given kind from raw wire bytes.
    pub fn from_wire(kind: OpKind, reader: &mut XdrReader<'_>) -> Result<Self, ProtocolError> {
        let mut record = Record::empty(kind);
        record.decode_wire(reader)?;
        Ok(record)
    }

    /// The operation kind of this record.
    pub fn op_kind(&self) -> OpKind {
        self.kind
    }

    /// The stable wire tag. Constant per kind, across every construction
    /// path.
    pub fn tag(&self) -> Tag {
        self.kind.tag()
    }

    /// Exact wire size in bytes, recomputed from the current field values.
    /// Records with no fields occupy zero bytes.
    pub fn wire_size(&self) -> usize {
        self.values.iter().map(Value::wire_size).sum()
    }

    /// Serializes fields in canonical order. Advances the writer by exactly
    /// [`Record::wire_size`] bytes.
    pub fn encode_wire(&self, writer: &mut XdrWriter) {
        for value in &self.values {
            value.encode(writer);
        }
    }

    /// Encodes into a single freshly allocated buffer of exactly
    /// [`Record::wire_size`] bytes.
    pub fn encode(&self) -> Bytes {
        let mut writer = XdrWriter::with_capacity(self.wire_size());
        self.encode_wire(&mut writer);
        writer.freeze()
    }

    /// Populates fields in canonical order from raw wire bytes.
    pub fn decode_wire(&mut self, reader: &mut XdrReader<'_>) -> Result<(), ProtocolError> {
        for (i, spec) in self.kind.fields().iter().enumerate() {
            self.values[i] = Value::decode(spec.kind, reader)?;
        }
        Ok(())
    }

    /// The mapping representation: field names and values in canonical
    /// order.
    pub fn to_map(&self) -> Vec<(&'static str, Value)> {
        self.kind
            .fields()
            .iter()
            .zip(&self.values)
            .map(|(spec, value)| (spec.name, value.clone()))
            .collect()
    }

    /// The positional representation: values in canonical field order.
    pub fn to_seq(&self) -> Vec<Value> {
        self.values.clone()
    }

    /// Returns the value of the named field.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.kind
            .fields()
            .iter()
            .position(|f| f.name == name)
            .map(|i| &self.values[i])
    }

    /// Replaces the value of the named field. The new value must match the
    /// field's declared kind.
    pub fn set(&mut self, name: &'static str, value: Value) -> Result<(), ProtocolError> {
        let fields = self.kind.fields();
        let idx = fields
            .iter()
            .position(|f| f.name == name)
            .ok_or(ProtocolError::MissingField(name))?;
        if value.kind() != fields[idx].kind {
            return Err(ProtocolError::TypeMismatch {
                field: fields[idx].name,
                expected: fields[idx].kind,
                actual: value.kind(),
            });
        }
        self.values[idx] = value;
        Ok(())
    }

    /// Convenience accessor for string fields.
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// Convenience accessor for u32 fields.
    pub fn uint_field(&self, name: &str) -> Option<u32> {
        self.get(name).and_then(Value::as_uint)
    }

    /// Builds the field-defaulted response paired with this request, or
    /// `None` if this record is itself a response. Used to synthesize a
    /// well-formed placeholder before a handler runs, and as the basis for
    /// error responses.
    pub fn default_response(&self) -> Option<Record> {
        self.kind.response_kind().map(Record::empty)
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.kind.name())?;
        for (i, (spec, value)) in self.kind.fields().iter().zip(&self.values).enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", spec.name, value)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_unlink_wire_layout() {
        // len=4 + "/a/b", no padding (4 is already a multiple of 4).
        let record = Record::unlink("/a/b");
        assert_eq!(record.wire_size(), 8);

        let bytes = record.encode();
        assert_eq!(&bytes[..], &[0, 0, 0, 4, b'/', b'a', b'/', b'b']);
    }

    #[test]
    fn test_symlink_wire_layout() {
        // Two length-2 strings, each padded with 2 zero bytes.
        let record = Record::symlink("/x", "/y");
        assert_eq!(record.wire_size(), 16);

        let bytes = record.encode();
        assert_eq!(bytes.len(), 16);
        assert_eq!(&bytes[..8], &[0, 0, 0, 2, b'/', b'x', 0, 0]);
        assert_eq!(&bytes[8..], &[0, 0, 0, 2, b'/', b'y', 0, 0]);
    }

    #[test]
    fn test_zero_field_record() {
        let record = Record::shutdown();
        assert_eq!(record.wire_size(), 0);
        assert!(record.encode().is_empty());

        // Decoding from an empty buffer succeeds and mutates nothing.
        let mut decoded = Record::empty(OpKind::ShutdownRequest);
        let mut reader = XdrReader::new(&[]);
        decoded.decode_wire(&mut reader).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_encode_writes_exactly_wire_size() {
        // One record per padding case: len % 4 == 0, 1, 2, 3.
        let records = [
            Record::unlink("/a/b"),
            Record::unlink("/"),
            Record::unlink("/x"),
            Record::unlink("/ab"),
        ];
        for record in records {
            let mut writer = XdrWriter::new();
            record.encode_wire(&mut writer);
            assert_eq!(writer.written(), record.wire_size(), "{}", record);
        }
    }

    #[test]
    fn test_wire_roundtrip() {
        let original = Record::symlink("/etc/motd", "/srv/vol0/motd");
        let bytes = original.encode();

        let mut reader = XdrReader::new(&bytes);
        let decoded = Record::from_wire(OpKind::SymlinkRequest, &mut reader).unwrap();
        assert_eq!(decoded, original);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_mkdir_mixed_kinds_roundtrip() {
        let original = Record::mkdir("/srv/data", 0o750);
        let bytes = original.encode();

        let mut reader = XdrReader::new(&bytes);
        let decoded = Record::from_wire(OpKind::MkdirRequest, &mut reader).unwrap();
        assert_eq!(decoded.str_field("path"), Some("/srv/data"));
        assert_eq!(decoded.uint_field("mode"), Some(0o750));
    }

    #[test]
    fn test_decode_exhausted_mid_field() {
        let bytes = Record::symlink("/target", "/link").encode();
        // Drop the second field entirely.
        let mut reader = XdrReader::new(&bytes[..12]);
        let result = Record::from_wire(OpKind::SymlinkRequest, &mut reader);
        assert!(matches!(
            result,
            Err(ProtocolError::MalformedWireData { .. })
        ));
    }

    #[test]
    fn test_map_roundtrip() {
        let original = Record::rename("/old/name", "/new/name");
        let map = original.to_map();
        assert_eq!(map[0].0, "source_path");
        assert_eq!(map[1].0, "target_path");

        let rebuilt = Record::from_map(OpKind::RenameRequest, &map).unwrap();
        assert_eq!(rebuilt, original);
    }

    #[test]
    fn test_seq_then_map() {
        let record =
            Record::from_seq(OpKind::RmdirRequest, vec![Value::from("/tmp/x")]).unwrap();
        let map = record.to_map();
        assert_eq!(map, vec![("path", Value::from("/tmp/x"))]);
    }

    #[test]
    fn test_from_map_missing_field() {
        let entries: Vec<(&str, Value)> = vec![];
        let result = Record::from_map(OpKind::RmdirRequest, &entries);
        assert!(matches!(result, Err(ProtocolError::MissingField("path"))));
    }

    #[test]
    fn test_from_map_type_mismatch() {
        let entries = vec![("path", Value::UInt(7))];
        let result = Record::from_map(OpKind::RmdirRequest, &entries);
        assert!(matches!(
            result,
            Err(ProtocolError::TypeMismatch { field: "path", .. })
        ));
    }

    #[test]
    fn test_from_map_ignores_surplus_keys() {
        let entries = vec![("junk", Value::UInt(1)), ("path", Value::from("/d"))];
        let record = Record::from_map(OpKind::RmdirRequest, &entries).unwrap();
        assert_eq!(record.str_field("path"), Some("/d"));
    }

    #[test]
    fn test_from_seq_arity_mismatch() {
        let result = Record::from_seq(
            OpKind::SymlinkRequest,
            vec![Value::from("/only-one")],
        );
        assert!(matches!(
            result,
            Err(ProtocolError::ArityMismatch {
                kind: "symlinkRequest",
                expected: 2,
                actual: 1,
            })
        ));
    }

    #[test]
    fn test_from_seq_type_mismatch() {
        let result = Record::from_seq(OpKind::MkdirRequest, vec![
            Value::from("/d"),
            Value::from("not-a-mode"),
        ]);
        assert!(matches!(
            result,
            Err(ProtocolError::TypeMismatch { field: "mode", .. })
        ));
    }

    #[test]
    fn test_tag_stable_across_construction_paths() {
        let empty = Record::empty(OpKind::UnlinkRequest);
        let from_values = Record::unlink("/a");
        let from_map =
            Record::from_map(OpKind::UnlinkRequest, &[("path", Value::from("/a"))]).unwrap();

        assert_eq!(empty.tag(), 1221);
        assert_eq!(from_values.tag(), 1221);
        assert_eq!(from_map.tag(), 1221);
        assert_eq!(empty.tag(), empty.tag());
    }

    #[test]
    fn test_set_field() {
        let mut record = Record::empty(OpKind::UnlinkRequest);
        assert_eq!(record.str_field("path"), Some(""));

        record.set("path", Value::from("/gone")).unwrap();
        assert_eq!(record.str_field("path"), Some("/gone"));

        let result = record.set("path", Value::UInt(1));
        assert!(matches!(result, Err(ProtocolError::TypeMismatch { .. })));

        let result = record.set("nonexistent", Value::from("x"));
        assert!(matches!(result, Err(ProtocolError::MissingField(_))));
    }

    #[test]
    fn test_display() {
        let record = Record::symlink("/x", "/y");
        assert_eq!(
            record.to_string(),
            r#"symlinkRequest(target_path: "/x", link_path: "/y")"#
        );
        assert_eq!(Record::shutdown().to_string(), "shutdownRequest()");
    }

    #[test]
    fn test_value_serializes_for_tooling() {
        let json = serde_json::to_string(&Value::from("/a")).unwrap();
        assert_eq!(json, r#""/a""#);
        let json = serde_json::to_string(&Value::UInt(493)).unwrap();
        assert_eq!(json, "493");
    }

    proptest! {
        #[test]
        fn prop_roundtrip_all_surfaces(path in ".*", mode in any::<u32>()) {
            let original = Record::mkdir(path, mode);

            let bytes = original.encode();
            prop_assert_eq!(bytes.len(), original.wire_size());
            let mut reader = XdrReader::new(&bytes);
            let from_wire = Record::from_wire(OpKind::MkdirRequest, &mut reader).unwrap();
            prop_assert_eq!(&from_wire, &original);

            let from_map = Record::from_map(OpKind::MkdirRequest, &original.to_map()).unwrap();
            prop_assert_eq!(&from_map, &original);

            let from_seq = Record::from_seq(OpKind::MkdirRequest, original.to_seq()).unwrap();
            prop_assert_eq!(&from_seq, &original);
        }
    }
}
