//! Operation table for the driftfs metadata protocol.
//!
//! Every operation kind carries a stable wire tag, a canonical ordered field
//! table, and (for requests) its paired response kind. Tags are part of the
//! protocol contract: a tag maps to exactly one record type for the lifetime
//! of the protocol version, and must remain stable across releases so that
//! independent implementations interoperate.

use crate::record::{FieldKind, FieldSpec, Record, Value};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable integer identifying one operation kind on the wire.
pub type Tag = u32;

const NO_FIELDS: &[FieldSpec] = &[];

const PATH_FIELDS: &[FieldSpec] = &[FieldSpec {
    name: "path",
    kind: FieldKind::Str,
}];

const MKDIR_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: "path",
        kind: FieldKind::Str,
    },
    FieldSpec {
        name: "mode",
        kind: FieldKind::UInt,
    },
];

const RENAME_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: "source_path",
        kind: FieldKind::Str,
    },
    FieldSpec {
        name: "target_path",
        kind: FieldKind::Str,
    },
];

const SYMLINK_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: "target_path",
        kind: FieldKind::Str,
    },
    FieldSpec {
        name: "link_path",
        kind: FieldKind::Str,
    },
];

/// Operation kinds understood by this protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OpKind {
    // Service control
    ShutdownRequest,
    ShutdownResponse,

    // Directory tree mutation
    MkdirRequest,
    MkdirResponse,
    RmdirRequest,
    RmdirResponse,
    RenameRequest,
    RenameResponse,
    SymlinkRequest,
    SymlinkResponse,
    UnlinkRequest,
    UnlinkResponse,
}

impl OpKind {
    /// Every kind of this protocol version, requests and responses.
    pub const ALL: [OpKind; 12] = [
        OpKind::ShutdownRequest,
        OpKind::ShutdownResponse,
        OpKind::MkdirRequest,
        OpKind::MkdirResponse,
        OpKind::RmdirRequest,
        OpKind::RmdirResponse,
        OpKind::RenameRequest,
        OpKind::RenameResponse,
        OpKind::SymlinkRequest,
        OpKind::SymlinkResponse,
        OpKind::UnlinkRequest,
        OpKind::UnlinkResponse,
    ];

    /// The stable wire tag for this kind. Requests and their responses each
    /// carry their own tag.
    pub fn tag(self) -> Tag {
        match self {
            OpKind::ShutdownRequest => 1151,
            OpKind::ShutdownResponse => 2151,
            OpKind::MkdirRequest => 1211,
            OpKind::MkdirResponse => 2211,
            OpKind::RmdirRequest => 1215,
            OpKind::RmdirResponse => 2215,
            OpKind::RenameRequest => 1216,
            OpKind::RenameResponse => 2216,
            OpKind::SymlinkRequest => 1220,
            OpKind::SymlinkResponse => 2220,
            OpKind::UnlinkRequest => 1221,
            OpKind::UnlinkResponse => 2221,
        }
    }

    /// The protocol name, used for diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            OpKind::ShutdownRequest => "shutdownRequest",
            OpKind::ShutdownResponse => "shutdownResponse",
            OpKind::MkdirRequest => "mkdirRequest",
            OpKind::MkdirResponse => "mkdirResponse",
            OpKind::RmdirRequest => "rmdirRequest",
            OpKind::RmdirResponse => "rmdirResponse",
            OpKind::RenameRequest => "renameRequest",
            OpKind::RenameResponse => "renameResponse",
            OpKind::SymlinkRequest => "symlinkRequest",
            OpKind::SymlinkResponse => "symlinkResponse",
            OpKind::UnlinkRequest => "unlinkRequest",
            OpKind::UnlinkResponse => "unlinkResponse",
        }
    }

    /// The canonical, ordered field table. Wire serialization, the mapping
    /// and sequence representations, and wire size computation all derive
    /// from this one table.
    pub fn fields(self) -> &'static [FieldSpec] {
        match self {
            OpKind::MkdirRequest => MKDIR_FIELDS,
            OpKind::RmdirRequest | OpKind::UnlinkRequest => PATH_FIELDS,
            OpKind::RenameRequest => RENAME_FIELDS,
            OpKind::SymlinkRequest => SYMLINK_FIELDS,
            OpKind::ShutdownRequest
            | OpKind::ShutdownResponse
            | OpKind::MkdirResponse
            | OpKind::RmdirResponse
            | OpKind::RenameResponse
            | OpKind::SymlinkResponse
            | OpKind::UnlinkResponse => NO_FIELDS,
        }
    }

    /// The response kind paired with this request, or `None` if this kind is
    /// itself a response (responses are terminal in the pairing relation).
    pub fn response_kind(self) -> Option<OpKind> {
        match self {
            OpKind::ShutdownRequest => Some(OpKind::ShutdownResponse),
            OpKind::MkdirRequest => Some(OpKind::MkdirResponse),
            OpKind::RmdirRequest => Some(OpKind::RmdirResponse),
            OpKind::RenameRequest => Some(OpKind::RenameResponse),
            OpKind::SymlinkRequest => Some(OpKind::SymlinkResponse),
            OpKind::UnlinkRequest => Some(OpKind::UnlinkResponse),
            _ => None,
        }
    }

    /// Whether this kind is request-shaped.
    pub fn is_request(self) -> bool {
        self.response_kind().is_some()
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Typed constructors for request records. Values must mirror the field
/// tables above.
impl Record {
    /// `shutdown`: stop the service. Carries no fields.
    pub fn shutdown() -> Record {
        Record::empty(OpKind::ShutdownRequest)
    }

    /// `mkdir(path, mode)`: create a directory.
    pub fn mkdir(path: impl Into<String>, mode: u32) -> Record {
        Record {
            kind: OpKind::MkdirRequest,
            values: vec![Value::Str(path.into()), Value::UInt(mode)],
        }
    }

    /// `rmdir(path)`: remove an empty directory.
    pub fn rmdir(path: impl Into<String>) -> Record {
        Record {
            kind: OpKind::RmdirRequest,
            values: vec![Value::Str(path.into())],
        }
    }

    /// `rename(source_path, target_path)`: move a directory entry.
    pub fn rename(source_path: impl Into<String>, target_path: impl Into<String>) -> Record {
        Record {
            kind: OpKind::RenameRequest,
            values: vec![
                Value::Str(source_path.into()),
                Value::Str(target_path.into()),
            ],
        }
    }

    /// `symlink(target_path, link_path)`: create a symbolic link.
    pub fn symlink(target_path: impl Into<String>, link_path: impl Into<String>) -> Record {
        Record {
            kind: OpKind::SymlinkRequest,
            values: vec![
                Value::Str(target_path.into()),
                Value::Str(link_path.into()),
            ],
        }
    }

    /// `unlink(path)`: remove a non-directory entry.
    pub fn unlink(path: impl Into<String>) -> Record {
        Record {
            kind: OpKind::UnlinkRequest,
            values: vec![Value::Str(path.into())],
        }
    }
}
