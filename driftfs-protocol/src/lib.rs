//! # driftfs-protocol
//!
//! Wire protocol implementation for driftfs metadata operations.
//!
//! This crate provides:
//! - XDR primitive marshaling: length-prefixed, 4-byte-aligned strings and
//!   opaque buffers, big-endian integers, with exact pre-computed sizes so
//!   encoding is a single allocation
//! - Table-driven operation records with three interchangeable
//!   representations of the same payload: raw wire bytes, an ordered
//!   name-to-value mapping, and a positional value sequence
//! - Request/response pairing, including defaulted responses for error
//!   paths
//! - A tag-to-factory registry that turns an inbound `(tag, payload)` pair
//!   into a typed record
//!
//! Transport framing, connection management, and the filesystem semantics
//! behind each operation live in the service's other components; they
//! consume this crate's encode/decode/dispatch contract and are not part of
//! it. Encode, decode, and size computation are pure, synchronous calls
//! that never touch I/O.

pub mod error;
pub mod ops;
pub mod record;
pub mod registry;
pub mod xdr;

pub use error::ProtocolError;
pub use ops::{OpKind, Tag};
pub use record::{FieldKind, FieldSpec, Record, Value};
pub use registry::{OpRegistry, RecordFactory};
pub use xdr::{XdrReader, XdrWriter, XDR_ALIGNMENT};
