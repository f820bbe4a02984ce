//! XDR primitive marshaling.
//!
//! Variable-length data (strings, opaque buffers) is laid out on the wire as
//! a length prefix, the raw bytes, then zero padding up to the next 4-byte
//! boundary:
//!
//! ```text
//! +----------+--------------+-------------------+
//! | length   | data         | padding           |
//! | 4 bytes  | length bytes | (4 - len % 4) % 4 |
//! +----------+--------------+-------------------+
//! ```
//!
//! Fixed-width integers are big-endian with no padding. String sequences are
//! a 4-byte element count followed by each string in the format above.
//!
//! Size functions are decoupled from the writer so callers can allocate a
//! single buffer of the exact encoded size before any write. The size
//! functions and the writer must never disagree: every `put_*` advances the
//! write cursor by exactly the corresponding `*_size` result.

use crate::error::ProtocolError;
use bytes::{BufMut, Bytes, BytesMut};

/// XDR alignment boundary in bytes.
pub const XDR_ALIGNMENT: usize = 4;

/// Rounds a raw byte length up to the next 4-byte boundary.
pub fn padded_len(len: usize) -> usize {
    (len + XDR_ALIGNMENT - 1) & !(XDR_ALIGNMENT - 1)
}

/// Wire size of a length-prefixed, padded string.
pub fn string_size(s: &str) -> usize {
    4 + padded_len(s.len())
}

/// Wire size of a length-prefixed, padded opaque buffer.
pub fn opaque_size(buf: &[u8]) -> usize {
    4 + padded_len(buf.len())
}

/// Wire size of a counted sequence of strings.
pub fn string_seq_size(values: &[String]) -> usize {
    4 + values.iter().map(|s| string_size(s)).sum::<usize>()
}

/// Append-only encode sink over a growable buffer.
#[derive(Debug)]
pub struct XdrWriter {
    buf: BytesMut,
}

impl XdrWriter {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self {
            buf: BytesMut::new(),
        }
    }

    /// Creates a writer with `capacity` bytes pre-allocated, so encoding a
    /// value of known wire size never reallocates.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    /// Appends a big-endian u32.
    pub fn put_u32(&mut self, value: u32) {
        self.buf.put_u32(value);
    }

    /// Appends a big-endian u64.
    pub fn put_u64(&mut self, value: u64) {
        self.buf.put_u64(value);
    }

    /// Appends a length-prefixed, zero-padded string.
    pub fn put_string(&mut self, s: &str) {
        self.put_padded(s.as_bytes());
    }

    /// Appends a length-prefixed, zero-padded opaque buffer.
    pub fn put_opaque(&mut self, bytes: &[u8]) {
        self.put_padded(bytes);
    }

    /// Appends a counted sequence of strings.
    pub fn put_string_seq(&mut self, values: &[String]) {
        self.buf.put_u32(values.len() as u32);
        for s in values {
            self.put_string(s);
        }
    }

    fn put_padded(&mut self, data: &[u8]) {
        self.buf.put_u32(data.len() as u32);
        self.buf.put_slice(data);
        let pad = padded_len(data.len()) - data.len();
        self.buf.put_bytes(0, pad);
    }

    /// Number of bytes written so far.
    pub fn written(&self) -> usize {
        self.buf.len()
    }

    /// Consumes the writer, returning the encoded bytes.
    pub fn freeze(self) -> Bytes {
        self.buf.freeze()
    }
}

impl Default for XdrWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Bounds-checked decode cursor over a raw byte buffer.
#[derive(Debug)]
pub struct XdrReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> XdrReader<'a> {
    /// Creates a reader over `buf`, positioned at the start.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize, what: &str) -> Result<&'a [u8], ProtocolError> {
        if self.remaining() < n {
            return Err(ProtocolError::MalformedWireData {
                reason: format!(
                    "truncated {}: need {} bytes, {} remaining",
                    what,
                    n,
                    self.remaining()
                ),
            });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Reads a big-endian u32.
    pub fn get_u32(&mut self) -> Result<u32, ProtocolError> {
        let b = self.take(4, "u32")?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Reads a big-endian u64.
    pub fn get_u64(&mut self) -> Result<u64, ProtocolError> {
        let b = self.take(8, "u64")?;
        Ok(u64::from_be_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    /// Reads a length-prefixed, padded string and realigns past the padding.
    pub fn get_string(&mut self) -> Result<String, ProtocolError> {
        let bytes = self.get_padded("string")?;
        String::from_utf8(bytes).map_err(|_| ProtocolError::MalformedWireData {
            reason: "invalid UTF-8 in string field".to_string(),
        })
    }

    /// Reads a length-prefixed, padded opaque buffer.
    pub fn get_opaque(&mut self) -> Result<Vec<u8>, ProtocolError> {
        self.get_padded("opaque buffer")
    }

    /// Reads a counted sequence of strings.
    pub fn get_string_seq(&mut self) -> Result<Vec<String>, ProtocolError> {
        let count = self.get_u32()? as usize;
        // Each element needs at least a length prefix; capping the initial
        // capacity keeps a hostile count from forcing a huge allocation.
        let mut values = Vec::with_capacity(count.min(self.remaining() / 4));
        for _ in 0..count {
            values.push(self.get_string()?);
        }
        Ok(values)
    }

    fn get_padded(&mut self, what: &str) -> Result<Vec<u8>, ProtocolError> {
        let len = self.get_u32()? as usize;
        if self.remaining() < len {
            return Err(ProtocolError::MalformedWireData {
                reason: format!(
                    "declared {} length {} exceeds {} remaining bytes",
                    what,
                    len,
                    self.remaining()
                ),
            });
        }
        let data = self.take(len, what)?.to_vec();
        let pad = padded_len(len) - len;
        self.take(pad, "padding")?;
        Ok(data)
    }
}
