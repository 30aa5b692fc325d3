//! Object codec
//!
//! Encodes and decodes single `(identifier, payload)` objects.
//!
//! ```text
//! ┌────────────┬─────────────────┬──────────┬──────────────┐
//! │ IdLen (4)  │ PayloadLen (4)  │    Id    │   Payload    │
//! └────────────┴─────────────────┴──────────┴──────────────┘
//! ```
//!
//! Lengths are little-endian `u32`. Objects are concatenated with no framing.

use std::io::{self, Read};

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{BlockError, Result};

/// Object header size: IdLen (4) + PayloadLen (4)
pub const OBJECT_HEADER_SIZE: usize = 8;

/// A decoded object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Object {
    pub id: Bytes,
    pub payload: Bytes,
}

/// Number of bytes `encode` produces for this pair
pub fn encoded_len(id: &[u8], payload: &[u8]) -> u64 {
    (OBJECT_HEADER_SIZE + id.len() + payload.len()) as u64
}

/// Encode one object
pub fn encode(id: &[u8], payload: &[u8]) -> Result<Bytes> {
    let mut buf = BytesMut::with_capacity(OBJECT_HEADER_SIZE + id.len() + payload.len());
    encode_into(&mut buf, id, payload)?;
    Ok(buf.freeze())
}

/// Encode one object, appending to `buf`
pub fn encode_into(buf: &mut BytesMut, id: &[u8], payload: &[u8]) -> Result<()> {
    let id_len = field_len(id)?;
    let payload_len = field_len(payload)?;

    buf.reserve(OBJECT_HEADER_SIZE + id.len() + payload.len());
    buf.put_u32_le(id_len);
    buf.put_u32_le(payload_len);
    buf.put_slice(id);
    buf.put_slice(payload);
    Ok(())
}

fn field_len(field: &[u8]) -> Result<u32> {
    u32::try_from(field.len()).map_err(|_| BlockError::ObjectTooLarge(field.len()))
}

/// Decode the next object from `reader`
///
/// Returns:
/// - `Ok(Some(object))`: one complete object
/// - `Ok(None)`: the reader was exhausted exactly at an object boundary
/// - `Err(Corruption)`: the stream ended inside an object
pub fn decode_next<R: Read>(reader: &mut R) -> Result<Option<Object>> {
    let mut header = [0u8; OBJECT_HEADER_SIZE];
    let filled = read_fully(reader, &mut header)?;
    if filled == 0 {
        return Ok(None);
    }
    if filled < OBJECT_HEADER_SIZE {
        return Err(BlockError::Corruption(format!(
            "truncated object header: {} of {} bytes",
            filled, OBJECT_HEADER_SIZE
        )));
    }

    let id_len = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
    let payload_len = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);

    let id = read_field(reader, id_len, "id")?;
    let payload = read_field(reader, payload_len, "payload")?;

    Ok(Some(Object { id, payload }))
}

/// Read up to `buf.len()` bytes, stopping early only at end of stream
fn read_fully<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Read exactly `len` bytes without trusting `len` for the allocation size
fn read_field<R: Read>(reader: &mut R, len: u32, what: &str) -> Result<Bytes> {
    let mut field = Vec::new();
    reader.by_ref().take(u64::from(len)).read_to_end(&mut field)?;
    if field.len() != len as usize {
        return Err(BlockError::Corruption(format!(
            "truncated object {}: {} of {} bytes",
            what,
            field.len(),
            len
        )));
    }
    Ok(Bytes::from(field))
}

/// Streaming decoder over any reader
pub struct ObjectReader<R> {
    reader: R,
    /// Bytes consumed so far (offset of the next object)
    offset: u64,
    /// Set at end of stream or after the first error
    done: bool,
}

impl<R: Read> ObjectReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            offset: 0,
            done: false,
        }
    }

    /// Offset of the next object relative to where the reader started
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Decode the next object, tracking the byte offset.
    ///
    /// After the stream ends or an error is returned, every later call
    /// yields `Ok(None)`: the position inside a damaged object is unknown.
    pub fn next_object(&mut self) -> Result<Option<Object>> {
        if self.done {
            return Ok(None);
        }
        match decode_next(&mut self.reader) {
            Ok(Some(obj)) => {
                self.offset += encoded_len(&obj.id, &obj.payload);
                Ok(Some(obj))
            }
            Ok(None) => {
                self.done = true;
                Ok(None)
            }
            Err(e) => {
                self.done = true;
                Err(e)
            }
        }
    }

    /// Feed every object to `visit` until it returns `false` or the stream ends
    pub fn visit_each(
        &mut self,
        visit: &mut dyn FnMut(&[u8], &[u8]) -> Result<bool>,
    ) -> Result<()> {
        while let Some(obj) = self.next_object()? {
            if !visit(&obj.id, &obj.payload)? {
                break;
            }
        }
        Ok(())
    }
}

impl<R: Read> Iterator for ObjectReader<R> {
    type Item = Result<Object>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_object().transpose()
    }
}
