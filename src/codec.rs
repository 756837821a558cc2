//! Binary persistence format
//!
//! File layout:
//!
//! ```text
//! offset  size  field
//! ------  ----  -----------------------------------
//! 0       8     tree order, u64 little-endian
//! 8       1     unique flag, 0 or 1
//! 9       ..    entry records until end of stream
//! ```
//!
//! Each record is `[length: u64 LE][payload]` where the payload is the
//! JSON encoding of one `(key, value)` pair. Multi-valued keys repeat
//! the key, one record per value, in list order. A stream ending cleanly
//! between records is end of data; a stream ending inside a record is
//! corrupt.

use crate::datum::Datum;
use crate::error::{Error, Result};
use std::io::{ErrorKind, Read, Write};

/// Upper bound on a single record payload, enforced on both sides:
/// writing refuses to produce a longer record, reading treats a longer
/// length field as corruption rather than an allocation request.
const MAX_RECORD_LEN: u64 = 16 * 1024 * 1024;

/// Persisted construction parameters, read back before the index body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Header {
    pub order: u64,
    pub unique: bool,
}

pub(crate) fn write_header<W: Write>(writer: &mut W, header: &Header) -> Result<()> {
    writer.write_all(&header.order.to_le_bytes())?;
    writer.write_all(&[header.unique as u8])?;
    Ok(())
}

pub(crate) fn read_header<R: Read>(reader: &mut R) -> Result<Header> {
    let mut order_bytes = [0u8; 8];
    reader.read_exact(&mut order_bytes)?;
    let order = u64::from_le_bytes(order_bytes);
    let mut flag = [0u8; 1];
    reader.read_exact(&mut flag)?;
    let unique = match flag[0] {
        0 => false,
        1 => true,
        other => {
            return Err(Error::corrupt(format!("invalid unique flag {other}")));
        }
    };
    Ok(Header { order, unique })
}

pub(crate) fn write_record<W: Write>(writer: &mut W, key: &Datum, value: &Datum) -> Result<()> {
    let payload = serde_json::to_vec(&(key, value))?;
    let length = payload.len() as u64;
    if length > MAX_RECORD_LEN {
        return Err(Error::corrupt(format!("record length {length} out of range")));
    }
    writer.write_all(&length.to_le_bytes())?;
    writer.write_all(&payload)?;
    Ok(())
}

/// Read the next `(key, value)` record; `Ok(None)` on clean end of stream.
pub(crate) fn read_record<R: Read>(reader: &mut R) -> Result<Option<(Datum, Datum)>> {
    let mut length_bytes = [0u8; 8];
    if !read_full_or_eof(reader, &mut length_bytes)? {
        return Ok(None);
    }
    let length = u64::from_le_bytes(length_bytes);
    if length == 0 || length > MAX_RECORD_LEN {
        return Err(Error::corrupt(format!("record length {length} out of range")));
    }
    let mut payload = vec![0u8; length as usize];
    reader.read_exact(&mut payload)?;
    let (key, value) = serde_json::from_slice(&payload)?;
    Ok(Some((key, value)))
}

/// Fill `buf` completely, or return `Ok(false)` when the stream was
/// already exhausted. A stream ending partway through is corrupt.
fn read_full_or_eof<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<bool> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => {
                if filled == 0 {
                    return Ok(false);
                }
                return Err(Error::corrupt("stream ended inside a record length"));
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(true)
}
