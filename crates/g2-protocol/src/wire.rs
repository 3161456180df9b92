//! Tag/value records inside frame payloads.
//!
//! Each record is a varint key `(field_number << 3) | wire_type` followed by a
//! value whose shape depends on the wire type:
//!
//! | Wire type | Value                          |
//! |-----------|--------------------------------|
//! | 0         | varint                         |
//! | 1         | 8 bytes                        |
//! | 2         | varint length + that many bytes |
//! | 5         | 4 bytes                        |

use crate::error::ProtocolError;
use crate::varint::{decode_varint, put_varint};

/// Varint value.
pub const WIRE_VARINT: u8 = 0;
/// Fixed 8-byte value.
pub const WIRE_FIXED64: u8 = 1;
/// Length-delimited value.
pub const WIRE_LEN: u8 = 2;
/// Fixed 4-byte value.
pub const WIRE_FIXED32: u8 = 5;

/// Builds a sequence of records.
#[derive(Debug, Default, Clone)]
pub struct FieldWriter {
    buf: Vec<u8>,
}

impl FieldWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        FieldWriter { buf: Vec::new() }
    }

    /// Write a record key.
    pub fn key(&mut self, field: u32, wire_type: u8) -> &mut Self {
        put_varint(&mut self.buf, ((field as u64) << 3) | wire_type as u64);
        self
    }

    /// Write a varint record.
    pub fn varint(&mut self, field: u32, value: u64) -> &mut Self {
        self.key(field, WIRE_VARINT);
        put_varint(&mut self.buf, value);
        self
    }

    /// Write a length-delimited record.
    pub fn bytes(&mut self, field: u32, value: &[u8]) -> &mut Self {
        self.key(field, WIRE_LEN);
        put_varint(&mut self.buf, value.len() as u64);
        self.buf.extend_from_slice(value);
        self
    }

    /// Write a nested record sequence as a length-delimited record.
    pub fn message<F>(&mut self, field: u32, build: F) -> &mut Self
    where
        F: FnOnce(&mut FieldWriter),
    {
        let mut inner = FieldWriter::new();
        build(&mut inner);
        self.bytes(field, &inner.buf)
    }

    /// Append bytes verbatim.
    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    /// Finish and return the encoded bytes.
    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

/// Value of one decoded record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    /// Wire type 0.
    Varint(u64),
    /// Wire type 1.
    Fixed64([u8; 8]),
    /// Wire type 2.
    Bytes(&'a [u8]),
    /// Wire type 5.
    Fixed32([u8; 4]),
}

/// One decoded record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field<'a> {
    /// Field number from the key.
    pub number: u32,
    /// Decoded value.
    pub value: FieldValue<'a>,
}

impl<'a> Field<'a> {
    /// The value as a varint, if it is one.
    pub fn as_varint(&self) -> Option<u64> {
        match self.value {
            FieldValue::Varint(v) => Some(v),
            _ => None,
        }
    }

    /// The value as bytes, if it is length-delimited.
    pub fn as_bytes(&self) -> Option<&'a [u8]> {
        match self.value {
            FieldValue::Bytes(b) => Some(b),
            _ => None,
        }
    }
}

/// Iterates over the records in a buffer.
///
/// Yields `Err` once and then stops if a record is malformed.
#[derive(Debug, Clone)]
pub struct FieldReader<'a> {
    buf: &'a [u8],
    pos: usize,
    failed: bool,
}

impl<'a> FieldReader<'a> {
    /// Start reading records from `buf`.
    pub fn new(buf: &'a [u8]) -> Self {
        FieldReader {
            buf,
            pos: 0,
            failed: false,
        }
    }

    /// Read every record, failing on the first malformed one.
    pub fn collect_all(buf: &'a [u8]) -> Result<Vec<Field<'a>>, ProtocolError> {
        FieldReader::new(buf).collect()
    }

    /// Find the first varint record with the given field number.
    pub fn find_varint(buf: &'a [u8], number: u32) -> Option<u64> {
        FieldReader::new(buf)
            .map_while(Result::ok)
            .find(|f| f.number == number)
            .and_then(|f| f.as_varint())
    }

    fn take(&mut self, len: usize, offset: usize) -> Result<&'a [u8], ProtocolError> {
        let buf = self.buf;
        let end = self.pos.checked_add(len).filter(|&end| end <= buf.len());
        match end {
            Some(end) => {
                let slice = &buf[self.pos..end];
                self.pos = end;
                Ok(slice)
            }
            None => Err(ProtocolError::MalformedField {
                offset,
                reason: "value runs past end of buffer",
            }),
        }
    }

    fn read_field(&mut self) -> Result<Field<'a>, ProtocolError> {
        let offset = self.pos;
        let (key, used) = decode_varint(self.buf, self.pos)?;
        self.pos += used;

        let number = u32::try_from(key >> 3).map_err(|_| ProtocolError::MalformedField {
            offset,
            reason: "field number out of range",
        })?;
        if number == 0 {
            return Err(ProtocolError::MalformedField {
                offset,
                reason: "field number zero",
            });
        }

        let value = match (key & 0x07) as u8 {
            WIRE_VARINT => {
                let (v, used) = decode_varint(self.buf, self.pos)?;
                self.pos += used;
                FieldValue::Varint(v)
            }
            WIRE_FIXED64 => {
                let mut bytes = [0u8; 8];
                bytes.copy_from_slice(self.take(8, offset)?);
                FieldValue::Fixed64(bytes)
            }
            WIRE_LEN => {
                let (len, used) = decode_varint(self.buf, self.pos)?;
                self.pos += used;
                let len = usize::try_from(len).map_err(|_| ProtocolError::MalformedField {
                    offset,
                    reason: "length out of range",
                })?;
                FieldValue::Bytes(self.take(len, offset)?)
            }
            WIRE_FIXED32 => {
                let mut bytes = [0u8; 4];
                bytes.copy_from_slice(self.take(4, offset)?);
                FieldValue::Fixed32(bytes)
            }
            _ => {
                return Err(ProtocolError::MalformedField {
                    offset,
                    reason: "unsupported wire type",
                })
            }
        };

        Ok(Field { number, value })
    }
}

impl<'a> Iterator for FieldReader<'a> {
    type Item = Result<Field<'a>, ProtocolError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos >= self.buf.len() {
            return None;
        }
        let result = self.read_field();
        if result.is_err() {
            self.failed = true;
        }
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DISPLAY_CONFIG_BLOB;

    #[test]
    fn test_writer_matches_captured_capability_query() {
        let mut w = FieldWriter::new();
        w.varint(1, 4).varint(2, 0x0C).message(3, |m| {
            m.varint(1, 1).varint(2, 4);
        });
        assert_eq!(
            w.finish(),
            vec![0x08, 0x04, 0x10, 0x0C, 0x1A, 0x04, 0x08, 0x01, 0x10, 0x04]
        );
    }

    #[test]
    fn test_large_field_number_key() {
        let mut w = FieldWriter::new();
        w.message(128, |_| {});
        assert_eq!(w.finish(), vec![0x82, 0x08, 0x00]);
    }

    #[test]
    fn test_reader_walks_nested_records() {
        let buf = [0x08, 0x04, 0x10, 0x0C, 0x1A, 0x04, 0x08, 0x01, 0x10, 0x04];
        let fields = FieldReader::collect_all(&buf).unwrap();
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0].as_varint(), Some(4));
        assert_eq!(fields[1].as_varint(), Some(0x0C));
        let inner = FieldReader::collect_all(fields[2].as_bytes().unwrap()).unwrap();
        assert_eq!(inner[1], Field { number: 2, value: FieldValue::Varint(4) });
    }

    #[test]
    fn test_reader_reports_truncated_bytes() {
        // Field 3, length 5, only two bytes present.
        let buf = [0x1A, 0x05, 0x01, 0x02];
        let err = FieldReader::collect_all(&buf).unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedField { offset: 0, .. }));
    }

    #[test]
    fn test_reader_rejects_group_wire_types() {
        let buf = [0x0B, 0x00];
        assert!(FieldReader::collect_all(&buf).is_err());
    }

    #[test]
    fn test_reader_stops_after_error() {
        let mut reader = FieldReader::new(&[0x1A, 0x05]);
        assert!(matches!(reader.next(), Some(Err(_))));
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_find_varint() {
        let buf = [0x08, 0x03, 0x10, 0x15, 0x2A, 0x00];
        assert_eq!(FieldReader::find_varint(&buf, 2), Some(0x15));
        assert_eq!(FieldReader::find_varint(&buf, 7), None);
    }

    #[test]
    fn test_display_config_blob_is_well_formed() {
        let fields = FieldReader::collect_all(&DISPLAY_CONFIG_BLOB).unwrap();
        assert_eq!(fields.len(), 6);
        for field in fields.iter().filter(|f| f.number == 2) {
            FieldReader::collect_all(field.as_bytes().unwrap()).unwrap();
        }
    }
}
