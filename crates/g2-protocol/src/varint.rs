//! Base-128 varints: little-endian 7-bit groups, high bit set on every byte
//! except the last.

use bytes::BufMut;

use crate::constants::MAX_VARINT_LEN;
use crate::error::ProtocolError;

/// Encode `value` as a varint.
pub fn encode_varint(value: u64) -> Vec<u8> {
    let mut buf = Vec::with_capacity(MAX_VARINT_LEN);
    put_varint(&mut buf, value);
    buf
}

/// Append `value` as a varint to `buf`.
pub fn put_varint<B: BufMut>(buf: &mut B, mut value: u64) {
    while value >= 0x80 {
        buf.put_u8((value as u8 & 0x7F) | 0x80);
        value >>= 7;
    }
    buf.put_u8(value as u8);
}

/// Number of bytes `value` occupies as a varint.
pub fn varint_len(value: u64) -> usize {
    let bits = 64 - (value | 1).leading_zeros() as usize;
    bits.div_ceil(7)
}

/// Decode a varint starting at `offset`.
///
/// Returns the value and the number of bytes consumed. Fails if the buffer ends
/// before a byte without the continuation bit, or if no such byte appears within
/// 10 bytes.
pub fn decode_varint(buf: &[u8], offset: usize) -> Result<(u64, usize), ProtocolError> {
    let mut value: u64 = 0;
    for i in 0..MAX_VARINT_LEN {
        let byte = *buf
            .get(offset + i)
            .ok_or(ProtocolError::MalformedVarint { offset })?;
        let group = (byte & 0x7F) as u64;
        // The tenth group only has room for the top bit of a u64.
        if i == MAX_VARINT_LEN - 1 && group > 1 {
            return Err(ProtocolError::MalformedVarint { offset });
        }
        value |= group << (7 * i);
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    Err(ProtocolError::MalformedVarint { offset })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_varint_known_encodings() {
        assert_eq!(encode_varint(0), vec![0x00]);
        assert_eq!(encode_varint(1), vec![0x01]);
        assert_eq!(encode_varint(127), vec![0x7F]);
        assert_eq!(encode_varint(128), vec![0x80, 0x01]);
        assert_eq!(encode_varint(300), vec![0xAC, 0x02]);
        assert_eq!(encode_varint(16384), vec![0x80, 0x80, 0x01]);
        assert_eq!(encode_varint(u32::MAX as u64), vec![0xFF, 0xFF, 0xFF, 0xFF, 0x0F]);
    }

    #[test]
    fn test_varint_round_trip_boundaries() {
        for v in [0u64, 1, 127, 128, 16384, (1 << 32) - 1, (1 << 63) - 1, u64::MAX] {
            let encoded = encode_varint(v);
            assert_eq!(encoded.len(), varint_len(v));
            assert_eq!(decode_varint(&encoded, 0), Ok((v, encoded.len())));
        }
    }

    #[test]
    fn test_decode_at_offset() {
        let buf = [0xAA, 0xAC, 0x02, 0x55];
        assert_eq!(decode_varint(&buf, 1), Ok((300, 2)));
    }

    #[test]
    fn test_decode_truncated() {
        assert_eq!(
            decode_varint(&[0x80, 0x80], 0),
            Err(ProtocolError::MalformedVarint { offset: 0 })
        );
        assert_eq!(
            decode_varint(&[], 0),
            Err(ProtocolError::MalformedVarint { offset: 0 })
        );
    }

    #[test]
    fn test_decode_too_long() {
        let buf = [0xFF; 11];
        assert_eq!(
            decode_varint(&buf, 0),
            Err(ProtocolError::MalformedVarint { offset: 0 })
        );
    }

    #[test]
    fn test_decode_overflowing_tenth_byte() {
        let mut buf = vec![0xFF; 9];
        buf.push(0x02);
        assert!(decode_varint(&buf, 0).is_err());
    }
}
