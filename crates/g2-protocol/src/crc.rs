//! CRC-16/CCITT (init 0xFFFF, poly 0x1021, MSB-first, no final XOR).

use crate::constants::{CRC16_INIT, CRC16_POLY};

const CRC16_TABLE: [u16; 256] = build_table();

const fn build_table() -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = (i as u16) << 8;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ CRC16_POLY
            } else {
                crc << 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// Compute the frame CRC over `data`.
///
/// Frames carry this over the payload only, never the header.
pub fn crc16(data: &[u8]) -> u16 {
    data.iter().fold(CRC16_INIT, |crc, &byte| {
        let index = ((crc >> 8) as u8 ^ byte) as usize;
        (crc << 8) ^ CRC16_TABLE[index]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Bit-at-a-time reference used to check the table.
    fn crc16_bitwise(data: &[u8]) -> u16 {
        let mut crc = CRC16_INIT;
        for &byte in data {
            crc ^= (byte as u16) << 8;
            for _ in 0..8 {
                crc = if crc & 0x8000 != 0 {
                    (crc << 1) ^ CRC16_POLY
                } else {
                    crc << 1
                };
            }
        }
        crc
    }

    #[test]
    fn test_crc16_check_value() {
        assert_eq!(crc16(b"123456789"), 0x29B1);
    }

    #[test]
    fn test_crc16_display_wake_known_answer() {
        assert_eq!(crc16(&[0x08, 0x02, 0x10, 0x14]), 0x3EA5);
    }

    #[test]
    fn test_crc16_empty_is_init() {
        assert_eq!(crc16(&[]), 0xFFFF);
    }

    #[test]
    fn test_crc16_table_matches_bitwise() {
        let data: Vec<u8> = (0..=255u8).chain((0..=255u8).rev()).collect();
        for len in [1, 2, 7, 64, 200, data.len()] {
            assert_eq!(crc16(&data[..len]), crc16_bitwise(&data[..len]), "len {}", len);
        }
    }
}
