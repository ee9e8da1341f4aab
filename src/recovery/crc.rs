//! Calibration image checksum
//!
//! The chip stores an 8-bit CRC over its calibration registers, computed
//! with polynomial 0x1D, initial value 0xFF and a complemented result
//! (CRC-8/SAE-J1850). The backup path recomputes it to decide whether a
//! freshly read image is worth persisting.

use crc::{Crc, CRC_8_SAE_J1850};

const CRC8: Crc<u8> = Crc::<u8>::new(&CRC_8_SAE_J1850);

/// Compute the calibration checksum over `data`
pub fn checksum(data: &[u8]) -> u8 {
    CRC8.checksum(data)
}

/// Check `data` against an expected checksum
pub fn verify(data: &[u8], expected: u8) -> bool {
    checksum(data) == expected
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Bit-serial reference implementation
    fn reference(data: &[u8]) -> u8 {
        let mut crc: u16 = 0xFF;
        for byte in data {
            crc ^= u16::from(*byte);
            for _ in 0..8 {
                crc <<= 1;
                if crc & 0x100 != 0 {
                    crc ^= 0x11D;
                }
            }
        }
        !(crc as u8)
    }

    #[test]
    fn test_known_check_value() {
        assert_eq!(checksum(b"123456789"), 0x4B);
    }

    #[test]
    fn test_matches_bit_serial_reference() {
        let cases: [&[u8]; 4] = [&[], &[0x00], &[0xFF; 26], &[0x12, 0x34, 0x56, 0x78, 0x9A]];
        for data in cases {
            assert_eq!(checksum(data), reference(data));
        }
    }

    #[test]
    fn test_detects_corruption() {
        let mut data = [0xA5u8; 26];
        let good = checksum(&data);
        assert!(verify(&data, good));
        data[13] ^= 0x01;
        assert!(!verify(&data, good));
    }
}
