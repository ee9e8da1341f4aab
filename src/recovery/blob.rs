//! Calibration image layout
//!
//! A calibration image is 32 bytes, persisted as eight little-endian
//! 32-bit words. Bytes 0..=25 mirror the chip's calibration registers,
//! byte 26 is the chip's stored checksum over those registers, and byte 31
//! is a validity flag set once a backup has been persisted.

use super::crc;

/// Number of bytes mirroring chip registers, checksum included
pub const REGISTER_BYTES: usize = 27;
/// Offset of the stored checksum within the image
pub const CRC_INDEX: usize = 26;
/// Offset of the validity flag
const VALID_INDEX: usize = 31;
/// Total image size
pub const BLOB_SIZE: usize = 32;

/// 32-byte calibration image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationBlob([u8; BLOB_SIZE]);

impl Default for CalibrationBlob {
    fn default() -> Self {
        Self([0u8; BLOB_SIZE])
    }
}

impl CalibrationBlob {
    /// Build an image from the eight persisted words
    pub fn from_words(words: [u32; 8]) -> Self {
        let mut bytes = [0u8; BLOB_SIZE];
        for (i, word) in words.iter().enumerate() {
            bytes[i * 4..i * 4 + 4].copy_from_slice(&word.to_le_bytes());
        }
        Self(bytes)
    }

    /// Pack the image into the eight persisted words
    pub fn to_words(&self) -> [u32; 8] {
        let mut words = [0u32; 8];
        for (i, word) in words.iter_mut().enumerate() {
            let mut quad = [0u8; 4];
            quad.copy_from_slice(&self.0[i * 4..i * 4 + 4]);
            *word = u32::from_le_bytes(quad);
        }
        words
    }

    /// The register mirror, stored checksum included
    pub fn registers(&self) -> &[u8] {
        &self.0[..REGISTER_BYTES]
    }

    /// Mutable access to the register mirror
    pub fn registers_mut(&mut self) -> &mut [u8] {
        &mut self.0[..REGISTER_BYTES]
    }

    /// Stored checksum byte
    pub fn stored_crc(&self) -> u8 {
        self.0[CRC_INDEX]
    }

    /// Check the register mirror against the stored checksum
    pub fn crc_matches(&self) -> bool {
        crc::verify(&self.0[..CRC_INDEX], self.stored_crc())
    }

    /// Whether this image was ever marked as a completed backup
    pub fn is_valid(&self) -> bool {
        self.0[VALID_INDEX] == 1
    }

    /// Mark the image as a completed backup
    pub fn mark_valid(&mut self) {
        self.0[VALID_INDEX] = 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_packing_is_little_endian() {
        let mut words = [0u32; 8];
        words[0] = 0x4433_2211;
        words[7] = 0x0100_0000;
        let blob = CalibrationBlob::from_words(words);

        assert_eq!(blob.registers()[..4], [0x11, 0x22, 0x33, 0x44]);
        assert!(blob.is_valid());
        assert_eq!(blob.to_words(), words);
    }

    #[test]
    fn test_crc_matches() {
        let mut blob = CalibrationBlob::default();
        for (i, b) in blob.registers_mut()[..CRC_INDEX].iter_mut().enumerate() {
            *b = i as u8;
        }
        assert!(!blob.crc_matches());
        blob.0[CRC_INDEX] = crc::checksum(&blob.0[..CRC_INDEX]);
        assert!(blob.crc_matches());
    }

    #[test]
    fn test_valid_flag_round_trip() {
        let mut blob = CalibrationBlob::default();
        assert!(!blob.is_valid());
        blob.mark_valid();
        assert!(blob.is_valid());
        assert!(CalibrationBlob::from_words(blob.to_words()).is_valid());
    }
}
