//! Mock non-volatile store implementation for testing
//!
//! Backs the eight-slot word store with a plain array and lets tests inject
//! read failures and acknowledge mismatches to exercise the recovery engine's
//! abort paths.

use crate::platform::{
    error::NvsError,
    traits::{NvStore, NV_SLOT_COUNT},
    PlatformError, Result,
};

/// Mock word-store implementation
#[derive(Debug, Default)]
pub struct MockNvStore {
    slots: [u32; NV_SLOT_COUNT],
    write_sequences: u32,
    fail_reads: bool,
    fail_begin: bool,
    bad_ack_slot: Option<u8>,
}

impl MockNvStore {
    /// Create a new mock store with all slots zeroed
    pub fn new() -> Self {
        Self::default()
    }

    /// Load all eight slots at once
    pub fn load_words(&mut self, words: &[u32; NV_SLOT_COUNT]) {
        self.slots = *words;
    }

    /// Get current slot contents (for test verification)
    pub fn words(&self) -> [u32; NV_SLOT_COUNT] {
        self.slots
    }

    /// Fail every `read_slot` call
    pub fn set_fail_reads(&mut self, fail: bool) {
        self.fail_reads = fail;
    }

    /// Fail the `begin_write` handshake
    pub fn set_fail_begin(&mut self, fail: bool) {
        self.fail_begin = fail;
    }

    /// Return a wrong acknowledge index for writes to `index`
    ///
    /// The write is not committed, matching a store that lost the request.
    pub fn set_bad_ack_slot(&mut self, index: Option<u8>) {
        self.bad_ack_slot = index;
    }

    /// Number of write sequences started (for test verification)
    pub fn write_sequences(&self) -> u32 {
        self.write_sequences
    }
}

impl NvStore for MockNvStore {
    fn read_slot(&mut self, index: u8) -> Result<u32> {
        if self.fail_reads {
            return Err(PlatformError::Nvs(NvsError::ReadFailed));
        }
        self.slots
            .get(index as usize)
            .copied()
            .ok_or(PlatformError::Nvs(NvsError::ReadFailed))
    }

    fn begin_write(&mut self) -> Result<()> {
        if self.fail_begin {
            return Err(PlatformError::Nvs(NvsError::WriteFailed));
        }
        self.write_sequences += 1;
        Ok(())
    }

    fn write_slot(&mut self, index: u8, word: u32) -> Result<u8> {
        if self.bad_ack_slot == Some(index) {
            // Acknowledge a different slot than requested without committing.
            return Ok(index.wrapping_add(1));
        }
        match self.slots.get_mut(index as usize) {
            Some(slot) => {
                *slot = word;
                Ok(index)
            }
            None => Err(PlatformError::Nvs(NvsError::WriteFailed)),
        }
    }
}
