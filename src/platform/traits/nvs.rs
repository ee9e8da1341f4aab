//! Non-volatile store interface trait
//!
//! The calibration backup lives in a privileged non-volatile store reached
//! through a sequential word-indexed request/acknowledge channel (on the
//! reference hardware, a co-processor RPC). This trait captures only the
//! contract the recovery engine needs: eight 32-bit slots, read one at a
//! time, written through a start/write/ack sequence.

use crate::platform::Result;

/// Number of 32-bit slots backing one calibration image
pub const NV_SLOT_COUNT: usize = 8;

/// Persistent word-store interface
///
/// # Safety Invariants
///
/// - The store channel is exclusively owned for the duration of a
///   read or write sequence; no concurrent access is contemplated.
/// - Slot indices are 0..=7.
pub trait NvStore {
    /// Read one 32-bit slot
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Nvs` if the request/response exchange fails.
    fn read_slot(&mut self, index: u8) -> Result<u32>;

    /// Start a write sequence
    ///
    /// Must be called once before the first `write_slot` of a sequence.
    fn begin_write(&mut self) -> Result<()>;

    /// Write one 32-bit slot, returning the store's acknowledged index
    ///
    /// The store acknowledges each write with the slot index it believes it
    /// just committed. Callers must compare the returned index against the
    /// requested one and abort the sequence on mismatch.
    fn write_slot(&mut self, index: u8, word: u32) -> Result<u8>;
}
