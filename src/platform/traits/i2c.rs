//! I2C interface trait
//!
//! This module defines the I2C bus communication interface that platform
//! implementations must provide. Register-oriented devices are driven with
//! `write` (register address as the first payload byte) and `write_read`
//! (register address written, value read back with a repeated START).

use crate::platform::Result;

/// I2C interface trait
///
/// # Safety Invariants
///
/// - I2C peripheral must be initialized before use
/// - Only one owner per I2C bus instance
/// - No concurrent access to the same I2C bus from multiple contexts
/// - Address must be 7-bit (valid range: 0x00..=0x7F)
pub trait I2cInterface {
    /// Write data to I2C device
    ///
    /// Performs a complete I2C write transaction:
    /// START - ADDR(W) - DATA - STOP
    ///
    /// For register writes the register address is the first data byte.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::I2c` if the device does not acknowledge,
    /// a bus error occurs, or the transport timeout expires.
    fn write(&mut self, addr: u8, data: &[u8]) -> Result<()>;

    /// Read data from I2C device
    ///
    /// Performs a complete I2C read transaction:
    /// START - ADDR(R) - DATA - STOP
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::I2c` if the device does not acknowledge,
    /// a bus error occurs, or the transport timeout expires.
    fn read(&mut self, addr: u8, buffer: &mut [u8]) -> Result<()>;

    /// Write then read from I2C device
    ///
    /// Performs a combined write-read transaction with a repeated START:
    /// START - ADDR(W) - WRITE_DATA - REPEATED_START - ADDR(R) - READ_DATA - STOP
    ///
    /// This is commonly used to write a register address then read the
    /// register value.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::I2c` if the device does not acknowledge,
    /// a bus error occurs, or the transport timeout expires.
    fn write_read(&mut self, addr: u8, write_data: &[u8], read_buffer: &mut [u8]) -> Result<()>;
}
