//! Calibration recovery engine
//!
//! A power glitch can leave the accelerometer with its calibration
//! registers wiped and its bus address shifted into a recovery range. This
//! module rediscovers such a chip, unlocks its calibration registers, and
//! either restores a previously persisted image or backs up the chip's
//! intact image into the non-volatile store.
//!
//! The engine runs once before normal driver bring-up. It is advisory:
//! callers log its outcome and proceed either way.

pub mod blob;
pub mod crc;

use crate::log_info;
use crate::platform::{I2cInterface, NvStore, PlatformError, TimerInterface};
use blob::CalibrationBlob;

/// Recovery-mode address scan range
const SCAN_FIRST: u8 = 0x10;
const SCAN_LAST: u8 = 0x1F;

/// Identity pattern a recovery-mode chip answers with
const ID_MASK: u8 = 0xFC;
const ID_PATTERN: u8 = 0xF8;

/// Identity register, also first calibration register
const REG_ID: u8 = 0x00;
/// Power mode register
const REG_POWER: u8 = 0x11;
/// Status word sampled and rewritten during the unlock handshake
const REG_STATUS: u8 = 0x05;
/// Calibration access control register
const REG_ACCESS: u8 = 0x35;

/// Written twice to `REG_ACCESS` to open the calibration registers
const ACCESS_OPEN: u8 = 0xAA;
/// Written once to `REG_ACCESS` to close them again
const ACCESS_CLOSE: u8 = 0x0A;

const STATUS_KEEP_MASK: u8 = 0x1F;
const STATUS_ENABLE_BIT: u8 = 0x80;

/// Last calibration register; `REG_ID..=REG_CAL_LAST` mirrors the image
const REG_CAL_LAST: u8 = 0x1A;

/// Registers cleared after a restore
const CLEAR_FIRST: u8 = 0x38;
const CLEAR_LAST: u8 = 0x3A;

/// Recovery failure modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RecoveryError {
    /// No device in the scan range answered with the recovery identity
    NoDevice,
    /// The unlock handshake failed; calibration registers stay closed
    Unlock,
    /// A bus transaction failed after discovery
    Transport,
    /// The chip's stored checksum does not cover its registers
    CrcMismatch,
    /// Reading the persisted image failed
    StoreRead,
    /// The store acknowledged the wrong slot; later slots were not written
    StoreWrite { slot: u8 },
}

impl From<PlatformError> for RecoveryError {
    fn from(_: PlatformError) -> Self {
        RecoveryError::Transport
    }
}

/// What the engine did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RecoveryOutcome {
    /// A persisted image was written back to the chip
    Restored,
    /// The chip's intact image was persisted
    BackedUp,
}

/// Run the recovery sequence
///
/// Discovers a recovery-mode chip, unlocks it, then restores or backs up
/// the calibration image depending on whether the store already holds a
/// valid one.
///
/// # Errors
///
/// `NoDevice` when nothing answers in the scan range, which is the normal
/// case on a healthy bus. Other variants indicate a device was found but
/// the sequence could not complete; the chip may be left partially
/// written.
pub fn run(
    i2c: &mut impl I2cInterface,
    nvs: &mut impl NvStore,
    timer: &mut impl TimerInterface,
) -> Result<RecoveryOutcome, RecoveryError> {
    let address = discover(i2c)?;
    log_info!("recovery: device found at {}", address);

    unlock(i2c, address, timer)?;

    let stored = read_store(nvs)?;
    if stored.is_valid() {
        restore(i2c, address, &stored)?;
        log_info!("recovery: calibration restored");
        Ok(RecoveryOutcome::Restored)
    } else {
        let image = backup(i2c, address)?;
        persist(nvs, &image)?;
        log_info!("recovery: calibration backed up");
        Ok(RecoveryOutcome::BackedUp)
    }
}

/// Scan the recovery address range for a chip answering the identity pattern
///
/// Read failures are expected on empty addresses and skipped; the first
/// match wins.
fn discover(i2c: &mut impl I2cInterface) -> Result<u8, RecoveryError> {
    for address in SCAN_FIRST..=SCAN_LAST {
        let mut id = [0u8; 1];
        if i2c.write_read(address, &[REG_ID], &mut id).is_err() {
            continue;
        }
        if id[0] & ID_MASK == ID_PATTERN {
            return Ok(address);
        }
    }
    Err(RecoveryError::NoDevice)
}

/// Open the calibration registers
///
/// Power the chip into normal mode, write the open magic twice, then
/// read-modify-write the status word. If the status exchange fails the
/// registers are closed again before reporting the failure.
fn unlock(
    i2c: &mut impl I2cInterface,
    address: u8,
    timer: &mut impl TimerInterface,
) -> Result<(), RecoveryError> {
    i2c.write(address, &[REG_POWER, 0x00])?;
    timer.delay_ms(2)?;
    i2c.write(address, &[REG_ACCESS, ACCESS_OPEN])?;
    i2c.write(address, &[REG_ACCESS, ACCESS_OPEN])?;

    let mut status = [0u8; 1];
    if i2c.write_read(address, &[REG_STATUS], &mut status).is_err() {
        let _ = i2c.write(address, &[REG_ACCESS, ACCESS_CLOSE]);
        return Err(RecoveryError::Unlock);
    }
    let value = (status[0] & STATUS_KEEP_MASK) | STATUS_ENABLE_BIT;
    if i2c.write(address, &[REG_STATUS, value]).is_err() {
        let _ = i2c.write(address, &[REG_ACCESS, ACCESS_CLOSE]);
        return Err(RecoveryError::Unlock);
    }
    Ok(())
}

/// Read the persisted image out of the word store
fn read_store(nvs: &mut impl NvStore) -> Result<CalibrationBlob, RecoveryError> {
    let mut words = [0u32; 8];
    for (i, word) in words.iter_mut().enumerate() {
        *word = nvs
            .read_slot(i as u8)
            .map_err(|_| RecoveryError::StoreRead)?;
    }
    Ok(CalibrationBlob::from_words(words))
}

/// Write a persisted image back into the chip's calibration registers
fn restore(
    i2c: &mut impl I2cInterface,
    address: u8,
    image: &CalibrationBlob,
) -> Result<(), RecoveryError> {
    for (reg, byte) in (REG_ID..=REG_CAL_LAST).zip(image.registers()) {
        i2c.write(address, &[reg, *byte])?;
    }
    i2c.write(address, &[REG_ACCESS, ACCESS_CLOSE])?;
    for reg in CLEAR_FIRST..=CLEAR_LAST {
        i2c.write(address, &[reg, 0x00])?;
    }
    Ok(())
}

/// Read the chip's calibration registers into a fresh image
///
/// The chip's stored checksum (last register) must cover the preceding
/// registers, otherwise the image is not worth persisting.
fn backup(i2c: &mut impl I2cInterface, address: u8) -> Result<CalibrationBlob, RecoveryError> {
    let mut image = CalibrationBlob::default();
    for (reg, byte) in (REG_ID..=REG_CAL_LAST).zip(image.registers_mut()) {
        let mut buf = [0u8; 1];
        i2c.write_read(address, &[reg], &mut buf)?;
        *byte = buf[0];
    }
    i2c.write(address, &[REG_ACCESS, ACCESS_CLOSE])?;

    if !image.crc_matches() {
        return Err(RecoveryError::CrcMismatch);
    }
    image.mark_valid();
    Ok(image)
}

/// Persist an image through the start/write/acknowledge sequence
///
/// Each write is acknowledged with the slot index the store committed. A
/// mismatch aborts the sequence immediately; already written slots are
/// left in place and the validity flag in the last word never lands, so a
/// partial image reads back as invalid.
fn persist(nvs: &mut impl NvStore, image: &CalibrationBlob) -> Result<(), RecoveryError> {
    nvs.begin_write()
        .map_err(|_| RecoveryError::StoreWrite { slot: 0 })?;
    for (i, word) in image.to_words().iter().enumerate() {
        let slot = i as u8;
        let ack = nvs
            .write_slot(slot, *word)
            .map_err(|_| RecoveryError::StoreWrite { slot })?;
        if ack != slot {
            return Err(RecoveryError::StoreWrite { slot });
        }
    }
    Ok(())
}
