//! Accelerometer sensor trait
//!
//! Contract for triaxial accelerometer drivers. A driver owns its bus
//! handle, converts raw counts to micro-m/s^2, applies mounting-position
//! remap, offset subtraction and the optional noise filter, and reports
//! through [`AccelSample`]. The polling layer in
//! `devices::accel_operation` drives any implementation of this trait.

use crate::platform::{error::I2cError, PlatformError};
use nalgebra::Vector3;

/// Number of supported mounting positions
///
/// Four 90-degree rotations for each of the two board faces.
pub const POSITION_COUNT: u8 = 8;

/// Accelerometer driver errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AccelError {
    /// Bus transaction failed
    Transport(I2cError),
    /// A device answered but its identity register did not match
    WrongChip,
    /// Operation requires a completed `init`
    NotInitialized,
    /// Parameter outside its accepted range
    InvalidArgument,
}

impl From<PlatformError> for AccelError {
    fn from(err: PlatformError) -> Self {
        match err {
            PlatformError::I2c(e) => AccelError::Transport(e),
            _ => AccelError::Transport(I2cError::BusError),
        }
    }
}

/// One accelerometer measurement
///
/// `raw` holds remapped sensor counts, `xyz` the fully processed output in
/// micro-m/s^2 (scaled, offset-subtracted, filtered).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccelSample {
    /// Sensor counts after mounting-position remap
    pub raw: Vector3<i32>,
    /// Processed acceleration in micro-m/s^2
    pub xyz: Vector3<i32>,
    /// Capture time in microseconds
    pub timestamp_us: u64,
}

impl Default for AccelSample {
    fn default() -> Self {
        Self {
            raw: Vector3::zeros(),
            xyz: Vector3::zeros(),
            timestamp_us: 0,
        }
    }
}

/// Noise filter configuration
///
/// When enabled, a new processed value within `threshold` of the previous
/// output (per axis, in micro-m/s^2) is replaced by the previous output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterConfig {
    pub enabled: bool,
    pub threshold: i32,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            threshold: 0,
        }
    }
}

/// Accelerometer sensor trait
pub trait AccelSensor {
    /// Probe and configure the chip
    ///
    /// Safe to call repeatedly; subsequent calls on an initialized driver
    /// are no-ops.
    ///
    /// # Errors
    ///
    /// Returns `AccelError::WrongChip` if a device answers with the wrong
    /// identity. An unreachable device is not fatal: the driver comes up
    /// initialized and later measurements surface the transport error.
    fn init(&mut self) -> Result<(), AccelError>;

    /// Release the chip, putting it into its lowest-power state
    fn term(&mut self) -> Result<(), AccelError>;

    /// Turn measurement on or off
    ///
    /// Redundant transitions are no-ops that do not touch the bus.
    fn set_enable(&mut self, enable: bool) -> Result<(), AccelError>;

    /// Current enable state
    fn enable(&self) -> bool;

    /// Request a sampling interval in milliseconds
    ///
    /// The driver quantizes the request to the nearest interval its output
    /// data rates support and stores the effective value.
    fn set_delay(&mut self, delay_ms: u32) -> Result<(), AccelError>;

    /// Effective sampling interval in milliseconds
    fn delay(&self) -> u32;

    /// Select the mounting-position remap, `0..POSITION_COUNT`
    ///
    /// # Errors
    ///
    /// Returns `AccelError::InvalidArgument` for positions out of range.
    fn set_position(&mut self, position: u8) -> Result<(), AccelError>;

    /// Current mounting position
    fn position(&self) -> u8;

    /// Set the per-axis offset subtracted from processed output, micro-m/s^2
    fn set_offset(&mut self, offset: Vector3<i32>);

    /// Current offset
    fn offset(&self) -> Vector3<i32>;

    /// Replace the noise filter configuration
    fn set_filter(&mut self, filter: FilterConfig);

    /// Current noise filter configuration
    fn filter(&self) -> FilterConfig;

    /// Toggle the noise filter without changing its threshold
    fn set_filter_enable(&mut self, enable: bool) {
        let mut f = self.filter();
        f.enabled = enable;
        self.set_filter(f);
    }

    /// Take one measurement, stamped with `timestamp_us`
    ///
    /// # Errors
    ///
    /// Returns `AccelError::Transport` if the burst read fails;
    /// `AccelError::NotInitialized` before `init`.
    fn measure(&mut self, timestamp_us: u64) -> Result<AccelSample, AccelError>;

    /// Read back a raw chip register (diagnostics)
    fn register(&mut self, addr: u8) -> Result<u8, AccelError>;
}
