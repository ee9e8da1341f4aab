//! BMA250 triaxial accelerometer driver
//!
//! 10-bit digital accelerometer on I2C. The driver fixes the range at
//! +/-2g and maps requested sampling intervals onto the chip's bandwidth
//! settings. Processed output is micro-m/s^2 after mounting-position remap,
//! offset subtraction and an optional noise filter.

pub mod config;
pub mod driver;
pub mod registers;

pub use driver::Bma250Driver;
