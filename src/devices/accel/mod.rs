//! Accelerometer drivers

pub mod bma250;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use bma250::Bma250Driver;

#[cfg(any(test, feature = "mock"))]
pub use mock::MockAccel;
