//! Device drivers
//!
//! Hardware device drivers built on top of the platform abstraction layer.
//! Sensor drivers implement the trait contracts in [`traits`], so the
//! operation layer and tests can swap real chips for mocks.

pub mod accel;
pub mod accel_operation;
pub mod traits;
