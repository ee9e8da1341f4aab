//! Platform abstraction traits
//!
//! This module defines the traits that platform implementations must provide.

pub mod i2c;
pub mod nvs;
pub mod timer;

// Re-export trait interfaces
pub use i2c::I2cInterface;
pub use nvs::{NvStore, NV_SLOT_COUNT};
pub use timer::TimerInterface;
