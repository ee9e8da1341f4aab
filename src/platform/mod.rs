//! Platform abstraction layer
//!
//! This module provides hardware abstraction for the resources the driver
//! consumes: the register-oriented I2C bus, the privileged non-volatile
//! store, and a monotonic timer. All platform-specific code stays behind
//! these traits.

pub mod error;
pub mod traits;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export commonly used types
pub use error::{I2cError, NvsError, PlatformError, Result};
pub use traits::{I2cInterface, NvStore, TimerInterface};
