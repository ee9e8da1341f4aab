//! Device trait abstractions
//!
//! Trait contracts that decouple sensor consumers from concrete chip
//! drivers.

pub mod accel;

pub use accel::{AccelError, AccelSample, AccelSensor, FilterConfig, POSITION_COUNT};
