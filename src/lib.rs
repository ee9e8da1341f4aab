//! triax - polling driver for BMA250-class triaxial accelerometers
//!
//! This library provides a platform abstraction layer, a chip backend behind a
//! device-independent trait, factory-calibration recovery through a privileged
//! non-volatile store, and a periodic sampling scheduler publishing axis
//! events to a pluggable sink.

#![cfg_attr(not(test), no_std)]

// The mock platform uses heap-backed std collections; pull std in whenever
// it is compiled, including feature-enabled no_std builds.
#[cfg(any(test, feature = "mock"))]
extern crate std;

// Platform abstraction layer (bus transport, persistent store, timing)
pub mod platform;

// Device drivers and the driver facade using platform abstraction
pub mod devices;

// Core systems (logging)
pub mod core;

// One-shot calibration recovery for parts that lost their factory trim
pub mod recovery;

// Axis-event publishing (sample consumers)
pub mod report;
