//! Core systems
//!
//! Cross-cutting concerns shared by the platform layer and the drivers.

pub mod logging;
