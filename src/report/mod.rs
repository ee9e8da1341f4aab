//! Measurement event reporting
//!
//! Processed samples leave the polling layer as small event batches, the
//! way an input-device pipe would carry them: one event per axis, an
//! optional repeat marker when a sample exactly matches the previous one,
//! a wake event for on-demand client wakeups, and a sync terminator.

pub mod queue;

pub use queue::EventQueue;

/// Event codes carried in a report batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EventCode {
    /// X axis acceleration, micro-m/s^2
    X,
    /// Y axis acceleration, micro-m/s^2
    Y,
    /// Z axis acceleration, micro-m/s^2
    Z,
    /// Repeat marker; value counts consecutive identical samples
    Marker,
    /// Wakeup serial requested by a client
    Wake,
    /// End of batch
    Sync,
}

/// One reported event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxisEvent {
    pub timestamp_us: u64,
    pub code: EventCode,
    pub value: i32,
}

/// Consumer of report batches
///
/// `publish` is called from the sampling path and must not block.
pub trait EventSink {
    fn publish(&self, events: &[AxisEvent]);
}
