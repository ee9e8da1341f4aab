//! Bounded event queue sink
//!
//! Interrupt-safe fixed-capacity queue between the sampling path and a
//! consumer task. When full, the oldest events are dropped so the queue
//! always holds the freshest data.

use super::{AxisEvent, EventSink};
use core::cell::RefCell;
use critical_section::Mutex;
use heapless::Deque;

/// Bounded event queue
///
/// `N` is the capacity in events. Push side is the sampling path through
/// [`EventSink::publish`]; pop side is whatever drains reports.
pub struct EventQueue<const N: usize> {
    events: Mutex<RefCell<Deque<AxisEvent, N>>>,
}

impl<const N: usize> EventQueue<N> {
    pub const fn new() -> Self {
        Self {
            events: Mutex::new(RefCell::new(Deque::new())),
        }
    }

    /// Pop the oldest event, if any
    pub fn pop(&self) -> Option<AxisEvent> {
        critical_section::with(|cs| self.events.borrow_ref_mut(cs).pop_front())
    }

    /// Number of queued events
    pub fn len(&self) -> usize {
        critical_section::with(|cs| self.events.borrow_ref(cs).len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<const N: usize> Default for EventQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> EventSink for EventQueue<N> {
    fn publish(&self, events: &[AxisEvent]) {
        critical_section::with(|cs| {
            let mut queue = self.events.borrow_ref_mut(cs);
            for event in events {
                if queue.is_full() {
                    queue.pop_front();
                }
                // Capacity was just made available.
                let _ = queue.push_back(*event);
            }
        });
    }
}
