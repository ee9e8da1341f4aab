//! Accelerometer polling operation
//!
//! Owns an [`AccelSensor`] driver and runs the periodic measurement loop
//! around it: enable/disable with generation-stamped cancellation, delay
//! re-arm, last-sample caching, and event publication through an
//! [`EventSink`].
//!
//! Three lock domains, never held together:
//! - driver lock: exclusive chip access
//! - data lock: the cached last sample
//! - control lock: enable flag, schedule generation, next deadline
//!
//! A schedule is stamped with the control generation when armed. Any
//! enable, disable or delay change bumps the generation, so a cycle armed
//! under an old stamp finds the mismatch and lapses without touching the
//! chip.

use crate::devices::accel::bma250::registers::REGISTER_WINDOW;
use crate::devices::traits::{AccelError, AccelSample, AccelSensor, FilterConfig};
use crate::platform::{I2cInterface, NvStore, TimerInterface};
use crate::report::{AxisEvent, EventCode, EventSink};
use crate::{log_info, log_warn};
use core::cell::RefCell;
use core::sync::atomic::{AtomicU32, Ordering};
use critical_section::Mutex;
use nalgebra::Vector3;

#[cfg(feature = "embassy")]
use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, signal::Signal};

/// Current time in microseconds
///
/// Zero on hosts without a tick source; tests pass explicit times into
/// [`AccelOperation::sample_cycle`] instead.
pub fn now_us() -> u64 {
    #[cfg(feature = "embassy")]
    let now = embassy_time::Instant::now().as_micros();
    #[cfg(not(feature = "embassy"))]
    let now = 0;
    now
}

/// Initial operation settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccelConfig {
    /// Mounting position, `0..POSITION_COUNT`
    pub position: u8,
    /// Requested sampling interval in milliseconds
    pub delay_ms: u32,
}

impl Default for AccelConfig {
    fn default() -> Self {
        Self {
            position: 0,
            delay_ms: 100,
        }
    }
}

/// Scheduler state under the control lock
#[derive(Debug, Default)]
struct Control {
    enabled: bool,
    generation: u32,
    next_due_us: u64,
    suspend_enable: bool,
}

/// Result of one sampling cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The stamp was stale or polling stopped; nothing happened
    Cancelled,
    /// A sample was published; the next cycle is due at `next_due_us`
    Sampled { next_due_us: u64 },
    /// The measurement failed; polling continues at `next_due_us`
    Skipped { next_due_us: u64 },
}

/// Accelerometer polling operation
pub struct AccelOperation<D: AccelSensor, S: EventSink> {
    driver: Mutex<RefCell<D>>,
    last: Mutex<RefCell<AccelSample>>,
    control: Mutex<RefCell<Control>>,
    sink: S,
    wake_serial: AtomicU32,
    marker_count: AtomicU32,
    #[cfg(feature = "embassy")]
    rearm: Signal<CriticalSectionRawMutex, ()>,
}

impl<D: AccelSensor, S: EventSink> AccelOperation<D, S> {
    /// Bring up a driver and wrap it in an operation
    ///
    /// Initializes the chip and applies the configured position and delay.
    /// Polling starts disabled.
    ///
    /// # Errors
    ///
    /// Returns the error together with the driver so the caller can retry
    /// or release the bus. The driver is terminated before being handed
    /// back.
    pub fn attach(mut driver: D, sink: S, config: AccelConfig) -> Result<Self, (AccelError, D)> {
        if let Err(e) = driver.init() {
            return Err((e, driver));
        }
        if let Err(e) = driver.set_position(config.position) {
            let _ = driver.term();
            return Err((e, driver));
        }
        if let Err(e) = driver.set_delay(config.delay_ms) {
            let _ = driver.term();
            return Err((e, driver));
        }
        Ok(Self {
            driver: Mutex::new(RefCell::new(driver)),
            last: Mutex::new(RefCell::new(AccelSample::default())),
            control: Mutex::new(RefCell::new(Control::default())),
            sink,
            wake_serial: AtomicU32::new(0),
            marker_count: AtomicU32::new(0),
            #[cfg(feature = "embassy")]
            rearm: Signal::new(),
        })
    }

    /// Tear down, terminating the chip and returning the driver
    pub fn detach(self) -> D {
        let mut driver = self.driver.into_inner().into_inner();
        let _ = driver.term();
        driver
    }

    /// The event sink
    pub fn sink(&self) -> &S {
        &self.sink
    }

    fn notify(&self) {
        #[cfg(feature = "embassy")]
        self.rearm.signal(());
    }

    fn with_driver<R>(&self, f: impl FnOnce(&mut D) -> R) -> R {
        critical_section::with(|cs| f(&mut self.driver.borrow_ref_mut(cs)))
    }

    /// Turn polling on or off
    ///
    /// Redundant transitions are no-ops. Enabling powers the chip and arms
    /// the first cycle one interval plus one millisecond out, so the chip
    /// has a full conversion ready when first read. Disabling bumps the
    /// generation first, which lapses any armed cycle, then powers the
    /// chip down.
    pub fn set_enable(&self, enable: bool) -> Result<(), AccelError> {
        let current = critical_section::with(|cs| self.control.borrow_ref(cs).enabled);
        if current == enable {
            return Ok(());
        }
        if enable {
            let delay = self.with_driver(|d| d.set_enable(true).map(|_| d.delay()))?;
            let due = now_us() + u64::from(delay + 1) * 1000;
            critical_section::with(|cs| {
                let mut ctl = self.control.borrow_ref_mut(cs);
                ctl.enabled = true;
                ctl.generation = ctl.generation.wrapping_add(1);
                ctl.next_due_us = due;
            });
            self.notify();
            Ok(())
        } else {
            critical_section::with(|cs| {
                let mut ctl = self.control.borrow_ref_mut(cs);
                ctl.enabled = false;
                ctl.generation = ctl.generation.wrapping_add(1);
            });
            // Taking the driver lock here also waits out a cycle that is
            // mid-measurement.
            self.with_driver(|d| d.set_enable(false))
        }
    }

    /// Current enable state
    pub fn enable(&self) -> bool {
        critical_section::with(|cs| self.control.borrow_ref(cs).enabled)
    }

    /// Change the sampling interval
    ///
    /// The driver quantizes the request. If polling is active the armed
    /// cycle is lapsed and a fresh one is scheduled a full new interval
    /// plus one millisecond out.
    pub fn set_delay(&self, delay_ms: u32) -> Result<(), AccelError> {
        let effective = self.with_driver(|d| d.set_delay(delay_ms).map(|_| d.delay()))?;
        let rearmed = critical_section::with(|cs| {
            let mut ctl = self.control.borrow_ref_mut(cs);
            if ctl.enabled {
                ctl.generation = ctl.generation.wrapping_add(1);
                ctl.next_due_us = now_us() + u64::from(effective + 1) * 1000;
                true
            } else {
                false
            }
        });
        if rearmed {
            self.notify();
        }
        Ok(())
    }

    /// Effective sampling interval in milliseconds
    pub fn delay(&self) -> u32 {
        self.with_driver(|d| d.delay())
    }

    /// Select the mounting position
    pub fn set_position(&self, position: u8) -> Result<(), AccelError> {
        self.with_driver(|d| d.set_position(position))
    }

    /// Current mounting position
    pub fn position(&self) -> u8 {
        self.with_driver(|d| d.position())
    }

    /// Set the calibration offset, micro-m/s^2
    pub fn set_offset(&self, offset: Vector3<i32>) {
        self.with_driver(|d| d.set_offset(offset));
    }

    /// Current calibration offset
    pub fn offset(&self) -> Vector3<i32> {
        self.with_driver(|d| d.offset())
    }

    /// Set the noise filter threshold, micro-m/s^2
    pub fn set_threshold(&self, threshold: i32) {
        self.with_driver(|d| {
            let mut f = d.filter();
            f.threshold = threshold;
            d.set_filter(f);
        });
    }

    /// Current noise filter threshold
    pub fn threshold(&self) -> i32 {
        self.with_driver(|d| d.filter().threshold)
    }

    /// Toggle the noise filter
    pub fn set_filter_enable(&self, enable: bool) {
        self.with_driver(|d| d.set_filter_enable(enable));
    }

    /// Whether the noise filter is active
    pub fn filter_enable(&self) -> bool {
        self.with_driver(|d| d.filter().enabled)
    }

    /// Full filter configuration
    pub fn filter(&self) -> FilterConfig {
        self.with_driver(|d| d.filter())
    }

    /// The most recent published sample
    pub fn last(&self) -> AccelSample {
        critical_section::with(|cs| *self.last.borrow_ref(cs))
    }

    /// Publish a wakeup event with a fresh serial
    ///
    /// Lets a client force an event through the sink without waiting for
    /// the next sample. Returns the serial.
    pub fn wake(&self) -> u32 {
        let serial = self.wake_serial.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        let now = now_us();
        self.sink.publish(&[
            AxisEvent {
                timestamp_us: now,
                code: EventCode::Wake,
                value: serial as i32,
            },
            AxisEvent {
                timestamp_us: now,
                code: EventCode::Sync,
                value: 0,
            },
        ]);
        serial
    }

    /// Read back a raw chip register (diagnostics)
    pub fn register(&self, addr: u8) -> Result<u8, AccelError> {
        self.with_driver(|d| d.register(addr))
    }

    /// Dump the whole register window into `buf` (diagnostics)
    pub fn dump_registers(
        &self,
        buf: &mut [u8; REGISTER_WINDOW as usize],
    ) -> Result<(), AccelError> {
        self.with_driver(|d| {
            for (addr, slot) in buf.iter_mut().enumerate() {
                *slot = d.register(addr as u8)?;
            }
            Ok(())
        })
    }

    /// Stop polling for a system suspend, remembering the enable state
    pub fn suspend(&self) -> Result<(), AccelError> {
        let was_enabled = critical_section::with(|cs| {
            let mut ctl = self.control.borrow_ref_mut(cs);
            ctl.suspend_enable = ctl.enabled;
            ctl.enabled
        });
        if was_enabled {
            self.set_enable(false)?;
        }
        Ok(())
    }

    /// Resume polling if it was enabled when suspended
    pub fn resume(&self) -> Result<(), AccelError> {
        let was_enabled =
            critical_section::with(|cs| self.control.borrow_ref(cs).suspend_enable);
        if was_enabled {
            self.set_enable(true)?;
        }
        Ok(())
    }

    /// The armed cycle, if polling is active
    ///
    /// Returns the generation stamp to pass into [`Self::sample_cycle`]
    /// and the deadline in microseconds.
    pub fn schedule(&self) -> Option<(u32, u64)> {
        critical_section::with(|cs| {
            let ctl = self.control.borrow_ref(cs);
            ctl.enabled.then_some((ctl.generation, ctl.next_due_us))
        })
    }

    /// Execute one sampling cycle armed under `stamped_generation`
    ///
    /// Measures, publishes an event batch, caches the sample and re-arms
    /// the schedule one interval from `now`. A stale stamp makes the whole
    /// cycle a no-op, including the re-arm.
    pub fn sample_cycle(&self, stamped_generation: u32, now: u64) -> CycleOutcome {
        let live = critical_section::with(|cs| {
            let ctl = self.control.borrow_ref(cs);
            ctl.enabled && ctl.generation == stamped_generation
        });
        if !live {
            return CycleOutcome::Cancelled;
        }

        let (result, delay) = self.with_driver(|d| (d.measure(now), d.delay()));

        let sampled = match result {
            Ok(sample) => {
                self.publish_sample(&sample);
                critical_section::with(|cs| *self.last.borrow_ref_mut(cs) = sample);
                true
            }
            Err(_) => {
                log_warn!("accel: measurement failed, will retry");
                false
            }
        };

        let next_due_us = now + u64::from(delay.max(1)) * 1000;
        let rearmed = critical_section::with(|cs| {
            let mut ctl = self.control.borrow_ref_mut(cs);
            if ctl.enabled && ctl.generation == stamped_generation {
                ctl.next_due_us = next_due_us;
                true
            } else {
                false
            }
        });
        if !rearmed {
            CycleOutcome::Cancelled
        } else if sampled {
            CycleOutcome::Sampled { next_due_us }
        } else {
            CycleOutcome::Skipped { next_due_us }
        }
    }

    /// Publish one sample as an X/Y/Z batch
    ///
    /// A sample identical to the previous one gets a repeat marker with an
    /// incrementing count, so downstream consumers that deduplicate
    /// unchanged values still see every cycle.
    fn publish_sample(&self, sample: &AccelSample) {
        let prev = self.last();
        let mut events: heapless::Vec<AxisEvent, 5> = heapless::Vec::new();
        let ts = sample.timestamp_us;
        let _ = events.push(AxisEvent {
            timestamp_us: ts,
            code: EventCode::X,
            value: sample.xyz.x,
        });
        let _ = events.push(AxisEvent {
            timestamp_us: ts,
            code: EventCode::Y,
            value: sample.xyz.y,
        });
        let _ = events.push(AxisEvent {
            timestamp_us: ts,
            code: EventCode::Z,
            value: sample.xyz.z,
        });
        if sample.xyz == prev.xyz {
            let count = self.marker_count.fetch_add(1, Ordering::Relaxed);
            let _ = events.push(AxisEvent {
                timestamp_us: ts,
                code: EventCode::Marker,
                value: count as i32,
            });
        }
        let _ = events.push(AxisEvent {
            timestamp_us: ts,
            code: EventCode::Sync,
            value: 0,
        });
        self.sink.publish(&events);
    }

    /// Drive the polling loop under embassy
    ///
    /// Sleeps until the armed deadline or a re-arm notification, whichever
    /// comes first, and runs cycles with the stamp they were armed under.
    #[cfg(feature = "embassy")]
    pub async fn run(&self) -> ! {
        use embassy_futures::select::{select, Either};
        use embassy_time::{Instant, Timer};

        loop {
            match self.schedule() {
                None => self.rearm.wait().await,
                Some((generation, due_us)) => {
                    let deadline = Instant::from_micros(due_us);
                    match select(self.rearm.wait(), Timer::at(deadline)).await {
                        Either::First(()) => {}
                        Either::Second(()) => {
                            let _ = self.sample_cycle(generation, now_us());
                        }
                    }
                }
            }
        }
    }
}

impl<I2C: I2cInterface, S: EventSink> AccelOperation<crate::devices::accel::Bma250Driver<I2C>, S> {
    /// Recover calibration if needed, then bring up a BMA250 on `i2c`
    ///
    /// The recovery pass is advisory: a healthy bus reports no recovery
    /// device, and a failed recovery is logged but does not stop bring-up.
    pub fn probe(
        mut i2c: I2C,
        nvs: &mut impl NvStore,
        timer: &mut impl TimerInterface,
        sink: S,
        config: AccelConfig,
    ) -> Result<Self, (AccelError, crate::devices::accel::Bma250Driver<I2C>)> {
        use crate::recovery::{self, RecoveryError, RecoveryOutcome};

        match recovery::run(&mut i2c, nvs, timer) {
            Ok(RecoveryOutcome::Restored) => log_info!("accel: calibration restored"),
            Ok(RecoveryOutcome::BackedUp) => log_info!("accel: calibration backed up"),
            Err(RecoveryError::NoDevice) => {}
            Err(_) => log_warn!("accel: calibration recovery failed"),
        }
        Self::attach(crate::devices::accel::Bma250Driver::new(i2c), sink, config)
    }
}
