//! Mock accelerometer for testing the polling layer
//!
//! Scripted [`AccelSensor`] implementation: tests choose the next sample or
//! inject failures, and read back call counters to verify how the polling
//! layer drives its sensor.

use crate::devices::traits::{AccelError, AccelSample, AccelSensor, FilterConfig, POSITION_COUNT};
use nalgebra::Vector3;

/// Mock accelerometer implementation
#[derive(Debug, Default)]
pub struct MockAccel {
    initialized: bool,
    enabled: bool,
    delay_ms: u32,
    position: u8,
    offset: Vector3<i32>,
    filter: FilterConfig,
    next_raw: Vector3<i32>,
    next_xyz: Vector3<i32>,
    fail_init: bool,
    fail_measure: bool,
    fail_set_position: bool,
    init_count: u32,
    term_count: u32,
    measure_count: u32,
    enable_writes: u32,
}

impl MockAccel {
    pub fn new() -> Self {
        Self {
            delay_ms: 1,
            ..Self::default()
        }
    }

    /// Script the sample returned by subsequent `measure` calls
    pub fn set_next_sample(&mut self, raw: Vector3<i32>, xyz: Vector3<i32>) {
        self.next_raw = raw;
        self.next_xyz = xyz;
    }

    /// Make `init` fail with `WrongChip`
    pub fn set_fail_init(&mut self, fail: bool) {
        self.fail_init = fail;
    }

    /// Make `measure` fail with a transport error
    pub fn set_fail_measure(&mut self, fail: bool) {
        self.fail_measure = fail;
    }

    /// Make `set_position` fail with `InvalidArgument`
    pub fn set_fail_set_position(&mut self, fail: bool) {
        self.fail_set_position = fail;
    }

    pub fn init_count(&self) -> u32 {
        self.init_count
    }

    pub fn term_count(&self) -> u32 {
        self.term_count
    }

    pub fn measure_count(&self) -> u32 {
        self.measure_count
    }

    /// Number of enable-state transitions actually applied
    pub fn enable_writes(&self) -> u32 {
        self.enable_writes
    }
}

impl AccelSensor for MockAccel {
    fn init(&mut self) -> Result<(), AccelError> {
        self.init_count += 1;
        if self.fail_init {
            return Err(AccelError::WrongChip);
        }
        self.initialized = true;
        Ok(())
    }

    fn term(&mut self) -> Result<(), AccelError> {
        self.term_count += 1;
        self.initialized = false;
        self.enabled = false;
        Ok(())
    }

    fn set_enable(&mut self, enable: bool) -> Result<(), AccelError> {
        if !self.initialized {
            return Err(AccelError::NotInitialized);
        }
        if enable != self.enabled {
            self.enabled = enable;
            self.enable_writes += 1;
        }
        Ok(())
    }

    fn enable(&self) -> bool {
        self.enabled
    }

    fn set_delay(&mut self, delay_ms: u32) -> Result<(), AccelError> {
        self.delay_ms = delay_ms.max(1);
        Ok(())
    }

    fn delay(&self) -> u32 {
        self.delay_ms
    }

    fn set_position(&mut self, position: u8) -> Result<(), AccelError> {
        if self.fail_set_position || position >= POSITION_COUNT {
            return Err(AccelError::InvalidArgument);
        }
        self.position = position;
        Ok(())
    }

    fn position(&self) -> u8 {
        self.position
    }

    fn set_offset(&mut self, offset: Vector3<i32>) {
        self.offset = offset;
    }

    fn offset(&self) -> Vector3<i32> {
        self.offset
    }

    fn set_filter(&mut self, filter: FilterConfig) {
        self.filter = filter;
    }

    fn filter(&self) -> FilterConfig {
        self.filter
    }

    fn measure(&mut self, timestamp_us: u64) -> Result<AccelSample, AccelError> {
        if !self.initialized {
            return Err(AccelError::NotInitialized);
        }
        self.measure_count += 1;
        if self.fail_measure {
            return Err(AccelError::Transport(
                crate::platform::error::I2cError::Nack,
            ));
        }
        Ok(AccelSample {
            raw: self.next_raw,
            xyz: self.next_xyz,
            timestamp_us,
        })
    }

    fn register(&mut self, addr: u8) -> Result<u8, AccelError> {
        Ok(addr)
    }
}
