//! Mock I2C implementation for testing
//!
//! Simulates a register-oriented bus: each simulated device is a flat
//! register image addressed by the first written byte. All transactions are
//! logged for test verification, and whole-bus failure can be injected to
//! exercise transport error paths.

use crate::platform::{error::I2cError, traits::I2cInterface, PlatformError, Result};
use core::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::vec::Vec;

/// Size of each simulated register file
const REGISTER_SPACE: usize = 0x40;

/// I2C transaction type for logging
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum I2cTransaction {
    /// Write transaction
    Write { addr: u8, data: Vec<u8> },
    /// Read transaction
    Read { addr: u8, len: usize },
    /// Write-Read transaction
    WriteRead {
        addr: u8,
        write_data: Vec<u8>,
        read_len: usize,
    },
}

impl I2cTransaction {
    fn addr(&self) -> u8 {
        match self {
            I2cTransaction::Write { addr, .. } => *addr,
            I2cTransaction::Read { addr, .. } => *addr,
            I2cTransaction::WriteRead { addr, .. } => *addr,
        }
    }
}

#[derive(Debug, Default)]
struct BusState {
    devices: BTreeMap<u8, [u8; REGISTER_SPACE]>,
    transactions: Vec<I2cTransaction>,
    fail_all: bool,
}

/// Mock I2C implementation
///
/// Clones share the same simulated bus, so a test can keep a handle for
/// inspection while a driver owns another.
#[derive(Debug, Clone, Default)]
pub struct MockI2c {
    bus: Rc<RefCell<BusState>>,
}

impl MockI2c {
    /// Create a new mock bus with no devices attached
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a simulated device at `addr` with an all-zero register file
    pub fn add_device(&mut self, addr: u8) {
        self.bus
            .borrow_mut()
            .devices
            .insert(addr, [0u8; REGISTER_SPACE]);
    }

    /// Set a single register of a simulated device
    ///
    /// The device is attached first if it was not present.
    pub fn set_register(&mut self, addr: u8, reg: u8, value: u8) {
        let mut bus = self.bus.borrow_mut();
        let regs = bus.devices.entry(addr).or_insert([0u8; REGISTER_SPACE]);
        regs[reg as usize] = value;
    }

    /// Load consecutive registers of a simulated device starting at `base`
    pub fn load_registers(&mut self, addr: u8, base: u8, values: &[u8]) {
        let mut bus = self.bus.borrow_mut();
        let regs = bus.devices.entry(addr).or_insert([0u8; REGISTER_SPACE]);
        regs[base as usize..base as usize + values.len()].copy_from_slice(values);
    }

    /// Read back a register of a simulated device (for test verification)
    pub fn register(&self, addr: u8, reg: u8) -> u8 {
        self.bus.borrow().devices[&addr][reg as usize]
    }

    /// Fail every transaction on the bus (for transport-error testing)
    pub fn set_fail_all(&mut self, fail: bool) {
        self.bus.borrow_mut().fail_all = fail;
    }

    /// Get transaction log (for test verification)
    pub fn transactions(&self) -> Vec<I2cTransaction> {
        self.bus.borrow().transactions.clone()
    }

    /// Clear transaction log
    pub fn clear_transactions(&mut self) {
        self.bus.borrow_mut().transactions.clear();
    }

    /// Device addresses touched by any transaction, deduplicated, in first-use order
    pub fn probed_addresses(&self) -> Vec<u8> {
        let bus = self.bus.borrow();
        let mut seen = Vec::new();
        for t in &bus.transactions {
            if !seen.contains(&t.addr()) {
                seen.push(t.addr());
            }
        }
        seen
    }

    fn nack() -> PlatformError {
        PlatformError::I2c(I2cError::Nack)
    }
}

impl I2cInterface for MockI2c {
    fn write(&mut self, addr: u8, data: &[u8]) -> Result<()> {
        let mut bus = self.bus.borrow_mut();
        bus.transactions.push(I2cTransaction::Write {
            addr,
            data: data.to_vec(),
        });
        if bus.fail_all {
            return Err(PlatformError::I2c(I2cError::BusError));
        }
        let regs = bus.devices.get_mut(&addr).ok_or_else(Self::nack)?;
        if let Some((reg, payload)) = data.split_first() {
            for (i, byte) in payload.iter().enumerate() {
                regs[*reg as usize + i] = *byte;
            }
        }
        Ok(())
    }

    fn read(&mut self, addr: u8, buffer: &mut [u8]) -> Result<()> {
        let mut bus = self.bus.borrow_mut();
        bus.transactions.push(I2cTransaction::Read {
            addr,
            len: buffer.len(),
        });
        if bus.fail_all {
            return Err(PlatformError::I2c(I2cError::BusError));
        }
        let regs = bus.devices.get(&addr).ok_or_else(Self::nack)?;
        buffer.copy_from_slice(&regs[..buffer.len()]);
        Ok(())
    }

    fn write_read(&mut self, addr: u8, write_data: &[u8], read_buffer: &mut [u8]) -> Result<()> {
        let mut bus = self.bus.borrow_mut();
        bus.transactions.push(I2cTransaction::WriteRead {
            addr,
            write_data: write_data.to_vec(),
            read_len: read_buffer.len(),
        });
        if bus.fail_all {
            return Err(PlatformError::I2c(I2cError::BusError));
        }
        let regs = bus.devices.get(&addr).ok_or_else(Self::nack)?;
        let reg = write_data[0] as usize;
        read_buffer.copy_from_slice(&regs[reg..reg + read_buffer.len()]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_write_and_readback() {
        let mut i2c = MockI2c::new();
        i2c.add_device(0x18);
        i2c.write(0x18, &[0x10, 0x08, 0x09]).unwrap();

        assert_eq!(i2c.register(0x18, 0x10), 0x08);
        assert_eq!(i2c.register(0x18, 0x11), 0x09);
    }

    #[test]
    fn test_write_read_returns_register_window() {
        let mut i2c = MockI2c::new();
        i2c.add_device(0x18);
        i2c.load_registers(0x18, 0x02, &[0x40, 0x01, 0x80, 0x02]);

        let mut buf = [0u8; 4];
        i2c.write_read(0x18, &[0x02], &mut buf).unwrap();
        assert_eq!(buf, [0x40, 0x01, 0x80, 0x02]);
    }

    #[test]
    fn test_missing_device_nacks() {
        let mut i2c = MockI2c::new();
        let mut buf = [0u8; 1];
        assert_eq!(
            i2c.write_read(0x42, &[0x00], &mut buf),
            Err(PlatformError::I2c(I2cError::Nack))
        );
    }

    #[test]
    fn test_fail_all_injects_bus_error() {
        let mut i2c = MockI2c::new();
        i2c.add_device(0x18);
        i2c.set_fail_all(true);
        assert_eq!(
            i2c.write(0x18, &[0x00, 0x01]),
            Err(PlatformError::I2c(I2cError::BusError))
        );
    }

    #[test]
    fn test_transaction_log_and_probed_addresses() {
        let mut i2c = MockI2c::new();
        i2c.add_device(0x18);
        let mut buf = [0u8; 1];
        let _ = i2c.write_read(0x10, &[0x00], &mut buf);
        let _ = i2c.write_read(0x18, &[0x00], &mut buf);
        let _ = i2c.write_read(0x18, &[0x05], &mut buf);

        assert_eq!(i2c.transactions().len(), 3);
        assert_eq!(i2c.probed_addresses(), vec![0x10, 0x18]);
    }

    #[test]
    fn test_clones_share_bus() {
        let mut a = MockI2c::new();
        let b = a.clone();
        a.add_device(0x18);
        a.write(0x18, &[0x0F, 0x03]).unwrap();
        assert_eq!(b.register(0x18, 0x0F), 0x03);
    }
}
