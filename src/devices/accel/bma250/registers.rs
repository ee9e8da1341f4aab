//! BMA250 register definitions

/// Default I2C address (SDO low)
pub const BMA250_ADDR: u8 = 0x18;

/// Chip ID register
pub const REG_CHIP_ID: u8 = 0x00;
/// Expected chip ID value
pub const CHIP_ID_VALUE: u8 = 0x03;

/// First acceleration data register (X LSB); X/Y/Z pairs are consecutive
pub const REG_ACC_X_LSB: u8 = 0x02;

/// G-range selection register
pub const REG_RANGE: u8 = 0x0F;
/// +/-2g range
pub const RANGE_2G: u8 = 0x03;

/// Bandwidth selection register
pub const REG_BANDWIDTH: u8 = 0x10;
/// 7.81 Hz bandwidth
pub const BW_7_81HZ: u8 = 0x08;
/// 15.63 Hz bandwidth
pub const BW_15_63HZ: u8 = 0x09;
/// 31.25 Hz bandwidth
pub const BW_31_25HZ: u8 = 0x0A;
/// 62.5 Hz bandwidth
pub const BW_62_50HZ: u8 = 0x0B;
/// 125 Hz bandwidth
pub const BW_125HZ: u8 = 0x0C;
/// 250 Hz bandwidth
pub const BW_250HZ: u8 = 0x0D;
/// 500 Hz bandwidth
pub const BW_500HZ: u8 = 0x0E;
/// 1000 Hz bandwidth
pub const BW_1000HZ: u8 = 0x0F;

/// Power mode register
pub const REG_POWER: u8 = 0x11;
/// Normal operation
pub const POWER_NORMAL: u8 = 0x00;
/// Suspend mode
pub const POWER_SUSPEND: u8 = 0x80;

/// One past the last readable register
pub const REGISTER_WINDOW: u8 = 0x40;
