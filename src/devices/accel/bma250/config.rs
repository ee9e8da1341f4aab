//! BMA250 configuration tables
//!
//! Delay quantization against the chip's output data rates, count-to-SI
//! scaling, and the mounting-position remap table.

use super::registers::{
    BW_1000HZ, BW_125HZ, BW_15_63HZ, BW_250HZ, BW_31_25HZ, BW_500HZ, BW_62_50HZ, BW_7_81HZ,
};
use nalgebra::Vector3;

/// Standard gravity in micro-m/s^2
pub const GRAVITY_UM_S2: i32 = 9_806_550;

/// Sensor counts per g at +/-2g range (10-bit output)
pub const COUNTS_PER_G: i32 = 256;

/// Sampling intervals the chip can honor, fastest first
///
/// Each entry is (effective interval in ms, bandwidth register value).
pub const ODR_TABLE: [(u32, u8); 8] = [
    (1, BW_1000HZ),
    (2, BW_500HZ),
    (4, BW_250HZ),
    (8, BW_125HZ),
    (16, BW_62_50HZ),
    (32, BW_31_25HZ),
    (64, BW_15_63HZ),
    (128, BW_7_81HZ),
];

/// Quantize a requested interval to the chip's supported set
///
/// Picks the slowest supported interval that does not exceed the request,
/// treating a request of 0 as 1 ms. Returns the effective interval and the
/// bandwidth register value that produces it.
pub fn quantize_delay(requested_ms: u32) -> (u32, u8) {
    let target = requested_ms.max(1);
    let mut chosen = ODR_TABLE[0];
    for entry in ODR_TABLE.iter() {
        if entry.0 <= target {
            chosen = *entry;
        } else {
            break;
        }
    }
    chosen
}

/// Convert remapped counts to micro-m/s^2
pub fn scale_counts(raw: Vector3<i32>) -> Vector3<i32> {
    raw.map(|c| {
        // i32 math overflows at ~219 counts; widen through i64.
        (i64::from(c) * i64::from(GRAVITY_UM_S2) / i64::from(COUNTS_PER_G)) as i32
    })
}

/// Mounting-position remap table
///
/// Entry `p` maps chip axes to board axes for position `p`: each of the
/// three output axes is (source chip axis, sign). Positions 0..=3 are the
/// four flat rotations, 4..=7 the same rotations with the board flipped.
const POSITION_MAP: [[(usize, i32); 3]; 8] = [
    [(0, 1), (1, 1), (2, 1)],
    [(1, 1), (0, -1), (2, 1)],
    [(0, -1), (1, -1), (2, 1)],
    [(1, -1), (0, 1), (2, 1)],
    [(0, -1), (1, 1), (2, -1)],
    [(1, 1), (0, 1), (2, -1)],
    [(0, 1), (1, -1), (2, -1)],
    [(1, -1), (0, -1), (2, -1)],
];

/// Apply the mounting-position remap for `position` to chip-frame counts
pub fn remap(chip: Vector3<i32>, position: u8) -> Vector3<i32> {
    let map = &POSITION_MAP[position as usize];
    Vector3::new(
        chip[map[0].0] * map[0].1,
        chip[map[1].0] * map[1].1,
        chip[map[2].0] * map[2].1,
    )
}
