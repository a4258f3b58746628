//! Two-wire bit-banged load-cell amplifier read.
//!
//! 24 data bits are clocked out MSB-first, sampled at the falling edge of
//! each clock pulse, followed by one extra pulse that selects the fixed
//! gain for the next conversion. The 24-bit result is two's-complement.

use ramen_traits::{Hal, HalResult};

const DATA_BITS: u32 = 24;
const SIGN_BIT: i32 = 0x80_0000;

/// Read one conversion. A data line reading "not ready" aborts with 0
/// rather than blocking the tick.
pub fn read(hal: &dyn Hal, dt: u8, sck: u8) -> HalResult<i32> {
    if hal.read_digital(dt)? {
        // Data line high: conversion not ready.
        return Ok(0);
    }

    let mut value: i32 = 0;
    for _ in 0..DATA_BITS {
        hal.write_digital(sck, true)?;
        hal.delay_micros(1);
        let bit = hal.read_digital(dt)?;
        hal.write_digital(sck, false)?;
        hal.delay_micros(1);
        value = (value << 1) | i32::from(bit);
    }

    // Extra pulse: gain select for the next conversion.
    hal.write_digital(sck, true)?;
    hal.delay_micros(1);
    hal.write_digital(sck, false)?;

    if value & SIGN_BIT != 0 {
        value |= !0x00FF_FFFF;
    }
    Ok(value)
}
