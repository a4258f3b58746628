//! Test doubles for the hardware boundary.
//!
//! `MockHal` is an in-memory pin fabric: tests script sensor levels and
//! ADC values, inspect what the engine wrote, fire edge handlers by hand,
//! and feed canned load-cell conversions that answer the bit-banged
//! clocking protocol. `ManualClock` makes every timing window
//! deterministic. Both live in the library (not `#[cfg(test)]`) so
//! integration tests and downstream crates can drive the engine without
//! hardware.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use ramen_traits::{Clock, EdgeHandler, Hal, HalResult, PinMode};

/// One scripted load-cell conversion: 24 data bits answered MSB-first to
/// clock pulses on the paired sck pin.
#[derive(Debug, Clone, Copy)]
struct LoadcellFrame {
    sck: u8,
    bits: u32,
    pulses: u32,
}

#[derive(Default)]
pub struct MockHal {
    levels: Mutex<HashMap<u8, bool>>,
    analog: Mutex<HashMap<u8, i32>>,
    modes: Mutex<HashMap<u8, PinMode>>,
    handlers: Mutex<Vec<(u8, EdgeHandler)>>,
    frames: Mutex<HashMap<u8, LoadcellFrame>>,
}

impl MockHal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a digital input level.
    pub fn set_input(&self, pin: u8, level: bool) {
        if let Ok(mut levels) = self.levels.lock() {
            levels.insert(pin, level);
        }
    }

    /// Script an ADC channel value.
    pub fn set_analog(&self, channel: u8, value: i32) {
        if let Ok(mut analog) = self.analog.lock() {
            analog.insert(channel, value);
        }
    }

    /// Last level written (or scripted) on a pin.
    pub fn level(&self, pin: u8) -> bool {
        self.levels
            .lock()
            .ok()
            .and_then(|levels| levels.get(&pin).copied())
            .unwrap_or(false)
    }

    /// Mode last applied to a pin, if any.
    pub fn mode(&self, pin: u8) -> Option<PinMode> {
        self.modes
            .lock()
            .ok()
            .and_then(|modes| modes.get(&pin).copied())
    }

    /// Invoke every handler registered on `pin` with its current level.
    pub fn fire_edge(&self, pin: u8) {
        let level = self.level(pin);
        if let Ok(mut handlers) = self.handlers.lock() {
            for (p, handler) in handlers.iter_mut() {
                if *p == pin {
                    handler(level);
                }
            }
        }
    }

    /// Queue one load-cell conversion on a dt/sck pin pair. The dt pin
    /// reads "ready" immediately and answers the given 24 bits to the
    /// next read sequence.
    pub fn feed_loadcell(&self, dt: u8, sck: u8, bits: u32) {
        if let Ok(mut frames) = self.frames.lock() {
            frames.insert(
                dt,
                LoadcellFrame {
                    sck,
                    bits: bits & 0x00FF_FFFF,
                    pulses: 0,
                },
            );
        }
    }
}

impl Hal for MockHal {
    fn set_mode(&self, pin: u8, mode: PinMode) -> HalResult<()> {
        if let Ok(mut modes) = self.modes.lock() {
            modes.insert(pin, mode);
        }
        Ok(())
    }

    fn read_digital(&self, pin: u8) -> HalResult<bool> {
        if let Ok(frames) = self.frames.lock()
            && let Some(frame) = frames.get(&pin)
        {
            return Ok(match frame.pulses {
                // No clock pulses yet: data line low means ready.
                0 => false,
                n @ 1..=24 => (frame.bits >> (24 - n)) & 1 == 1,
                _ => false,
            });
        }
        Ok(self.level(pin))
    }

    fn write_digital(&self, pin: u8, level: bool) -> HalResult<()> {
        if level
            && let Ok(mut frames) = self.frames.lock()
        {
            for frame in frames.values_mut() {
                if frame.sck == pin {
                    frame.pulses += 1;
                }
            }
        }
        if let Ok(mut levels) = self.levels.lock() {
            levels.insert(pin, level);
        }
        Ok(())
    }

    fn read_analog(&self, channel: u8) -> HalResult<i32> {
        Ok(self
            .analog
            .lock()
            .ok()
            .and_then(|analog| analog.get(&channel).copied())
            .unwrap_or(0))
    }

    fn delay_micros(&self, _us: u64) {}

    fn on_edge(&self, pin: u8, handler: EdgeHandler) -> HalResult<()> {
        if let Ok(mut handlers) = self.handlers.lock() {
            handlers.push((pin, handler));
        }
        Ok(())
    }
}

/// Deterministic clock: time only moves when the test says so. `sleep`
/// advances the offset instead of blocking, so paced loops run instantly.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    offset: std::sync::Arc<Mutex<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: std::sync::Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    pub fn advance(&self, d: Duration) {
        if let Ok(mut offset) = self.offset.lock() {
            *offset += d;
        }
    }

    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let offset = self
            .offset
            .lock()
            .map(|o| *o)
            .unwrap_or(Duration::ZERO);
        self.origin + offset
    }

    fn sleep(&self, d: Duration) {
        self.advance(d);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loadcell;

    #[test]
    fn loadcell_frame_answers_the_clocking_protocol() {
        let hal = MockHal::new();
        hal.feed_loadcell(28, 29, 0x00_01_23);
        assert_eq!(loadcell::read(&hal, 28, 29).unwrap(), 0x0123);
    }

    #[test]
    fn loadcell_negative_values_sign_extend() {
        let hal = MockHal::new();
        hal.feed_loadcell(28, 29, 0xFF_FF_FE);
        assert_eq!(loadcell::read(&hal, 28, 29).unwrap(), -2);
    }

    #[test]
    fn loadcell_not_ready_reads_zero() {
        let hal = MockHal::new();
        // dt scripted high with no frame queued: conversion pending.
        hal.set_input(28, true);
        assert_eq!(loadcell::read(&hal, 28, 29).unwrap(), 0);
    }

    #[test]
    fn manual_clock_only_moves_on_advance() {
        let clock = ManualClock::new();
        let epoch = clock.now();
        assert_eq!(clock.ms_since(epoch), 0);
        clock.advance_ms(250);
        assert_eq!(clock.ms_since(epoch), 250);
        clock.sleep(Duration::from_millis(50));
        assert_eq!(clock.ms_since(epoch), 300);
    }

    #[test]
    fn fire_edge_reaches_only_matching_handlers() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicU32, Ordering};

        let hal = MockHal::new();
        let hits = Arc::new(AtomicU32::new(0));
        let h = hits.clone();
        hal.on_edge(2, Box::new(move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        }))
        .unwrap();
        hal.fire_edge(2);
        hal.fire_edge(3);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
