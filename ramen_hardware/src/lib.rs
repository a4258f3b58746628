#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! HAL implementations for the machine controller.
//!
//! `SimulatedHal` is always available and backs the default build; the
//! `hardware` feature adds a Raspberry Pi GPIO backend via `rppal`.

pub mod error;
#[cfg(feature = "hardware")]
pub mod rpi;

use std::collections::HashMap;
use std::sync::Mutex;

use ramen_traits::{EdgeHandler, Hal, HalResult, PinMode};
use tracing::debug;

/// In-memory HAL. Inputs and ADC channels read whatever was last injected
/// with `set_input`/`set_analog`; outputs are readable back via `output`.
#[derive(Default)]
pub struct SimulatedHal {
    levels: Mutex<HashMap<u8, bool>>,
    analog: Mutex<HashMap<u8, i32>>,
    modes: Mutex<HashMap<u8, PinMode>>,
    handlers: Mutex<Vec<(u8, EdgeHandler)>>,
}

impl SimulatedHal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inject a digital input level.
    pub fn set_input(&self, pin: u8, level: bool) {
        if let Ok(mut levels) = self.levels.lock() {
            levels.insert(pin, level);
        }
    }

    /// Inject an ADC channel reading.
    pub fn set_analog(&self, channel: u8, value: i32) {
        if let Ok(mut analog) = self.analog.lock() {
            analog.insert(channel, value);
        }
    }

    /// Last level written (or injected) on a pin.
    pub fn output(&self, pin: u8) -> bool {
        self.levels
            .lock()
            .map(|l| l.get(&pin).copied().unwrap_or(false))
            .unwrap_or(false)
    }

    /// Invoke every handler registered on `pin` with its current level,
    /// as a real edge interrupt would.
    pub fn trigger_edge(&self, pin: u8) {
        let level = self.output(pin);
        if let Ok(mut handlers) = self.handlers.lock() {
            for (p, h) in handlers.iter_mut() {
                if *p == pin {
                    h(level);
                }
            }
        }
    }
}

impl Hal for SimulatedHal {
    fn set_mode(&self, pin: u8, mode: PinMode) -> HalResult<()> {
        debug!(pin, ?mode, "sim pin mode");
        if let Ok(mut modes) = self.modes.lock() {
            modes.insert(pin, mode);
        }
        Ok(())
    }

    fn read_digital(&self, pin: u8) -> HalResult<bool> {
        Ok(self.output(pin))
    }

    fn write_digital(&self, pin: u8, level: bool) -> HalResult<()> {
        debug!(pin, level, "sim pin write");
        self.set_input(pin, level);
        Ok(())
    }

    fn read_analog(&self, channel: u8) -> HalResult<i32> {
        Ok(self
            .analog
            .lock()
            .map(|a| a.get(&channel).copied().unwrap_or(0))
            .unwrap_or(0))
    }

    fn delay_micros(&self, _us: u64) {
        // Simulated bit-bang timing needs no real delay.
    }

    fn on_edge(&self, pin: u8, handler: EdgeHandler) -> HalResult<()> {
        debug!(pin, "sim edge handler registered");
        if let Ok(mut handlers) = self.handlers.lock() {
            handlers.push((pin, handler));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outputs_read_back() {
        let hal = SimulatedHal::new();
        hal.write_digital(7, true).unwrap();
        assert!(hal.read_digital(7).unwrap());
        assert!(!hal.read_digital(8).unwrap());
    }

    #[test]
    fn edges_fire_registered_handlers() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicU32, Ordering};

        let hal = SimulatedHal::new();
        let hits = Arc::new(AtomicU32::new(0));
        let hits2 = hits.clone();
        hal.on_edge(
            2,
            Box::new(move |_level| {
                hits2.fetch_add(1, Ordering::Relaxed);
            }),
        )
        .unwrap();
        hal.trigger_edge(2);
        hal.trigger_edge(3);
        hal.trigger_edge(2);
        assert_eq!(hits.load(Ordering::Relaxed), 2);
    }
}
