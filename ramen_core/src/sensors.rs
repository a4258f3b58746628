//! Sensor conditioning pipeline: per-tick reads, current smoothing with a
//! deadzone, and time-debounce for presence sensors.
//!
//! Read failures degrade to the last good value with a warning; a flaky
//! sensor line must never take the polling loop down.

use ramen_config::PinMap;
use ramen_traits::Hal;
use tracing::warn;

use crate::loadcell;
use crate::setting::Setting;
use crate::state::StationState;

/// Readings below this are sensor noise; clamp to the baseline.
const AMP_DEADZONE: i32 = 5;

/// Exponential smoothing with integer arithmetic:
/// `filtered = (prev*80 + raw*20) / 100`, truncating. Results inside the
/// deadzone clamp to 0.
pub fn filter_amp(prev: i32, raw: i32) -> i32 {
    let filtered = (i64::from(prev) * 80 + i64::from(raw) * 20) / 100;
    if filtered < i64::from(AMP_DEADZONE) {
        0
    } else {
        filtered as i32
    }
}

/// Time-debounce for one digital channel. The stable state is promoted
/// only once the raw reading has been unchanged for the whole window.
#[derive(Debug, Clone, Copy)]
pub struct Debouncer {
    window_ms: u64,
    raw: bool,
    stable: bool,
    changed_at_ms: u64,
}

impl Debouncer {
    pub fn new(window_ms: u64) -> Self {
        Self {
            window_ms,
            raw: false,
            stable: false,
            changed_at_ms: 0,
        }
    }

    /// Feed one raw sample; returns the debounced state.
    pub fn update(&mut self, raw: bool, now_ms: u64) -> bool {
        if raw != self.raw {
            self.raw = raw;
            self.changed_at_ms = now_ms;
        } else if self.stable != raw && now_ms.saturating_sub(self.changed_at_ms) >= self.window_ms
        {
            self.stable = raw;
        }
        self.stable
    }

    pub fn stable(&self) -> bool {
        self.stable
    }
}

/// Per-tick sensor reader. Owns the debouncers so their timing state
/// survives across ticks.
pub struct SensorPipeline {
    cup_stock: [Debouncer; ramen_config::MAX_CUP],
    ramen_detect: [Debouncer; ramen_config::MAX_RAMEN],
}

impl SensorPipeline {
    pub fn new(debounce_ms: u64) -> Self {
        Self {
            cup_stock: [Debouncer::new(debounce_ms); ramen_config::MAX_CUP],
            ramen_detect: [Debouncer::new(debounce_ms); ramen_config::MAX_RAMEN],
        }
    }

    /// Refresh every input in `state` for the active slots of `current`.
    pub fn read_all(
        &mut self,
        hal: &dyn Hal,
        pins: &PinMap,
        current: &Setting,
        state: &mut StationState,
        now_ms: u64,
    ) {
        for i in 0..usize::from(current.cup) {
            state.cup_amp[i] = analog_or(hal, pins.cup_amp[i], state.cup_amp[i]);
            let stock_raw = digital_or(hal, pins.cup_stock[i], self.cup_stock[i].stable());
            state.cup_stock[i] = self.cup_stock[i].update(stock_raw, now_ms);
            state.cup_turn[i] = digital_or(hal, pins.cup_turn[i], state.cup_turn[i]);
            state.cup_confirmed[i] = digital_or(hal, pins.cup_confirm[i], state.cup_confirmed[i]);
        }

        for i in 0..usize::from(current.ramen) {
            state.ramen_amp[i] = analog_or(hal, pins.ramen_amp[i], state.ramen_amp[i]);
            let detect_raw = digital_or(hal, pins.ramen_detect[i], self.ramen_detect[i].stable());
            state.ramen_detect[i] = self.ramen_detect[i].update(detect_raw, now_ms);
            state.ramen_lift_top[i] = digital_or(hal, pins.ramen_up_top[i], false);
            state.ramen_lift_bottom[i] = digital_or(hal, pins.ramen_up_bottom[i], false);
            state.ramen_eject_top[i] = digital_or(hal, pins.ramen_ej_top[i], false);
            state.ramen_eject_bottom[i] = digital_or(hal, pins.ramen_ej_bottom[i], false);
        }

        for i in 0..usize::from(current.powder) {
            let raw = analog_or(hal, pins.powder_amp[i], state.powder_amp[i]);
            state.powder_amp[i] = filter_amp(state.powder_amp[i], raw);
        }

        for i in 0..usize::from(current.cooker) {
            let raw = analog_or(hal, pins.cooker_amp[i], state.cooker_amp[i]);
            state.cooker_amp[i] = filter_amp(state.cooker_amp[i], raw);
            // Slots >= 2 are externally driven; their induction line is an
            // input and *is* the work indication. Slots 0-1 keep the flag
            // the cooker controller sets.
            if i >= crate::cooker::CONTROLLABLE_SLOTS {
                state.cooker_work[i] = digital_or(hal, pins.cooker_induction[i], false);
            }
        }

        for i in 0..usize::from(current.outlet) {
            state.outlet_amp[i] = analog_or(hal, pins.outlet_amp[i], state.outlet_amp[i]);
            state.outlet_sonar[i] = analog_or(hal, pins.outlet_sonar[i], state.outlet_sonar[i]);
            state.outlet_open[i] = digital_or(hal, pins.outlet_open[i], false);
            state.outlet_closed[i] = digital_or(hal, pins.outlet_close[i], false);
            match loadcell::read(hal, pins.outlet_load_dt[i], pins.outlet_load_sck[i]) {
                Ok(v) => state.outlet_loadcell[i] = v,
                Err(e) => warn!(slot = i, error = %e, "load-cell read failed"),
            }
        }

        state.door_sensor1 = digital_or(hal, pins.door_sensor1, state.door_sensor1);
        state.door_sensor2 = digital_or(hal, pins.door_sensor2, state.door_sensor2);
    }
}

fn analog_or(hal: &dyn Hal, channel: u8, last: i32) -> i32 {
    match hal.read_analog(channel) {
        Ok(v) => v,
        Err(e) => {
            warn!(channel, error = %e, "analog read failed, keeping last value");
            last
        }
    }
}

fn digital_or(hal: &dyn Hal, pin: u8, last: bool) -> bool {
    match hal.read_digital(pin) {
        Ok(v) => v,
        Err(e) => {
            warn!(pin, error = %e, "digital read failed, keeping last value");
            last
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smoothing_matches_integer_formula() {
        assert_eq!(filter_amp(0, 100), 20);
        assert_eq!(filter_amp(20, 100), 36);
        assert_eq!(filter_amp(100, 100), 100);
    }

    #[test]
    fn smoothing_deadzone_clamps_to_zero() {
        assert_eq!(filter_amp(0, 20), 0); // 4 < 5
        assert_eq!(filter_amp(0, 24), 0); // 4.8 truncates to 4
        assert_eq!(filter_amp(0, 25), 5);
    }

    #[test]
    fn debounce_ignores_fast_toggles() {
        let mut d = Debouncer::new(50);
        let mut now = 0;
        for _ in 0..20 {
            now += 10;
            assert!(!d.update(now % 20 == 0, now));
        }
    }

    #[test]
    fn debounce_promotes_after_window_once() {
        let mut d = Debouncer::new(50);
        assert!(!d.update(true, 0));
        assert!(!d.update(true, 49));
        assert!(d.update(true, 50));
        assert!(d.update(true, 1000));
        assert!(d.update(false, 1001));
        assert!(!d.update(false, 1051));
    }
}
