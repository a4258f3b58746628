//! Cup dispenser station.
//!
//! A dispense runs the slot motor until *both* a minimum release interval
//! has elapsed and the dispense-confirm sensor fires. Time alone never
//! stops the motor; the sensor alone never stops it early.

use eyre::WrapErr;
use ramen_config::{MAX_CUP, PinMap};
use ramen_traits::Hal;
use tracing::{debug, info};

use crate::error::Result;
use crate::hal_error::hal;
use crate::setting::Setting;
use crate::state::StationState;

pub struct CupController {
    release_ms: u64,
    /// Lazily recorded the first time the check observes a running motor.
    started_at: [Option<u64>; MAX_CUP],
}

impl CupController {
    pub fn new(release_ms: u64) -> Self {
        Self {
            release_ms,
            started_at: [None; MAX_CUP],
        }
    }

    /// Drive the dispense motor on; completion is the check's job.
    pub fn start(
        &mut self,
        h: &dyn Hal,
        pins: &PinMap,
        state: &mut StationState,
        slot: usize,
    ) -> Result<()> {
        info!(slot, "cup dispense start");
        hal(h.write_digital(pins.cup_motor[slot], true)).wrap_err("cup motor on")?;
        state.cup_motor[slot] = true;
        Ok(())
    }

    /// Force the motor off unconditionally (explicit host command).
    pub fn stop(
        &mut self,
        h: &dyn Hal,
        pins: &PinMap,
        state: &mut StationState,
        slot: usize,
    ) -> Result<()> {
        info!(slot, "cup dispense stop");
        hal(h.write_digital(pins.cup_motor[slot], false)).wrap_err("cup motor off")?;
        state.cup_motor[slot] = false;
        self.started_at[slot] = None;
        Ok(())
    }

    /// Per-tick advance for every active slot. Safe to call when idle.
    pub fn check(
        &mut self,
        h: &dyn Hal,
        pins: &PinMap,
        current: &Setting,
        state: &mut StationState,
        now_ms: u64,
    ) -> Result<()> {
        for slot in 0..usize::from(current.cup) {
            if !state.cup_motor[slot] {
                continue;
            }
            let started = *self.started_at[slot].get_or_insert(now_ms);
            let elapsed = now_ms.saturating_sub(started);
            if elapsed >= self.release_ms && state.cup_confirmed[slot] {
                debug!(slot, elapsed, "cup release complete");
                hal(h.write_digital(pins.cup_motor[slot], false)).wrap_err("cup motor off")?;
                state.cup_motor[slot] = false;
                self.started_at[slot] = None;
            }
        }
        Ok(())
    }
}
