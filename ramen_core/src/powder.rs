//! Soup-base (powder) dispensers: timed motor runs.

use eyre::WrapErr;
use ramen_config::{MAX_POWDER, PinMap};
use ramen_traits::Hal;
use tracing::{debug, info};

use crate::error::Result;
use crate::hal_error::hal;
use crate::setting::Setting;
use crate::state::StationState;

pub struct PowderController {
    dispensing: [bool; MAX_POWDER],
    started_at_ms: [u64; MAX_POWDER],
    duration_ms: [u64; MAX_POWDER],
}

impl PowderController {
    pub fn new() -> Self {
        Self {
            dispensing: [false; MAX_POWDER],
            started_at_ms: [0; MAX_POWDER],
            duration_ms: [0; MAX_POWDER],
        }
    }

    pub fn is_dispensing(&self, slot: usize) -> bool {
        self.dispensing[slot]
    }

    /// Begin a timed dispense. A slot already dispensing keeps its original
    /// start time and duration; the repeat start is a no-op, not an error.
    /// The dispatcher guarantees `duration_ms > 0`.
    pub fn start(
        &mut self,
        h: &dyn Hal,
        pins: &PinMap,
        state: &mut StationState,
        slot: usize,
        duration_ms: u64,
        now_ms: u64,
    ) -> Result<()> {
        if self.dispensing[slot] {
            debug!(slot, "powder already dispensing, start ignored");
            return Ok(());
        }
        info!(slot, duration_ms, "powder dispense start");
        self.dispensing[slot] = true;
        self.started_at_ms[slot] = now_ms;
        self.duration_ms[slot] = duration_ms;
        hal(h.write_digital(pins.powder_motor[slot], true)).wrap_err("powder motor on")?;
        state.powder_motor[slot] = true;
        Ok(())
    }

    /// Force the motor off and clear the in-progress record.
    pub fn stop(
        &mut self,
        h: &dyn Hal,
        pins: &PinMap,
        state: &mut StationState,
        slot: usize,
    ) -> Result<()> {
        info!(slot, "powder dispense stop");
        hal(h.write_digital(pins.powder_motor[slot], false)).wrap_err("powder motor off")?;
        state.powder_motor[slot] = false;
        self.dispensing[slot] = false;
        Ok(())
    }

    /// Per-tick advance: stop each in-progress slot once its recorded
    /// duration has elapsed.
    pub fn check(
        &mut self,
        h: &dyn Hal,
        pins: &PinMap,
        current: &Setting,
        state: &mut StationState,
        now_ms: u64,
    ) -> Result<()> {
        for slot in 0..usize::from(current.powder) {
            if self.dispensing[slot]
                && now_ms.saturating_sub(self.started_at_ms[slot]) >= self.duration_ms[slot]
            {
                info!(slot, "powder dispense complete");
                hal(h.write_digital(pins.powder_motor[slot], false))
                    .wrap_err("powder motor off")?;
                state.powder_motor[slot] = false;
                self.dispensing[slot] = false;
            }
        }
        Ok(())
    }
}

impl Default for PowderController {
    fn default() -> Self {
        Self::new()
    }
}
