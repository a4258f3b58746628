//! Induction cooker station.
//!
//! Only the first two slots are driven; their water-valve and
//! induction-enable lines switch together. Slots beyond that are
//! externally controlled cookers we merely observe, so their signal lines
//! are inputs. The host's `water`/`timer` parameters are accepted and
//! logged but drive no stop condition; cooking runs until `stopcook`.

use eyre::WrapErr;
use ramen_config::PinMap;
use ramen_traits::Hal;
use tracing::info;

use crate::error::Result;
use crate::hal_error::hal;
use crate::state::StationState;

/// Slots below this bound own their signal lines as outputs.
pub const CONTROLLABLE_SLOTS: usize = 2;

pub struct CookerController;

impl CookerController {
    pub fn new() -> Self {
        Self
    }

    pub fn start(
        &mut self,
        h: &dyn Hal,
        pins: &PinMap,
        state: &mut StationState,
        slot: usize,
        water: i64,
        timer: i64,
    ) -> Result<()> {
        info!(slot, water, timer, "cook start");
        if slot < CONTROLLABLE_SLOTS {
            hal(h.write_digital(pins.cooker_water[slot], true)).wrap_err("water valve on")?;
            hal(h.write_digital(pins.cooker_induction[slot], true)).wrap_err("induction on")?;
            state.cooker_work[slot] = true;
        }
        Ok(())
    }

    pub fn stop(
        &mut self,
        h: &dyn Hal,
        pins: &PinMap,
        state: &mut StationState,
        slot: usize,
    ) -> Result<()> {
        info!(slot, "cook stop");
        if slot < CONTROLLABLE_SLOTS {
            hal(h.write_digital(pins.cooker_water[slot], false)).wrap_err("water valve off")?;
            hal(h.write_digital(pins.cooker_induction[slot], false)).wrap_err("induction off")?;
            state.cooker_work[slot] = false;
        }
        Ok(())
    }
}

impl Default for CookerController {
    fn default() -> Self {
        Self::new()
    }
}
