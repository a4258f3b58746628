//! Outlet doors: open/close between limit switches.

use eyre::WrapErr;
use ramen_config::PinMap;
use ramen_traits::Hal;
use tracing::{debug, info};

use crate::error::Result;
use crate::hal_error::hal;
use crate::setting::Setting;
use crate::state::StationState;

pub struct OutletController;

impl OutletController {
    pub fn new() -> Self {
        Self
    }

    /// Open: make sure reverse is released before driving forward.
    pub fn open(
        &mut self,
        h: &dyn Hal,
        pins: &PinMap,
        state: &mut StationState,
        slot: usize,
    ) -> Result<()> {
        info!(slot, "outlet open start");
        hal(h.write_digital(pins.outlet_rev[slot], false)).wrap_err("outlet rev off")?;
        hal(h.write_digital(pins.outlet_fwd[slot], true)).wrap_err("outlet fwd on")?;
        state.outlet_rev[slot] = false;
        state.outlet_fwd[slot] = true;
        Ok(())
    }

    /// Close: mirror image of open.
    pub fn close(
        &mut self,
        h: &dyn Hal,
        pins: &PinMap,
        state: &mut StationState,
        slot: usize,
    ) -> Result<()> {
        info!(slot, "outlet close start");
        hal(h.write_digital(pins.outlet_fwd[slot], false)).wrap_err("outlet fwd off")?;
        hal(h.write_digital(pins.outlet_rev[slot], true)).wrap_err("outlet rev on")?;
        state.outlet_fwd[slot] = false;
        state.outlet_rev[slot] = true;
        Ok(())
    }

    /// Force both directions off.
    pub fn stop(
        &mut self,
        h: &dyn Hal,
        pins: &PinMap,
        state: &mut StationState,
        slot: usize,
    ) -> Result<()> {
        info!(slot, "outlet stop");
        hal(h.write_digital(pins.outlet_fwd[slot], false)).wrap_err("outlet fwd off")?;
        hal(h.write_digital(pins.outlet_rev[slot], false)).wrap_err("outlet rev off")?;
        state.outlet_fwd[slot] = false;
        state.outlet_rev[slot] = false;
        Ok(())
    }

    /// Per-tick advance: release each direction at its limit switch.
    pub fn check(
        &mut self,
        h: &dyn Hal,
        pins: &PinMap,
        current: &Setting,
        state: &mut StationState,
    ) -> Result<()> {
        for slot in 0..usize::from(current.outlet) {
            if state.outlet_fwd[slot] && state.outlet_open[slot] {
                debug!(slot, "outlet open complete");
                hal(h.write_digital(pins.outlet_fwd[slot], false)).wrap_err("outlet fwd off")?;
                state.outlet_fwd[slot] = false;
            }
            if state.outlet_rev[slot] && state.outlet_closed[slot] {
                debug!(slot, "outlet close complete");
                hal(h.write_digital(pins.outlet_rev[slot], false)).wrap_err("outlet rev off")?;
                state.outlet_rev[slot] = false;
            }
        }
        Ok(())
    }
}

impl Default for OutletController {
    fn default() -> Self {
        Self::new()
    }
}
