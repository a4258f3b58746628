//! Ramen noodle station: lift rise/lower plus the eject slide.
//!
//! Three actuation axes share the mechanism per slot. Eject is asymmetric:
//! slots carrying the `has_state_machine` capability (slot 0 on current
//! hardware) run a three-state eject/return cycle, while the remaining
//! slots are bare motors reined in by the tick-level limit monitor.

use eyre::WrapErr;
use ramen_config::{MAX_RAMEN, PinMap};
use ramen_traits::Hal;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::hal_error::hal;
use crate::setting::Setting;
use crate::state::StationState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EjectState {
    #[default]
    Idle,
    Ejecting,
    Returning,
}

/// Per-slot capabilities, assigned when a configuration is applied.
#[derive(Debug, Clone, Copy, Default)]
pub struct SlotCaps {
    pub has_state_machine: bool,
}

pub struct RamenController {
    eject: [EjectState; MAX_RAMEN],
    caps: [SlotCaps; MAX_RAMEN],
}

impl RamenController {
    pub fn new() -> Self {
        Self {
            eject: [EjectState::Idle; MAX_RAMEN],
            caps: [SlotCaps::default(); MAX_RAMEN],
        }
    }

    /// Assign per-slot capabilities for a freshly applied configuration.
    /// Only the first slot carries the eject state machine.
    pub fn configure(&mut self, count: u8) {
        for (i, caps) in self.caps.iter_mut().enumerate() {
            caps.has_state_machine = i == 0 && count > 0;
        }
    }

    pub fn eject_state(&self, slot: usize) -> EjectState {
        self.eject[slot]
    }

    /// Lift rise: up-motor forward until the presence sensor or the upper
    /// limit fires, whichever comes first.
    pub fn start_rise(
        &mut self,
        h: &dyn Hal,
        pins: &PinMap,
        state: &mut StationState,
        slot: usize,
    ) -> Result<()> {
        info!(slot, "ramen rise start");
        hal(h.write_digital(pins.ramen_up_fwd[slot], true)).wrap_err("lift up on")?;
        state.ramen_up_fwd[slot] = true;
        Ok(())
    }

    /// Lift lower: up-motor reverse until the lower limit fires.
    pub fn start_lower(
        &mut self,
        h: &dyn Hal,
        pins: &PinMap,
        state: &mut StationState,
        slot: usize,
    ) -> Result<()> {
        info!(slot, "ramen lower start");
        hal(h.write_digital(pins.ramen_up_rev[slot], true)).wrap_err("lift down on")?;
        state.ramen_up_rev[slot] = true;
        Ok(())
    }

    /// Eject. On a state-machine slot a start is only honored from Idle;
    /// a busy slot rejects the command with a warning, it is not queued.
    pub fn start_eject(
        &mut self,
        h: &dyn Hal,
        pins: &PinMap,
        state: &mut StationState,
        slot: usize,
    ) -> Result<()> {
        if self.caps[slot].has_state_machine {
            if self.eject[slot] == EjectState::Idle {
                info!(slot, "ramen eject start");
                self.eject[slot] = EjectState::Ejecting;
                hal(h.write_digital(pins.ramen_ej_fwd[slot], true)).wrap_err("eject fwd on")?;
                state.ramen_ej_fwd[slot] = true;
            } else {
                warn!(slot, state = ?self.eject[slot], "eject command ignored, not idle");
            }
        } else {
            info!(slot, "ramen eject start (monitor-only slot)");
            hal(h.write_digital(pins.ramen_ej_fwd[slot], true)).wrap_err("eject fwd on")?;
            state.ramen_ej_fwd[slot] = true;
        }
        Ok(())
    }

    /// Force all four motor outputs off; a state-machine slot also resets
    /// its eject cycle to Idle.
    pub fn stop(
        &mut self,
        h: &dyn Hal,
        pins: &PinMap,
        state: &mut StationState,
        slot: usize,
    ) -> Result<()> {
        info!(slot, "ramen all stop");
        hal(h.write_digital(pins.ramen_up_fwd[slot], false)).wrap_err("lift up off")?;
        hal(h.write_digital(pins.ramen_up_rev[slot], false)).wrap_err("lift down off")?;
        hal(h.write_digital(pins.ramen_ej_fwd[slot], false)).wrap_err("eject fwd off")?;
        hal(h.write_digital(pins.ramen_ej_rev[slot], false)).wrap_err("eject rev off")?;
        state.ramen_up_fwd[slot] = false;
        state.ramen_up_rev[slot] = false;
        state.ramen_ej_fwd[slot] = false;
        state.ramen_ej_rev[slot] = false;
        if self.caps[slot].has_state_machine {
            self.eject[slot] = EjectState::Idle;
        }
        Ok(())
    }

    /// Per-tick advance: rise/lower limit stops, the eject state machine,
    /// and the limit monitor that covers every slot regardless of who
    /// switched the motor on.
    pub fn check(
        &mut self,
        h: &dyn Hal,
        pins: &PinMap,
        current: &Setting,
        state: &mut StationState,
    ) -> Result<()> {
        let count = usize::from(current.ramen);

        for slot in 0..count {
            if state.ramen_up_fwd[slot]
                && (state.ramen_detect[slot] || state.ramen_lift_top[slot])
            {
                debug!(slot, "rise stop");
                hal(h.write_digital(pins.ramen_up_fwd[slot], false)).wrap_err("lift up off")?;
                state.ramen_up_fwd[slot] = false;
            }
            if state.ramen_up_rev[slot] && state.ramen_lift_bottom[slot] {
                debug!(slot, "lower stop");
                hal(h.write_digital(pins.ramen_up_rev[slot], false)).wrap_err("lift down off")?;
                state.ramen_up_rev[slot] = false;
            }
        }

        for slot in 0..count {
            if !self.caps[slot].has_state_machine {
                continue;
            }
            match self.eject[slot] {
                EjectState::Ejecting => {
                    if state.ramen_eject_top[slot] {
                        debug!(slot, "eject top reached, returning");
                        hal(h.write_digital(pins.ramen_ej_fwd[slot], false))
                            .wrap_err("eject fwd off")?;
                        hal(h.write_digital(pins.ramen_ej_rev[slot], true))
                            .wrap_err("eject rev on")?;
                        state.ramen_ej_fwd[slot] = false;
                        state.ramen_ej_rev[slot] = true;
                        self.eject[slot] = EjectState::Returning;
                    }
                }
                EjectState::Returning => {
                    if state.ramen_eject_bottom[slot] {
                        debug!(slot, "eject return complete");
                        hal(h.write_digital(pins.ramen_ej_rev[slot], false))
                            .wrap_err("eject rev off")?;
                        state.ramen_ej_rev[slot] = false;
                        self.eject[slot] = EjectState::Idle;
                    }
                }
                EjectState::Idle => {}
            }
        }

        // Limit monitor for every slot, state machine or not.
        for slot in 0..count {
            if state.ramen_ej_fwd[slot] && state.ramen_eject_top[slot] {
                hal(h.write_digital(pins.ramen_ej_fwd[slot], false)).wrap_err("eject fwd off")?;
                state.ramen_ej_fwd[slot] = false;
            }
            if state.ramen_ej_rev[slot] && state.ramen_eject_bottom[slot] {
                hal(h.write_digital(pins.ramen_ej_rev[slot], false)).wrap_err("eject rev off")?;
                state.ramen_ej_rev[slot] = false;
            }
        }

        Ok(())
    }
}

impl Default for RamenController {
    fn default() -> Self {
        Self::new()
    }
}
