//! Shared per-slot machine state.
//!
//! Arrays are sized to each category's maximum so reconfiguration never
//! reallocates; slots beyond the configured count simply go stale. Written
//! by the sensor pipeline and by controllers reflecting actuator side
//! effects, read by the telemetry publisher.

use ramen_config::{MAX_COOKER, MAX_CUP, MAX_OUTLET, MAX_POWDER, MAX_RAMEN};

#[derive(Debug, Clone)]
pub struct StationState {
    // Cup
    pub cup_amp: [i32; MAX_CUP],
    pub cup_stock: [bool; MAX_CUP],
    /// Rotation sensor, published as the `dispense` field.
    pub cup_turn: [bool; MAX_CUP],
    /// Dispense-confirm sensor; consumed by the release check, not published.
    pub cup_confirmed: [bool; MAX_CUP],
    pub cup_motor: [bool; MAX_CUP],

    // Ramen
    pub ramen_amp: [i32; MAX_RAMEN],
    pub ramen_detect: [bool; MAX_RAMEN],
    pub ramen_lift_top: [bool; MAX_RAMEN],
    pub ramen_lift_bottom: [bool; MAX_RAMEN],
    pub ramen_eject_top: [bool; MAX_RAMEN],
    pub ramen_eject_bottom: [bool; MAX_RAMEN],
    /// Cumulative lift angle in degrees (encoder-derived, slot 0 only).
    pub ramen_lift: [i32; MAX_RAMEN],
    pub ramen_up_fwd: [bool; MAX_RAMEN],
    pub ramen_up_rev: [bool; MAX_RAMEN],
    pub ramen_ej_fwd: [bool; MAX_RAMEN],
    pub ramen_ej_rev: [bool; MAX_RAMEN],

    // Powder
    pub powder_amp: [i32; MAX_POWDER],
    pub powder_motor: [bool; MAX_POWDER],

    // Cooker
    pub cooker_amp: [i32; MAX_COOKER],
    pub cooker_work: [bool; MAX_COOKER],

    // Outlet
    pub outlet_amp: [i32; MAX_OUTLET],
    pub outlet_open: [bool; MAX_OUTLET],
    pub outlet_closed: [bool; MAX_OUTLET],
    pub outlet_sonar: [i32; MAX_OUTLET],
    pub outlet_loadcell: [i32; MAX_OUTLET],
    pub outlet_fwd: [bool; MAX_OUTLET],
    pub outlet_rev: [bool; MAX_OUTLET],

    // Door
    pub door_sensor1: bool,
    pub door_sensor2: bool,
}

impl Default for StationState {
    fn default() -> Self {
        Self {
            cup_amp: [0; MAX_CUP],
            cup_stock: [false; MAX_CUP],
            cup_turn: [false; MAX_CUP],
            cup_confirmed: [false; MAX_CUP],
            cup_motor: [false; MAX_CUP],
            ramen_amp: [0; MAX_RAMEN],
            ramen_detect: [false; MAX_RAMEN],
            ramen_lift_top: [false; MAX_RAMEN],
            ramen_lift_bottom: [false; MAX_RAMEN],
            ramen_eject_top: [false; MAX_RAMEN],
            ramen_eject_bottom: [false; MAX_RAMEN],
            ramen_lift: [0; MAX_RAMEN],
            ramen_up_fwd: [false; MAX_RAMEN],
            ramen_up_rev: [false; MAX_RAMEN],
            ramen_ej_fwd: [false; MAX_RAMEN],
            ramen_ej_rev: [false; MAX_RAMEN],
            powder_amp: [0; MAX_POWDER],
            powder_motor: [false; MAX_POWDER],
            cooker_amp: [0; MAX_COOKER],
            cooker_work: [false; MAX_COOKER],
            outlet_amp: [0; MAX_OUTLET],
            outlet_open: [false; MAX_OUTLET],
            outlet_closed: [false; MAX_OUTLET],
            outlet_sonar: [0; MAX_OUTLET],
            outlet_loadcell: [0; MAX_OUTLET],
            outlet_fwd: [false; MAX_OUTLET],
            outlet_rev: [false; MAX_OUTLET],
            door_sensor1: false,
            door_sensor2: false,
        }
    }
}

impl StationState {
    pub fn new() -> Self {
        Self::default()
    }
}
