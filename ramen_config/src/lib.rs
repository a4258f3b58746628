#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Pin map and engine tunables for the machine controller.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - Defaults reproduce the shipped pin table, so a missing config file
//!   yields a working machine.
//!
//! Digital pins and ADC channels use separate numbering; `*_amp` and
//! `*_sonar` fields are ADC channel indices, everything else is a GPIO pin.

use eyre::WrapErr;
use serde::Deserialize;
use std::path::Path;

/// Maximum slot count per category. Per-slot arrays everywhere are sized
/// to these so reconfiguration never reallocates.
pub const MAX_CUP: usize = 4;
pub const MAX_RAMEN: usize = 4;
pub const MAX_POWDER: usize = 8;
pub const MAX_COOKER: usize = 8;
pub const MAX_OUTLET: usize = 4;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PinMap {
    // Cup station
    pub cup_motor: [u8; MAX_CUP],
    /// Rotation sensor, published as the `dispense` telemetry field.
    pub cup_turn: [u8; MAX_CUP],
    /// Dispense-confirm sensor consumed by the cup release check.
    pub cup_confirm: [u8; MAX_CUP],
    pub cup_stock: [u8; MAX_CUP],
    pub cup_amp: [u8; MAX_CUP],

    // Ramen station: lift axis (up) and eject axis (ej), both reversible.
    pub ramen_up_fwd: [u8; MAX_RAMEN],
    pub ramen_up_rev: [u8; MAX_RAMEN],
    pub ramen_ej_fwd: [u8; MAX_RAMEN],
    pub ramen_ej_rev: [u8; MAX_RAMEN],
    pub ramen_ej_top: [u8; MAX_RAMEN],
    pub ramen_ej_bottom: [u8; MAX_RAMEN],
    pub ramen_up_top: [u8; MAX_RAMEN],
    pub ramen_up_bottom: [u8; MAX_RAMEN],
    pub ramen_detect: [u8; MAX_RAMEN],
    pub ramen_amp: [u8; MAX_RAMEN],

    // Powder station
    pub powder_motor: [u8; MAX_POWDER],
    pub powder_amp: [u8; MAX_POWDER],

    // Cooker station. Slots 0-1 drive these lines; slots >= 2 read them.
    pub cooker_induction: [u8; MAX_COOKER],
    pub cooker_water: [u8; MAX_COOKER],
    pub cooker_amp: [u8; MAX_COOKER],

    // Outlet doors. Load cells are two-wire (data + clock) per slot.
    pub outlet_fwd: [u8; MAX_OUTLET],
    pub outlet_rev: [u8; MAX_OUTLET],
    pub outlet_open: [u8; MAX_OUTLET],
    pub outlet_close: [u8; MAX_OUTLET],
    pub outlet_amp: [u8; MAX_OUTLET],
    pub outlet_sonar: [u8; MAX_OUTLET],
    pub outlet_load_dt: [u8; MAX_OUTLET],
    pub outlet_load_sck: [u8; MAX_OUTLET],

    pub door_sensor1: u8,
    pub door_sensor2: u8,

    pub encoder_a: u8,
    pub encoder_b: u8,
}

impl Default for PinMap {
    fn default() -> Self {
        Self {
            cup_motor: [4, 8, 12, 24],
            cup_turn: [5, 9, 13, 25],
            cup_confirm: [6, 10, 22, 26],
            cup_stock: [7, 11, 23, 27],
            cup_amp: [0, 1, 2, 3],

            ramen_up_fwd: [4, 13, 30, 39],
            ramen_up_rev: [5, 22, 31, 40],
            ramen_ej_fwd: [6, 23, 32, 41],
            ramen_ej_rev: [7, 24, 33, 42],
            ramen_ej_top: [8, 25, 34, 43],
            ramen_ej_bottom: [9, 26, 35, 44],
            ramen_up_top: [10, 27, 36, 45],
            ramen_up_bottom: [11, 28, 37, 46],
            ramen_detect: [12, 29, 38, 47],
            ramen_amp: [1, 3, 5, 7],

            powder_motor: [4, 5, 6, 7, 8, 9, 10, 11],
            powder_amp: [0, 1, 2, 3, 4, 5, 6, 7],

            cooker_induction: [32, 33, 34, 35, 48, 49, 50, 51],
            cooker_water: [36, 37, 38, 39, 52, 53, 54, 55],
            cooker_amp: [6, 7, 8, 9, 10, 11, 12, 13],

            outlet_fwd: [4, 8, 12, 24],
            outlet_rev: [5, 9, 13, 25],
            outlet_open: [6, 10, 22, 26],
            outlet_close: [7, 11, 23, 27],
            outlet_amp: [0, 3, 6, 9],
            outlet_sonar: [2, 5, 8, 11],
            outlet_load_dt: [28, 30, 32, 34],
            outlet_load_sck: [29, 31, 33, 36],

            door_sensor1: 14,
            door_sensor2: 15,

            encoder_a: 2,
            encoder_b: 3,
        }
    }
}

/// Engine tunables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineCfg {
    /// Telemetry cadence in milliseconds.
    pub publish_interval_ms: u64,
    /// Presence-sensor debounce window in milliseconds.
    pub debounce_ms: u64,
    /// Minimum cup motor run before the dispense-confirm sensor is honored.
    pub cup_release_ms: u64,
    /// Polling loop period in milliseconds.
    pub tick_ms: u64,
    /// Encoder counts per revolution (quadrature edges).
    pub encoder_cpr: i64,
}

impl Default for EngineCfg {
    fn default() -> Self {
        Self {
            publish_interval_ms: 100,
            debounce_ms: 50,
            cup_release_ms: 500,
            tick_ms: 10,
            encoder_cpr: 2400,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    /// Console log level ("error","warn","info","debug","trace").
    pub level: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub pins: PinMap,
    pub engine: EngineCfg,
    pub logging: Logging,
}

impl Config {
    /// Load a config from a TOML file. The file must exist; callers that
    /// want defaults-on-missing should check for the path first.
    pub fn load(path: &Path) -> eyre::Result<Self> {
        let text = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("reading config {}", path.display()))?;
        let cfg: Self = toml::from_str(&text)
            .wrap_err_with(|| format!("parsing config {}", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject tunables that would starve or wedge the polling loop.
    pub fn validate(&self) -> eyre::Result<()> {
        let e = &self.engine;
        if e.tick_ms == 0 {
            eyre::bail!("engine.tick_ms must be >= 1");
        }
        if e.publish_interval_ms < e.tick_ms {
            eyre::bail!("engine.publish_interval_ms must be >= engine.tick_ms");
        }
        if e.debounce_ms == 0 {
            eyre::bail!("engine.debounce_ms must be >= 1");
        }
        if e.encoder_cpr <= 0 {
            eyre::bail!("engine.encoder_cpr must be positive");
        }
        if self.pins.encoder_a == self.pins.encoder_b {
            eyre::bail!("encoder_a and encoder_b must be distinct pins");
        }
        for (i, (dt, sck)) in self
            .pins
            .outlet_load_dt
            .iter()
            .zip(self.pins.outlet_load_sck.iter())
            .enumerate()
        {
            if dt == sck {
                eyre::bail!("outlet_load_dt/sck pair {i} must be distinct pins");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn empty_toml_is_defaults() {
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg.engine.publish_interval_ms, 100);
        assert_eq!(cfg.engine.debounce_ms, 50);
        assert_eq!(cfg.pins.cup_motor, [4, 8, 12, 24]);
    }
}
