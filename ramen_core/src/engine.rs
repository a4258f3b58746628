//! The machine context: every station controller, the sensor pipeline and
//! the live configuration behind one polling surface.
//!
//! The owning loop calls `handle_line` for each inbound command and
//! `tick` once per period; nothing in here blocks. Time is milliseconds
//! since a fixed epoch taken from the injected `Clock`, so tests drive
//! the whole engine with a manual clock.

use std::sync::Arc;
use std::time::Instant;

use ramen_config::{EngineCfg, PinMap};
use ramen_traits::{Clock, Hal, PinMode};
use tracing::{info, warn};

use crate::cooker::{CONTROLLABLE_SLOTS, CookerController};
use crate::cup::CupController;
use crate::dispatch::{
    Command, CookerCmd, CupCmd, OutletCmd, PowderCmd, RamenCmd, parse_line,
};
use crate::encoder::EncoderMonitor;
use crate::error::Result;
use crate::hal_error::hal;
use crate::outlet::OutletController;
use crate::powder::PowderController;
use crate::protocol::{ErrorReply, setting_line};
use crate::ramen::{EjectState, RamenController};
use crate::sensors::SensorPipeline;
use crate::setting::Setting;
use crate::state::StationState;
use crate::telemetry;

pub struct Machine {
    hal: Arc<dyn Hal>,
    clock: Arc<dyn Clock + Send + Sync>,
    epoch: Instant,
    pins: PinMap,
    cfg: EngineCfg,

    current: Setting,
    state: StationState,
    sensors: SensorPipeline,

    cup: CupController,
    ramen: RamenController,
    powder: PowderController,
    cooker: CookerController,
    outlet: OutletController,

    encoder: Option<EncoderMonitor>,
    last_publish_ms: u64,
}

impl Machine {
    pub fn new(
        hal: Arc<dyn Hal>,
        clock: Arc<dyn Clock + Send + Sync>,
        pins: PinMap,
        cfg: EngineCfg,
    ) -> Self {
        let epoch = clock.now();
        let sensors = SensorPipeline::new(cfg.debounce_ms);
        let cup = CupController::new(cfg.cup_release_ms);
        Self {
            hal,
            clock,
            epoch,
            pins,
            cfg,
            current: Setting::default(),
            state: StationState::default(),
            sensors,
            cup,
            ramen: RamenController::new(),
            powder: PowderController::new(),
            cooker: CookerController::new(),
            outlet: OutletController::new(),
            encoder: None,
            last_publish_ms: 0,
        }
    }

    /// Milliseconds since engine start on the injected clock.
    pub fn now_ms(&self) -> u64 {
        self.clock.ms_since(self.epoch)
    }

    /// Wire up the quadrature encoder on its two interrupt pins. Optional:
    /// an engine without an encoder simply publishes a zero lift angle.
    pub fn attach_encoder(&mut self) -> Result<()> {
        hal(self.hal.set_mode(self.pins.encoder_a, PinMode::InputPullup))?;
        hal(self.hal.set_mode(self.pins.encoder_b, PinMode::InputPullup))?;
        let monitor = EncoderMonitor::attach(
            &self.hal,
            self.pins.encoder_a,
            self.pins.encoder_b,
            self.cfg.encoder_cpr,
            self.cfg.publish_interval_ms,
        )?;
        self.encoder = Some(monitor);
        Ok(())
    }

    /// Process one inbound line and return the replies to send, if any.
    /// Successful station commands are silent; telemetry is the feedback.
    pub fn handle_line(&mut self, line: &str) -> Result<Vec<String>> {
        let cmd = match parse_line(line, &self.current) {
            Ok(cmd) => cmd,
            Err(reply) => {
                warn!(error = %reply.error, "command rejected");
                return Ok(vec![reply.to_line()]);
            }
        };
        self.execute(cmd)
    }

    fn execute(&mut self, cmd: Command) -> Result<Vec<String>> {
        let now_ms = self.now_ms();
        match cmd {
            Command::Setting(candidate, verdict) => {
                // The candidate is applied regardless of the verdict; a
                // failed validation is reported but does not veto apply.
                let reply = verdict
                    .err()
                    .map(|e| ErrorReply::new("setting", 0, e).to_line());
                self.apply_setting(candidate)?;
                Ok(reply.into_iter().collect())
            }
            Command::Query => Ok(vec![setting_line(&self.current)]),
            Command::Cup { slot, cmd } => {
                match cmd {
                    CupCmd::StartDispense => {
                        self.cup
                            .start(&*self.hal, &self.pins, &mut self.state, slot)?;
                    }
                    CupCmd::StopDispense => {
                        self.cup
                            .stop(&*self.hal, &self.pins, &mut self.state, slot)?;
                    }
                }
                Ok(Vec::new())
            }
            Command::Ramen { slot, cmd } => {
                match cmd {
                    RamenCmd::Eject => {
                        self.ramen
                            .start_eject(&*self.hal, &self.pins, &mut self.state, slot)?;
                    }
                    RamenCmd::Rise => {
                        self.ramen
                            .start_rise(&*self.hal, &self.pins, &mut self.state, slot)?;
                    }
                    RamenCmd::Lower => {
                        self.ramen
                            .start_lower(&*self.hal, &self.pins, &mut self.state, slot)?;
                    }
                    RamenCmd::StopAll => {
                        self.ramen
                            .stop(&*self.hal, &self.pins, &mut self.state, slot)?;
                    }
                }
                Ok(Vec::new())
            }
            Command::Powder { slot, cmd } => {
                match cmd {
                    PowderCmd::StartDispense { duration_ms } => {
                        self.powder.start(
                            &*self.hal,
                            &self.pins,
                            &mut self.state,
                            slot,
                            duration_ms,
                            now_ms,
                        )?;
                    }
                    PowderCmd::StopDispense => {
                        self.powder
                            .stop(&*self.hal, &self.pins, &mut self.state, slot)?;
                    }
                }
                Ok(Vec::new())
            }
            Command::Cooker { slot, cmd } => {
                match cmd {
                    CookerCmd::StartCook { water, timer } => {
                        self.cooker.start(
                            &*self.hal,
                            &self.pins,
                            &mut self.state,
                            slot,
                            water,
                            timer,
                        )?;
                    }
                    CookerCmd::StopCook => {
                        self.cooker
                            .stop(&*self.hal, &self.pins, &mut self.state, slot)?;
                    }
                }
                Ok(Vec::new())
            }
            Command::Outlet { slot, cmd } => {
                match cmd {
                    OutletCmd::OpenDoor => {
                        self.outlet
                            .open(&*self.hal, &self.pins, &mut self.state, slot)?;
                    }
                    OutletCmd::CloseDoor => {
                        self.outlet
                            .close(&*self.hal, &self.pins, &mut self.state, slot)?;
                    }
                    OutletCmd::Stop => {
                        self.outlet
                            .stop(&*self.hal, &self.pins, &mut self.state, slot)?;
                    }
                }
                Ok(Vec::new())
            }
        }
    }

    /// Reconfigure pin roles for the new station counts and make it live.
    /// Counts are clamped to the category maxima: a rejected over-max
    /// candidate still applies (like any other invalid candidate), but it
    /// must never index past the fixed per-slot arrays.
    fn apply_setting(&mut self, next: Setting) -> Result<()> {
        let next = next.clamped();
        info!(
            cup = next.cup,
            ramen = next.ramen,
            powder = next.powder,
            cooker = next.cooker,
            outlet = next.outlet,
            "applying configuration"
        );
        let h = &*self.hal;
        let p = &self.pins;

        for i in 0..usize::from(next.cup) {
            hal(h.set_mode(p.cup_motor[i], PinMode::Output))?;
            hal(h.set_mode(p.cup_turn[i], PinMode::InputPullup))?;
            hal(h.set_mode(p.cup_confirm[i], PinMode::InputPullup))?;
            hal(h.set_mode(p.cup_stock[i], PinMode::InputPullup))?;
        }

        for i in 0..usize::from(next.ramen) {
            hal(h.set_mode(p.ramen_up_fwd[i], PinMode::Output))?;
            hal(h.set_mode(p.ramen_up_rev[i], PinMode::Output))?;
            hal(h.set_mode(p.ramen_ej_fwd[i], PinMode::Output))?;
            hal(h.set_mode(p.ramen_ej_rev[i], PinMode::Output))?;
            hal(h.set_mode(p.ramen_ej_top[i], PinMode::InputPullup))?;
            hal(h.set_mode(p.ramen_ej_bottom[i], PinMode::InputPullup))?;
            hal(h.set_mode(p.ramen_up_top[i], PinMode::InputPullup))?;
            hal(h.set_mode(p.ramen_up_bottom[i], PinMode::InputPullup))?;
            hal(h.set_mode(p.ramen_detect[i], PinMode::InputPullup))?;
        }

        for i in 0..usize::from(next.powder) {
            hal(h.set_mode(p.powder_motor[i], PinMode::Output))?;
        }

        for i in 0..usize::from(next.cooker) {
            if i < CONTROLLABLE_SLOTS {
                hal(h.set_mode(p.cooker_induction[i], PinMode::Output))?;
                hal(h.set_mode(p.cooker_water[i], PinMode::Output))?;
            } else {
                // Externally driven cooker: both signal lines are our inputs.
                hal(h.set_mode(p.cooker_induction[i], PinMode::Input))?;
                hal(h.set_mode(p.cooker_water[i], PinMode::Input))?;
            }
        }

        for i in 0..usize::from(next.outlet) {
            hal(h.set_mode(p.outlet_fwd[i], PinMode::Output))?;
            hal(h.set_mode(p.outlet_rev[i], PinMode::Output))?;
            hal(h.set_mode(p.outlet_open[i], PinMode::InputPullup))?;
            hal(h.set_mode(p.outlet_close[i], PinMode::InputPullup))?;
            hal(h.set_mode(p.outlet_load_dt[i], PinMode::Input))?;
            hal(h.set_mode(p.outlet_load_sck[i], PinMode::Output))?;
        }

        if next.cup > 0 || next.cooker > 0 {
            hal(h.set_mode(p.door_sensor1, PinMode::InputPullup))?;
            hal(h.set_mode(p.door_sensor2, PinMode::InputPullup))?;
        }

        self.ramen.configure(next.ramen);
        self.current = next;
        Ok(())
    }

    /// One polling period: read sensors, advance every station's pending
    /// work, and emit a telemetry line when the publish interval elapses.
    pub fn tick(&mut self) -> Result<Option<String>> {
        let now_ms = self.now_ms();

        self.sensors
            .read_all(&*self.hal, &self.pins, &self.current, &mut self.state, now_ms);

        if let Some(encoder) = &mut self.encoder {
            if self.current.ramen > 0 {
                self.state.ramen_lift[0] = encoder.angle_deg_now();
            }
            encoder.report(now_ms);
        }

        self.cup
            .check(&*self.hal, &self.pins, &self.current, &mut self.state, now_ms)?;
        self.ramen
            .check(&*self.hal, &self.pins, &self.current, &mut self.state)?;
        self.powder
            .check(&*self.hal, &self.pins, &self.current, &mut self.state, now_ms)?;
        self.outlet
            .check(&*self.hal, &self.pins, &self.current, &mut self.state)?;

        if now_ms.saturating_sub(self.last_publish_ms) >= self.cfg.publish_interval_ms {
            self.last_publish_ms = now_ms;
            return Ok(Some(telemetry::publish_line(&self.current, &self.state)));
        }
        Ok(None)
    }

    /// Drive every configured actuator to its safe (off) state. Called on
    /// shutdown so motors never outlive the process.
    pub fn stop_all(&mut self) -> Result<()> {
        info!("stopping all stations");
        for slot in 0..usize::from(self.current.cup) {
            self.cup
                .stop(&*self.hal, &self.pins, &mut self.state, slot)?;
        }
        for slot in 0..usize::from(self.current.ramen) {
            self.ramen
                .stop(&*self.hal, &self.pins, &mut self.state, slot)?;
        }
        for slot in 0..usize::from(self.current.powder) {
            self.powder
                .stop(&*self.hal, &self.pins, &mut self.state, slot)?;
        }
        for slot in 0..usize::from(self.current.cooker) {
            self.cooker
                .stop(&*self.hal, &self.pins, &mut self.state, slot)?;
        }
        for slot in 0..usize::from(self.current.outlet) {
            self.outlet
                .stop(&*self.hal, &self.pins, &mut self.state, slot)?;
        }
        Ok(())
    }

    pub fn current(&self) -> &Setting {
        &self.current
    }

    pub fn state(&self) -> &StationState {
        &self.state
    }

    /// Mutable state access for tests that script sensor conditions
    /// without going through the HAL.
    pub fn state_mut(&mut self) -> &mut StationState {
        &mut self.state
    }

    pub fn eject_state(&self, slot: usize) -> EjectState {
        self.ramen.eject_state(slot)
    }

    pub fn tick_ms(&self) -> u64 {
        self.cfg.tick_ms
    }
}
