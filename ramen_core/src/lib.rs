#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Control engine for the multi-station food-preparation machine
//! (hardware-agnostic).
//!
//! All hardware interactions go through the `ramen_traits::Hal` capability
//! trait; the engine itself is a single-threaded cooperative polling loop.
//!
//! ## Architecture
//!
//! - **Settings**: station-count validation and pin-role application
//!   (`setting`, `engine::Machine::apply_setting`)
//! - **Stations**: per-slot non-blocking state machines with
//!   `start`/`stop`/`check` (`cup`, `ramen`, `powder`, `cooker`, `outlet`)
//! - **Sensors**: smoothing, debounce, and the two-wire load-cell read
//!   (`sensors`, `loadcell`)
//! - **Protocol**: JSON-lines command parsing and telemetry rendering
//!   (`protocol`, `dispatch`, `telemetry`)
//! - **Encoder**: interrupt-fed quadrature counter with a polled reporter
//!   (`encoder`)
//!
//! Every `start` only establishes a pending condition; `check` (called each
//! tick) is the sole place progress happens, so no step ever blocks.

pub mod cooker;
pub mod cup;
pub mod dispatch;
pub mod encoder;
pub mod engine;
pub mod error;
pub mod link;
pub mod loadcell;
pub mod mocks;
pub mod outlet;
pub mod powder;
pub mod protocol;
pub mod ramen;
pub mod sensors;
pub mod setting;
pub mod state;
pub mod telemetry;

mod hal_error;

pub use dispatch::{Command, parse_line};
pub use engine::Machine;
pub use error::{MachineError, ProtocolError, Result, ValidationError};
pub use link::CommandLink;
pub use setting::Setting;
pub use state::StationState;
