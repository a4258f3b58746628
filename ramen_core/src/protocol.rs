//! Wire types for the line-oriented JSON transport.
//!
//! One JSON object in per line; one JSON array out per line (replies are
//! arrays even when they carry a single record).

use serde::{Deserialize, Serialize};

use crate::setting::Setting;

/// Raw inbound field map. Every command shape shares this struct; the
/// dispatcher decides which fields matter for a given `device`.
#[derive(Debug, Deserialize)]
pub struct Request {
    pub device: String,
    /// External 1-based slot index.
    #[serde(default)]
    pub control: i64,
    #[serde(default)]
    pub function: String,
    /// Powder dispense duration in tenths of a second.
    pub time: Option<i64>,
    pub water: Option<i64>,
    pub timer: Option<i64>,

    // Setting counts; omitted categories default to 0.
    #[serde(default)]
    pub cup: i64,
    #[serde(default)]
    pub ramen: i64,
    #[serde(default)]
    pub powder: i64,
    #[serde(default)]
    pub cooker: i64,
    #[serde(default)]
    pub outlet: i64,
}

impl Request {
    /// Candidate setting from the count fields. Out-of-range values
    /// saturate so validation can report them instead of a parse error.
    pub fn to_setting(&self) -> Setting {
        let clamp = |v: i64| v.clamp(0, i64::from(u8::MAX)) as u8;
        Setting {
            cup: clamp(self.cup),
            ramen: clamp(self.ramen),
            powder: clamp(self.powder),
            cooker: clamp(self.cooker),
            outlet: clamp(self.outlet),
        }
    }
}

/// One telemetry record. The `device` tag picks the variant, so the wire
/// shape is `{"device":"cup", ...}` per record.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "device", rename_all = "lowercase")]
pub enum Record {
    Cup {
        control: u32,
        amp: i32,
        stock: u8,
        dispense: u8,
    },
    Ramen {
        control: u32,
        amp: i32,
        liftup: u8,
        liftdown: u8,
        slidein: u8,
        slideout: u8,
        detect: u8,
        lift: i32,
    },
    Powder {
        control: u32,
        amp: i32,
        dispense: u8,
    },
    Cooker {
        control: u32,
        amp: i32,
        work: u8,
    },
    Outlet {
        control: u32,
        amp: i32,
        opendoor: u8,
        closedoor: u8,
        sonar: i32,
        loadcell: i32,
    },
    Door {
        sensor1: u8,
        sensor2: u8,
    },
}

/// Outbound error shape; always wrapped in a single-element array.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReply {
    pub device: String,
    pub control: i64,
    pub error: String,
}

impl ErrorReply {
    pub fn new(device: &str, control: i64, error: impl ToString) -> Self {
        Self {
            device: device.to_owned(),
            control,
            error: error.to_string(),
        }
    }

    /// Render as one wire line.
    pub fn to_line(&self) -> String {
        to_json_line(&[self])
    }
}

/// Query reply: the live configuration with zero categories omitted.
#[derive(Debug, Serialize)]
struct SettingSnapshot {
    device: &'static str,
    #[serde(skip_serializing_if = "is_zero")]
    cup: u8,
    #[serde(skip_serializing_if = "is_zero")]
    ramen: u8,
    #[serde(skip_serializing_if = "is_zero")]
    powder: u8,
    #[serde(skip_serializing_if = "is_zero")]
    cooker: u8,
    #[serde(skip_serializing_if = "is_zero")]
    outlet: u8,
}

fn is_zero(v: &u8) -> bool {
    *v == 0
}

/// Render the setting snapshot line for a `query`.
pub fn setting_line(current: &Setting) -> String {
    to_json_line(&[SettingSnapshot {
        device: "setting",
        cup: current.cup,
        ramen: current.ramen,
        powder: current.powder,
        cooker: current.cooker,
        outlet: current.outlet,
    }])
}

/// Render a batch of telemetry records as one wire line.
pub fn records_line(records: &[Record]) -> String {
    to_json_line(records)
}

fn to_json_line<T: Serialize + ?Sized>(value: &T) -> String {
    // Serialization of these shapes cannot fail; fall back to an empty
    // array rather than poisoning the transport.
    serde_json::to_string(value).unwrap_or_else(|_| "[]".to_owned())
}
