//! Command parsing and routing.
//!
//! All string matching lives here, at the parse boundary: a wire line
//! becomes a tagged `Command` or a structured error reply, and the
//! controllers downstream never see a string. External `control` indices
//! are 1-based and translated to 0-based slots; every category except
//! outlet is bounds-checked against the configured count (the outlet path
//! historically skips that check and we keep it that way, clamping only
//! to the fixed array capacity).

use ramen_config::MAX_OUTLET;

use crate::error::{ProtocolError, ValidationError};
use crate::protocol::{ErrorReply, Request};
use crate::setting::Setting;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CupCmd {
    StartDispense,
    StopDispense,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RamenCmd {
    /// `startdispense`: run the eject cycle.
    Eject,
    /// `readydispense`: raise the lift.
    Rise,
    /// `initdispense`: lower the lift to home.
    Lower,
    /// `stopdispense`: all four motors off.
    StopAll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowderCmd {
    StartDispense { duration_ms: u64 },
    StopDispense,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CookerCmd {
    StartCook { water: i64, timer: i64 },
    StopCook,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutletCmd {
    OpenDoor,
    CloseDoor,
    Stop,
}

/// A fully validated command, slot indices already 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Candidate configuration and its validation verdict. Apply happens
    /// either way; the verdict only decides whether an error is reported.
    Setting(Setting, Result<(), ValidationError>),
    Query,
    Cup { slot: usize, cmd: CupCmd },
    Ramen { slot: usize, cmd: RamenCmd },
    Powder { slot: usize, cmd: PowderCmd },
    Cooker { slot: usize, cmd: CookerCmd },
    Outlet { slot: usize, cmd: OutletCmd },
}

/// Parse one wire line against the live configuration.
pub fn parse_line(line: &str, current: &Setting) -> Result<Command, ErrorReply> {
    let req: Request = serde_json::from_str(line)
        .map_err(|_| ErrorReply::new("system", 0, ProtocolError::Malformed))?;

    match req.device.as_str() {
        "setting" => {
            let candidate = req.to_setting();
            let verdict = candidate.validate();
            Ok(Command::Setting(candidate, verdict))
        }
        "query" => Ok(Command::Query),
        "cup" => {
            let slot = checked_slot("cup", req.control, current.cup)?;
            let cmd = match req.function.as_str() {
                "startdispense" => CupCmd::StartDispense,
                "stopdispense" => CupCmd::StopDispense,
                _ => return Err(unknown_function("cup", req.control)),
            };
            Ok(Command::Cup { slot, cmd })
        }
        "ramen" => {
            let slot = checked_slot("ramen", req.control, current.ramen)?;
            let cmd = match req.function.as_str() {
                "startdispense" => RamenCmd::Eject,
                "readydispense" => RamenCmd::Rise,
                "initdispense" => RamenCmd::Lower,
                "stopdispense" => RamenCmd::StopAll,
                _ => return Err(unknown_function("ramen", req.control)),
            };
            Ok(Command::Ramen { slot, cmd })
        }
        "powder" => {
            let slot = checked_slot("powder", req.control, current.powder)?;
            let cmd = match req.function.as_str() {
                "startdispense" => {
                    let tenths = req.time.unwrap_or(0);
                    if tenths <= 0 {
                        return Err(ErrorReply::new(
                            "powder",
                            req.control,
                            ValidationError::BadDuration,
                        ));
                    }
                    PowderCmd::StartDispense {
                        duration_ms: (tenths as u64).saturating_mul(100),
                    }
                }
                "stopdispense" => PowderCmd::StopDispense,
                _ => return Err(unknown_function("powder", req.control)),
            };
            Ok(Command::Powder { slot, cmd })
        }
        "cooker" => {
            let slot = checked_slot("cooker", req.control, current.cooker)?;
            let cmd = match req.function.as_str() {
                "startcook" => CookerCmd::StartCook {
                    water: req.water.unwrap_or(0),
                    timer: req.timer.unwrap_or(0),
                },
                "stopcook" => CookerCmd::StopCook,
                _ => return Err(unknown_function("cooker", req.control)),
            };
            Ok(Command::Cooker { slot, cmd })
        }
        "outlet" => {
            // No configured-count check here; clamp to array capacity only.
            let slot = req
                .control
                .saturating_sub(1)
                .clamp(0, MAX_OUTLET as i64 - 1) as usize;
            let cmd = match req.function.as_str() {
                "opendoor" => OutletCmd::OpenDoor,
                "closedoor" => OutletCmd::CloseDoor,
                "stopoutlet" => OutletCmd::Stop,
                _ => return Err(unknown_function("outlet", req.control)),
            };
            Ok(Command::Outlet { slot, cmd })
        }
        _ => Err(ErrorReply::new("system", 0, ProtocolError::UnknownDevice)),
    }
}

fn checked_slot(category: &'static str, control: i64, count: u8) -> Result<usize, ErrorReply> {
    if control <= 0 || control > i64::from(count) {
        return Err(ErrorReply::new(
            category,
            control,
            ValidationError::ControlOutOfRange { category },
        ));
    }
    Ok((control - 1) as usize)
}

fn unknown_function(category: &'static str, control: i64) -> ErrorReply {
    ErrorReply::new(
        category,
        control,
        ProtocolError::UnknownFunction { category },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn cfg(cup: u8, powder: u8, outlet: u8) -> Setting {
        Setting {
            cup,
            powder,
            outlet,
            ..Setting::default()
        }
    }

    #[test]
    fn control_index_is_one_based() {
        let cmd = parse_line(
            r#"{"device":"cup","control":2,"function":"startdispense"}"#,
            &cfg(2, 0, 0),
        )
        .unwrap();
        assert_eq!(
            cmd,
            Command::Cup {
                slot: 1,
                cmd: CupCmd::StartDispense
            }
        );
    }

    #[test]
    fn out_of_range_control_rejected() {
        let err = parse_line(
            r#"{"device":"cup","control":3,"function":"startdispense"}"#,
            &cfg(2, 0, 0),
        )
        .unwrap_err();
        assert_eq!(err.error, "invalid cup control num");
        let err = parse_line(
            r#"{"device":"cup","control":0,"function":"startdispense"}"#,
            &cfg(2, 0, 0),
        )
        .unwrap_err();
        assert_eq!(err.device, "cup");
        assert_eq!(err.control, 0);
    }

    #[test]
    fn outlet_skips_configured_count_check() {
        // Zero outlets configured, yet the command still routes.
        let cmd = parse_line(
            r#"{"device":"outlet","control":3,"function":"opendoor"}"#,
            &cfg(0, 0, 0),
        )
        .unwrap();
        assert_eq!(
            cmd,
            Command::Outlet {
                slot: 2,
                cmd: OutletCmd::OpenDoor
            }
        );
    }

    #[test]
    fn powder_time_is_tenths_of_seconds() {
        let cmd = parse_line(
            r#"{"device":"powder","control":1,"function":"startdispense","time":15}"#,
            &cfg(0, 1, 0),
        )
        .unwrap();
        assert_eq!(
            cmd,
            Command::Powder {
                slot: 0,
                cmd: PowderCmd::StartDispense { duration_ms: 1500 }
            }
        );
    }

    #[test]
    fn powder_missing_or_zero_time_rejected() {
        for line in [
            r#"{"device":"powder","control":1,"function":"startdispense"}"#,
            r#"{"device":"powder","control":1,"function":"startdispense","time":0}"#,
            r#"{"device":"powder","control":1,"function":"startdispense","time":-3}"#,
        ] {
            let err = parse_line(line, &cfg(0, 1, 0)).unwrap_err();
            assert_eq!(err.error, "'time' 0 or missing");
        }
    }

    #[rstest]
    #[case(1, 100)]
    #[case(600, 60_000)]
    #[case(i64::MAX, u64::MAX)]
    fn powder_duration_saturates_at_the_extremes(
        #[case] tenths: i64,
        #[case] expected_ms: u64,
    ) {
        let line = format!(
            r#"{{"device":"powder","control":1,"function":"startdispense","time":{tenths}}}"#
        );
        let cmd = parse_line(&line, &cfg(0, 1, 0)).unwrap();
        assert_eq!(
            cmd,
            Command::Powder {
                slot: 0,
                cmd: PowderCmd::StartDispense {
                    duration_ms: expected_ms
                }
            }
        );
    }

    #[rstest]
    #[case(i64::MIN, 0)]
    #[case(-5, 0)]
    #[case(0, 0)]
    #[case(1, 0)]
    #[case(4, 3)]
    #[case(i64::MAX, 3)]
    fn outlet_control_extremes_clamp_into_capacity(
        #[case] control: i64,
        #[case] slot: usize,
    ) {
        let line =
            format!(r#"{{"device":"outlet","control":{control},"function":"opendoor"}}"#);
        let cmd = parse_line(&line, &cfg(0, 0, 0)).unwrap();
        assert_eq!(
            cmd,
            Command::Outlet {
                slot,
                cmd: OutletCmd::OpenDoor
            }
        );
    }

    #[test]
    fn unknown_device_and_function_are_structured_errors() {
        let err = parse_line(r#"{"device":"toaster"}"#, &cfg(1, 1, 1)).unwrap_err();
        assert_eq!(err.device, "system");
        assert_eq!(err.error, "unsupported device field");

        let err = parse_line(
            r#"{"device":"cup","control":1,"function":"explode"}"#,
            &cfg(1, 0, 0),
        )
        .unwrap_err();
        assert_eq!(err.error, "unknown cup function");
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = parse_line("{nope", &cfg(1, 0, 0)).unwrap_err();
        assert_eq!(err.device, "system");
        assert_eq!(err.error, "json parse fail");
    }

    #[test]
    fn setting_carries_verdict_without_blocking() {
        let cmd = parse_line(r#"{"device":"setting","cup":2,"ramen":1}"#, &cfg(0, 0, 0)).unwrap();
        match cmd {
            Command::Setting(candidate, verdict) => {
                assert_eq!(candidate.cup, 2);
                assert!(verdict.is_err());
            }
            other => panic!("expected Setting, got {other:?}"),
        }
    }
}
