//! Command/reply behavior through the engine: configuration rules, error
//! replies, the query snapshot, and the published telemetry shape.

use std::sync::Arc;

use ramen_config::{EngineCfg, PinMap};
use ramen_core::Machine;
use ramen_core::mocks::{ManualClock, MockHal};
use ramen_traits::{Hal, PinMode};
use serde_json::Value;

fn machine() -> (Arc<MockHal>, ManualClock, Machine) {
    let hal = Arc::new(MockHal::new());
    let clock = ManualClock::new();
    let m = Machine::new(
        hal.clone() as Arc<dyn Hal>,
        Arc::new(clock.clone()),
        PinMap::default(),
        EngineCfg::default(),
    );
    (hal, clock, m)
}

fn parse(line: &str) -> Vec<Value> {
    serde_json::from_str(line).unwrap()
}

#[test]
fn valid_setting_is_silent_and_queryable() {
    let (_hal, _clock, mut m) = machine();
    assert!(m
        .handle_line(r#"{"device":"setting","powder":3}"#)
        .unwrap()
        .is_empty());

    let replies = m.handle_line(r#"{"device":"query"}"#).unwrap();
    assert_eq!(replies, vec![r#"[{"device":"setting","powder":3}]"#.to_owned()]);
}

#[test]
fn invalid_setting_reports_but_still_applies() {
    let (hal, _clock, mut m) = machine();
    let replies = m
        .handle_line(r#"{"device":"setting","cup":2,"ramen":1}"#)
        .unwrap();
    assert_eq!(replies.len(), 1);
    let body = &parse(&replies[0])[0];
    assert_eq!(body["device"], "setting");
    assert_eq!(
        body["error"],
        "invalid combination (only cup+cooker together; others solo)"
    );

    // The rejected combination is live anyway.
    assert_eq!(m.current().cup, 2);
    assert_eq!(m.current().ramen, 1);
    assert!(m
        .handle_line(r#"{"device":"cup","control":2,"function":"startdispense"}"#)
        .unwrap()
        .is_empty());
    assert!(hal.level(PinMap::default().cup_motor[1]));
}

#[test]
fn over_max_setting_reports_the_limit() {
    let (_hal, _clock, mut m) = machine();
    let replies = m
        .handle_line(r#"{"device":"setting","cup":5}"#)
        .unwrap();
    let body = &parse(&replies[0])[0];
    assert_eq!(body["error"], "cup max=4");
}

#[test]
fn over_max_setting_clamps_and_keeps_running() {
    let (_hal, clock, mut m) = machine();
    let replies = m.handle_line(r#"{"device":"setting","cup":9}"#).unwrap();
    assert_eq!(parse(&replies[0])[0]["error"], "cup max=4");

    // Applied like any other rejected candidate, but capped to capacity
    // so the per-slot arrays stay in bounds.
    assert_eq!(m.current().cup, 4);
    clock.advance_ms(100);
    let batch = parse(&m.tick().unwrap().unwrap());
    assert_eq!(batch.len(), 5); // 4 cup records + door
    m.stop_all().unwrap();
}

#[test]
fn empty_setting_reports_all_zero() {
    let (_hal, _clock, mut m) = machine();
    let replies = m.handle_line(r#"{"device":"setting"}"#).unwrap();
    let body = &parse(&replies[0])[0];
    assert_eq!(body["error"], "no device count set");
}

#[test]
fn command_against_unconfigured_category_is_rejected() {
    let (_hal, _clock, mut m) = machine();
    let replies = m
        .handle_line(r#"{"device":"powder","control":1,"function":"startdispense","time":5}"#)
        .unwrap();
    let body = &parse(&replies[0])[0];
    assert_eq!(body["device"], "powder");
    assert_eq!(body["error"], "invalid powder control num");
}

#[test]
fn outlet_commands_bypass_the_count_check() {
    let (hal, _clock, mut m) = machine();
    // Nothing configured at all, and the door still moves.
    assert!(m
        .handle_line(r#"{"device":"outlet","control":1,"function":"opendoor"}"#)
        .unwrap()
        .is_empty());
    assert!(hal.level(PinMap::default().outlet_fwd[0]));
}

#[test]
fn setting_reconfigures_pin_roles() {
    let (hal, _clock, mut m) = machine();
    let pins = PinMap::default();
    m.handle_line(r#"{"device":"setting","cup":1}"#).unwrap();
    assert_eq!(hal.mode(pins.cup_motor[0]), Some(PinMode::Output));
    assert_eq!(hal.mode(pins.cup_stock[0]), Some(PinMode::InputPullup));
    assert_eq!(hal.mode(pins.door_sensor1), Some(PinMode::InputPullup));

    m.handle_line(r#"{"device":"setting","cooker":3}"#).unwrap();
    assert_eq!(hal.mode(pins.cooker_induction[0]), Some(PinMode::Output));
    assert_eq!(hal.mode(pins.cooker_water[0]), Some(PinMode::Output));
    assert_eq!(hal.mode(pins.cooker_induction[2]), Some(PinMode::Input));
    assert_eq!(hal.mode(pins.cooker_water[2]), Some(PinMode::Input));
}

#[test]
fn malformed_line_yields_a_system_error() {
    let (_hal, _clock, mut m) = machine();
    let replies = m.handle_line("not json at all").unwrap();
    let body = &parse(&replies[0])[0];
    assert_eq!(body["device"], "system");
    assert_eq!(body["error"], "json parse fail");
}

#[test]
fn telemetry_publishes_on_the_interval_with_door_record() {
    let (hal, clock, mut m) = machine();
    let pins = PinMap::default();
    m.handle_line(r#"{"device":"setting","cup":1}"#).unwrap();
    hal.set_analog(pins.cup_amp[0], 42);

    assert!(m.tick().unwrap().is_none());
    clock.advance_ms(99);
    assert!(m.tick().unwrap().is_none());

    clock.advance_ms(1);
    let line = m.tick().unwrap().unwrap();
    let batch = parse(&line);
    assert_eq!(batch.len(), 2);
    assert_eq!(batch[0]["device"], "cup");
    assert_eq!(batch[0]["control"], 1);
    assert_eq!(batch[0]["amp"], 42);
    assert_eq!(batch[1]["device"], "door");

    // Next publish only after another full interval.
    assert!(m.tick().unwrap().is_none());
    clock.advance_ms(100);
    assert!(m.tick().unwrap().is_some());
}

#[test]
fn powder_only_telemetry_has_no_door_record() {
    let (_hal, clock, mut m) = machine();
    m.handle_line(r#"{"device":"setting","powder":2}"#).unwrap();
    clock.advance_ms(100);
    let line = m.tick().unwrap().unwrap();
    let batch = parse(&line);
    assert_eq!(batch.len(), 2);
    assert!(batch.iter().all(|r| r["device"] == "powder"));
}

#[test]
fn outlet_telemetry_carries_the_loadcell_reading() {
    let (hal, clock, mut m) = machine();
    let pins = PinMap::default();
    m.handle_line(r#"{"device":"setting","outlet":1}"#).unwrap();
    hal.feed_loadcell(pins.outlet_load_dt[0], pins.outlet_load_sck[0], 1234);

    clock.advance_ms(100);
    let line = m.tick().unwrap().unwrap();
    let batch = parse(&line);
    assert_eq!(batch[0]["device"], "outlet");
    assert_eq!(batch[0]["loadcell"], 1234);
}
