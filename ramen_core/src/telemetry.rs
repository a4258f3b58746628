//! Periodic status publication.
//!
//! Builds the full record batch from `StationState` in a fixed category
//! order (cup, ramen, powder, cooker, outlet, then the door record) and
//! renders it as one wire line. The door record is published only when a
//! cup or cooker station is configured, matching the hardware variants
//! that actually carry door sensors.

use crate::protocol::{Record, records_line};
use crate::setting::Setting;
use crate::state::StationState;

/// Collect one telemetry batch for the active configuration.
pub fn collect(current: &Setting, state: &StationState) -> Vec<Record> {
    let mut records = Vec::with_capacity(
        usize::from(current.cup)
            + usize::from(current.ramen)
            + usize::from(current.powder)
            + usize::from(current.cooker)
            + usize::from(current.outlet)
            + 1,
    );

    for i in 0..usize::from(current.cup) {
        records.push(Record::Cup {
            control: i as u32 + 1,
            amp: state.cup_amp[i],
            stock: u8::from(state.cup_stock[i]),
            dispense: u8::from(state.cup_turn[i]),
        });
    }

    for i in 0..usize::from(current.ramen) {
        records.push(Record::Ramen {
            control: i as u32 + 1,
            amp: state.ramen_amp[i],
            liftup: u8::from(state.ramen_lift_top[i]),
            liftdown: u8::from(state.ramen_lift_bottom[i]),
            slidein: u8::from(state.ramen_eject_bottom[i]),
            slideout: u8::from(state.ramen_eject_top[i]),
            detect: u8::from(state.ramen_detect[i]),
            lift: state.ramen_lift[i],
        });
    }

    for i in 0..usize::from(current.powder) {
        records.push(Record::Powder {
            control: i as u32 + 1,
            amp: state.powder_amp[i],
            dispense: u8::from(state.powder_motor[i]),
        });
    }

    for i in 0..usize::from(current.cooker) {
        records.push(Record::Cooker {
            control: i as u32 + 1,
            amp: state.cooker_amp[i],
            work: u8::from(state.cooker_work[i]),
        });
    }

    for i in 0..usize::from(current.outlet) {
        records.push(Record::Outlet {
            control: i as u32 + 1,
            amp: state.outlet_amp[i],
            opendoor: u8::from(state.outlet_open[i]),
            closedoor: u8::from(state.outlet_closed[i]),
            sonar: state.outlet_sonar[i],
            loadcell: state.outlet_loadcell[i],
        });
    }

    if current.cup > 0 || current.cooker > 0 {
        records.push(Record::Door {
            sensor1: u8::from(state.door_sensor1),
            sensor2: u8::from(state.door_sensor2),
        });
    }

    records
}

/// Render one publication line for the active configuration.
pub fn publish_line(current: &Setting, state: &StationState) -> String {
    records_line(&collect(current, state))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn door_record_follows_cup_or_cooker() {
        let state = StationState::default();

        let with_cup = collect(
            &Setting {
                cup: 1,
                ..Setting::default()
            },
            &state,
        );
        assert_eq!(with_cup.len(), 2);
        assert!(matches!(with_cup[1], Record::Door { .. }));

        let powder_only = collect(
            &Setting {
                powder: 2,
                ..Setting::default()
            },
            &state,
        );
        assert_eq!(powder_only.len(), 2);
        assert!(powder_only.iter().all(|r| matches!(r, Record::Powder { .. })));
    }

    #[test]
    fn category_order_is_fixed() {
        let batch = collect(
            &Setting {
                cup: 1,
                cooker: 1,
                ..Setting::default()
            },
            &StationState::default(),
        );
        assert!(matches!(batch[0], Record::Cup { .. }));
        assert!(matches!(batch[1], Record::Cooker { .. }));
        assert!(matches!(batch[2], Record::Door { .. }));
    }

    #[test]
    fn slide_fields_map_to_eject_limits() {
        let mut state = StationState::default();
        state.ramen_eject_top[0] = true;
        let batch = collect(
            &Setting {
                ramen: 1,
                ..Setting::default()
            },
            &state,
        );
        match batch[0] {
            Record::Ramen {
                slideout, slidein, ..
            } => {
                assert_eq!(slideout, 1);
                assert_eq!(slidein, 0);
            }
            ref other => panic!("expected ramen record, got {other:?}"),
        }
    }
}
