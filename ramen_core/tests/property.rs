//! Property-based checks on the sensor conditioning primitives.

use proptest::prelude::*;
use ramen_core::sensors::{Debouncer, filter_amp};

proptest! {
    /// The smoothed value stays inside the hull of its inputs, except
    /// where the deadzone clamps it to exactly zero.
    #[test]
    fn filter_amp_bounded_by_inputs(prev in 0i32..=4095, raw in 0i32..=4095) {
        let out = filter_amp(prev, raw);
        let lo = prev.min(raw);
        let hi = prev.max(raw);
        if out == 0 {
            prop_assert!(lo < 5 || (prev * 80 + raw * 20) / 100 < 5);
        } else {
            prop_assert!(out >= 5);
            prop_assert!(out >= lo && out <= hi);
        }
    }

    /// A constant input above the deadzone converges; the filter never
    /// overshoots the target.
    #[test]
    fn filter_amp_never_overshoots(target in 25i32..=4095, steps in 1usize..100) {
        let mut v = 0;
        for _ in 0..steps {
            let next = filter_amp(v, target);
            prop_assert!(next >= v);
            prop_assert!(next <= target);
            v = next;
        }
    }

    /// However the raw signal toggles, the stable output only changes
    /// after the raw level has held for the full window.
    #[test]
    fn debounce_requires_a_full_quiet_window(
        toggles in proptest::collection::vec((any::<bool>(), 1u64..200), 1..50),
    ) {
        let mut d = Debouncer::new(50);
        let mut now = 0u64;
        let mut last_change_at = 0u64;
        let mut last_raw = false;
        for (raw, dt) in toggles {
            now += dt;
            if raw != last_raw {
                last_raw = raw;
                last_change_at = now;
            }
            let stable = d.update(raw, now);
            if stable != raw {
                // Disagreement is only allowed inside the window.
                prop_assert!(now - last_change_at < 50);
            }
        }
    }
}
