use proptest::prelude::*;
use std::time::{Duration, Instant};

use servo_hand::mapping::{map_finger, map_wrist, WristHold};
use servo_hand::ranges::CalibrationRanges;
use servo_hand::types::{Channel, FingerLengths};

fn ranges(lo: f64, hi: f64) -> CalibrationRanges {
    CalibrationRanges {
        min: Some(FingerLengths([lo; 5])),
        max: Some(FingerLengths([hi; 5])),
        wrist_min: Some(lo),
        wrist_max: Some(hi),
    }
}

fn finger() -> impl Strategy<Value = Channel> {
    prop::sample::select(Channel::FINGERS.to_vec())
}

proptest! {
    #[test]
    fn in_range_is_bounded_and_monotone(
        lo in 1.0f64..500.0,
        width in 0.5f64..500.0,
        a in 0.0f64..1.0,
        b in 0.0f64..1.0,
        channel in finger(),
    ) {
        let hi = lo + width;
        let r = ranges(lo, hi);
        let (a, b) = if a <= b { (a, b) } else { (b, a) };
        let low = map_finger(channel, lo + a * width, &r);
        let high = map_finger(channel, lo + b * width, &r);
        prop_assert!((0.0..=180.0).contains(&low));
        prop_assert!((0.0..=180.0).contains(&high));
        prop_assert!(low <= high);
    }

    #[test]
    fn out_of_range_clamps_exactly(
        lo in 1.0f64..500.0,
        width in 0.5f64..500.0,
        past in 0.001f64..1000.0,
        channel in finger(),
    ) {
        let r = ranges(lo, lo + width);
        prop_assert_eq!(map_finger(channel, lo - past, &r), 0.0);
        prop_assert_eq!(map_finger(channel, lo + width + past, &r), 180.0);
    }

    #[test]
    fn collapsed_range_is_ninety(bound in 0.0f64..1000.0, length in -1000.0f64..2000.0, channel in finger()) {
        prop_assert_eq!(map_finger(channel, length, &ranges(bound, bound)), 90.0);
    }

    #[test]
    fn wrist_output_stays_in_servo_range(span in -500.0f64..1500.0, delta in -100.0f64..100.0) {
        let t0 = Instant::now();
        let now = t0 + Duration::from_secs(2);
        let (angle, _) = map_wrist(span, delta, &ranges(100.0, 200.0), 90.0, t0, now, &WristHold::default());
        prop_assert!((0.0..=180.0).contains(&angle));
    }

    #[test]
    fn ranges_round_trip(
        min in prop::array::uniform5(0.0f64..1e4),
        max in prop::array::uniform5(0.0f64..1e4),
        wrist_min in prop::option::of(0.0f64..1e4),
        wrist_max in prop::option::of(0.0f64..1e4),
    ) {
        let r = CalibrationRanges {
            min: Some(FingerLengths(min)),
            max: Some(FingerLengths(max)),
            wrist_min,
            wrist_max,
        };
        let back = CalibrationRanges::deserialize(&r.serialize().unwrap()).unwrap();
        prop_assert_eq!(back, r);
    }
}

#[test]
fn hold_debounces_then_releases() {
    let hold = WristHold::default();
    let r = ranges(100.0, 200.0);
    let t0 = Instant::now();

    let a = map_wrist(130.0, 25.0, &r, 60.0, t0, t0 + Duration::from_millis(400), &hold);
    let b = map_wrist(190.0, 25.0, &r, a.0, a.1, t0 + Duration::from_millis(900), &hold);
    assert_eq!(a, b);

    let later = t0 + Duration::from_millis(1000);
    let c = map_wrist(190.0, 25.0, &r, b.0, b.1, later, &hold);
    assert_ne!(c.0, b.0);
    assert_eq!(c.1, later);
}
