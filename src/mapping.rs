use std::time::{Duration, Instant};
use tracing::debug;

use crate::geometry::HandMeasurement;
use crate::ranges::CalibrationRanges;
use crate::types::{Channel, FingerLengths, ServoAngleSet, CENTER_ANGLE, MAX_ANGLE};

/// Hold rule for the wrist channel: while the thumb is moving a lot the
/// span change is gesture noise, not rotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WristHold {
    pub thumb_threshold_px: f64,
    pub window: Duration,
}

impl Default for WristHold {
    fn default() -> Self {
        Self {
            thumb_threshold_px: 20.0,
            window: Duration::from_secs(1),
        }
    }
}

/// Everything the mapper carries from one tick to the next.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapperState {
    pub angles: ServoAngleSet,
    pub wrist_last_update: Instant,
}

impl MapperState {
    pub fn new(now: Instant) -> Self {
        Self {
            angles: ServoAngleSet::default(),
            wrist_last_update: now,
        }
    }
}

/// Linear map of `value` from `[lo, hi]` onto `[0, 180]`, clamped.
///
/// A collapsed or inverted range, or a NaN value, gives the center angle.
pub fn interpolate(value: f64, lo: f64, hi: f64) -> f64 {
    if !(hi > lo) || !lo.is_finite() || !hi.is_finite() || value.is_nan() {
        return CENTER_ANGLE;
    }
    let t = (value - lo) / (hi - lo);
    (t * MAX_ANGLE).clamp(0.0, MAX_ANGLE)
}

/// Angle for one finger channel. Channels without both bounds, and the
/// wrist channel, sit at the center angle.
pub fn map_finger(channel: Channel, length: f64, ranges: &CalibrationRanges) -> f64 {
    match (ranges.min, ranges.max) {
        (Some(min), Some(max)) => match (min.get(channel), max.get(channel)) {
            (Some(lo), Some(hi)) => interpolate(length, lo, hi),
            _ => CENTER_ANGLE,
        },
        _ => CENTER_ANGLE,
    }
}

/// Returns the new wrist angle and the timestamp the next call should
/// compare against.
pub fn map_wrist(
    current_span: f64,
    thumb_y_delta: f64,
    ranges: &CalibrationRanges,
    last_angle: f64,
    last_update: Instant,
    now: Instant,
    hold: &WristHold,
) -> (f64, Instant) {
    let Some((lo, hi)) = ranges.wrist_bounds() else {
        return (CENTER_ANGLE, last_update);
    };

    if thumb_y_delta.abs() > hold.thumb_threshold_px
        && now.saturating_duration_since(last_update) < hold.window
    {
        debug!(thumb_y_delta, last_angle, "wrist angle held");
        return (last_angle, last_update);
    }

    (interpolate(current_span, lo, hi), now)
}

/// Maps all six channels. Finger channels keep their prior angle until both
/// finger bounds exist.
pub fn map_all(
    fingers: &FingerLengths,
    wrist_span: f64,
    thumb_y_delta: f64,
    ranges: &CalibrationRanges,
    prior: &MapperState,
    now: Instant,
    hold: &WristHold,
) -> MapperState {
    let mut angles = prior.angles;

    if ranges.is_finger_ready() {
        for channel in Channel::FINGERS {
            if let Some(length) = fingers.get(channel) {
                angles.set(channel, map_finger(channel, length, ranges));
            }
        }
    }

    let (wrist, wrist_last_update) = map_wrist(
        wrist_span,
        thumb_y_delta,
        ranges,
        prior.angles.get(Channel::Wrist),
        prior.wrist_last_update,
        now,
        hold,
    );
    angles.set(Channel::Wrist, wrist);

    MapperState {
        angles,
        wrist_last_update,
    }
}

/// Stateful wrapper owning the hold rule and the carried state.
#[derive(Debug, Clone)]
pub struct AngleMapper {
    hold: WristHold,
    state: MapperState,
}

impl AngleMapper {
    pub fn new(hold: WristHold, now: Instant) -> Self {
        Self {
            hold,
            state: MapperState::new(now),
        }
    }

    pub fn update(
        &mut self,
        measurement: &HandMeasurement,
        ranges: &CalibrationRanges,
        now: Instant,
    ) -> ServoAngleSet {
        self.state = map_all(
            &measurement.fingers,
            measurement.wrist_span,
            measurement.thumb_y_delta,
            ranges,
            &self.state,
            now,
            &self.hold,
        );
        self.state.angles
    }

    /// Back to center with a fresh hold window.
    pub fn reset(&mut self, now: Instant) {
        self.state = MapperState::new(now);
    }

    pub fn angles(&self) -> ServoAngleSet {
        self.state.angles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn finger_ranges() -> CalibrationRanges {
        CalibrationRanges {
            min: Some(FingerLengths([10.0; 5])),
            max: Some(FingerLengths([50.0; 5])),
            ..Default::default()
        }
    }

    fn wrist_ranges() -> CalibrationRanges {
        CalibrationRanges {
            wrist_min: Some(100.0),
            wrist_max: Some(200.0),
            ..finger_ranges()
        }
    }

    #[test]
    fn midpoint_length_maps_to_ninety() {
        assert_relative_eq!(map_finger(Channel::Thumb, 30.0, &finger_ranges()), 90.0);
    }

    #[test]
    fn out_of_range_lengths_clamp() {
        let r = finger_ranges();
        assert_eq!(map_finger(Channel::Index, 2.0, &r), 0.0);
        assert_eq!(map_finger(Channel::Index, 75.0, &r), 180.0);
        assert_eq!(map_finger(Channel::Index, 10.0, &r), 0.0);
        assert_eq!(map_finger(Channel::Index, 50.0, &r), 180.0);
    }

    #[test]
    fn collapsed_range_is_center() {
        let r = CalibrationRanges {
            min: Some(FingerLengths([40.0; 5])),
            max: Some(FingerLengths([40.0; 5])),
            ..Default::default()
        };
        for l in [0.0, 40.0, 1e6] {
            assert_eq!(map_finger(Channel::Middle, l, &r), CENTER_ANGLE);
        }
    }

    #[test]
    fn inverted_range_is_center() {
        let r = CalibrationRanges {
            min: Some(FingerLengths([60.0; 5])),
            max: Some(FingerLengths([20.0; 5])),
            ..Default::default()
        };
        assert_eq!(map_finger(Channel::Ring, 30.0, &r), CENTER_ANGLE);
    }

    #[test]
    fn unset_bounds_are_center() {
        assert_eq!(map_finger(Channel::Thumb, 30.0, &CalibrationRanges::new()), CENTER_ANGLE);
        assert_eq!(map_finger(Channel::Wrist, 30.0, &finger_ranges()), CENTER_ANGLE);
    }

    #[test]
    fn nan_is_center_and_infinities_clamp() {
        assert_eq!(interpolate(f64::NAN, 0.0, 1.0), CENTER_ANGLE);
        assert_eq!(interpolate(f64::INFINITY, 0.0, 1.0), MAX_ANGLE);
        assert_eq!(interpolate(f64::NEG_INFINITY, 0.0, 1.0), 0.0);
        assert_eq!(interpolate(0.5, 0.0, f64::INFINITY), CENTER_ANGLE);
    }

    #[test]
    fn wrist_without_bounds_keeps_timestamp() {
        let t0 = Instant::now();
        let now = t0 + Duration::from_secs(5);
        let (angle, ts) = map_wrist(150.0, 0.0, &finger_ranges(), 33.0, t0, now, &WristHold::default());
        assert_eq!(angle, CENTER_ANGLE);
        assert_eq!(ts, t0);
    }

    #[test]
    fn wrist_interpolates_and_stamps() {
        let t0 = Instant::now();
        let now = t0 + Duration::from_millis(10);
        let (angle, ts) = map_wrist(150.0, 0.0, &wrist_ranges(), 0.0, t0, now, &WristHold::default());
        assert_relative_eq!(angle, 90.0);
        assert_eq!(ts, now);
    }

    #[test]
    fn wrist_holds_during_thumb_motion() {
        let hold = WristHold::default();
        let r = wrist_ranges();
        let t0 = Instant::now();

        let first = map_wrist(120.0, 25.0, &r, 45.0, t0, t0 + Duration::from_millis(300), &hold);
        let second = map_wrist(180.0, 25.0, &r, first.0, first.1, t0 + Duration::from_millis(700), &hold);
        assert_eq!(first, (45.0, t0));
        assert_eq!(second, first);

        let later = t0 + Duration::from_millis(1200);
        let third = map_wrist(180.0, 25.0, &r, second.0, second.1, later, &hold);
        assert_relative_eq!(third.0, 144.0);
        assert_eq!(third.1, later);
    }

    #[test]
    fn small_thumb_motion_never_holds() {
        let t0 = Instant::now();
        let now = t0 + Duration::from_millis(100);
        let (angle, ts) = map_wrist(200.0, 20.0, &wrist_ranges(), 0.0, t0, now, &WristHold::default());
        assert_eq!(angle, 180.0);
        assert_eq!(ts, now);
    }

    #[test]
    fn map_all_keeps_fingers_until_ready() {
        let t0 = Instant::now();
        let mut prior = MapperState::new(t0);
        prior.angles.set(Channel::Index, 12.0);

        let mut ranges = CalibrationRanges::new();
        ranges.record_max(FingerLengths([50.0; 5]));
        let fingers = FingerLengths([30.0; 5]);
        let next = map_all(&fingers, 150.0, 0.0, &ranges, &prior, t0, &WristHold::default());
        assert_eq!(next.angles.get(Channel::Index), 12.0);
        assert_eq!(next.angles.get(Channel::Wrist), CENTER_ANGLE);

        let next = map_all(&fingers, 150.0, 0.0, &wrist_ranges(), &prior, t0, &WristHold::default());
        for c in Channel::ALL {
            assert_relative_eq!(next.angles.get(c), 90.0);
        }
    }

    #[test]
    fn mapper_reset_recenters() {
        let t0 = Instant::now();
        let mut mapper = AngleMapper::new(WristHold::default(), t0);
        let m = HandMeasurement {
            fingers: FingerLengths([50.0; 5]),
            wrist_span: 200.0,
            thumb_y_delta: 0.0,
        };
        let angles = mapper.update(&m, &wrist_ranges(), t0);
        assert_eq!(angles.get(Channel::Thumb), 180.0);

        mapper.reset(t0);
        assert_eq!(mapper.angles(), ServoAngleSet::default());
    }
}
