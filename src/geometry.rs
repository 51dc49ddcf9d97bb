use crate::types::{
    FingerLengths, Landmark, LandmarkSnapshot, FINGER_TIPS, LANDMARK_COUNT, LITTLE_TIP, THUMB_TIP,
    WRIST,
};

/// Distances measured from one snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandMeasurement {
    pub fingers: FingerLengths,
    /// Thumb tip to little tip, a proxy for wrist rotation.
    pub wrist_span: f64,
    /// Vertical offset between thumb tip and wrist, in pixels.
    pub thumb_y_delta: f64,
}

pub fn distance(a: Landmark, b: Landmark) -> f64 {
    let dx = f64::from(a.x) - f64::from(b.x);
    let dy = f64::from(a.y) - f64::from(b.y);
    dx.hypot(dy)
}

/// Returns `None` when the snapshot is empty or any of the 21 landmark ids
/// is missing. Callers treat that as "no measurement this frame".
pub fn measure(snapshot: &LandmarkSnapshot) -> Option<HandMeasurement> {
    if snapshot.is_empty() {
        return None;
    }

    let mut by_id: [Option<Landmark>; LANDMARK_COUNT] = [None; LANDMARK_COUNT];
    for lm in &snapshot.points {
        if let Some(slot) = by_id.get_mut(lm.id as usize) {
            slot.get_or_insert(*lm);
        }
    }
    if by_id.iter().any(Option::is_none) {
        return None;
    }
    let at = |id: u32| by_id[id as usize];

    let wrist = at(WRIST)?;
    let mut fingers = [0.0; 5];
    for (slot, tip) in fingers.iter_mut().zip(FINGER_TIPS) {
        *slot = distance(at(tip)?, wrist);
    }

    let thumb = at(THUMB_TIP)?;
    let little = at(LITTLE_TIP)?;

    Some(HandMeasurement {
        fingers: FingerLengths(fingers),
        wrist_span: distance(thumb, little),
        thumb_y_delta: (f64::from(thumb.y) - f64::from(wrist.y)).abs(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// A hand with the wrist at the origin and each tip straight above it.
    fn upright_hand(tip_heights: [i32; 5]) -> LandmarkSnapshot {
        let mut points: Vec<Landmark> = (0..LANDMARK_COUNT as u32)
            .map(|id| Landmark::new(id, 0, 0))
            .collect();
        for (i, tip) in FINGER_TIPS.iter().enumerate() {
            points[*tip as usize] = Landmark::new(*tip, i as i32 * 10, -tip_heights[i]);
        }
        LandmarkSnapshot::new(points)
    }

    #[test]
    fn empty_snapshot_is_unavailable() {
        assert!(measure(&LandmarkSnapshot::empty()).is_none());
    }

    #[test]
    fn partial_snapshot_is_unavailable() {
        let mut snap = upright_hand([50, 80, 90, 85, 70]);
        snap.points.retain(|p| p.id != 12);
        assert!(measure(&snap).is_none());
    }

    #[test]
    fn measures_fingers_span_and_thumb_delta() {
        let snap = upright_hand([50, 80, 90, 85, 70]);
        let m = measure(&snap).unwrap();

        assert_relative_eq!(m.fingers.0[0], 50.0);
        assert_relative_eq!(m.fingers.0[1], (10.0f64 * 10.0 + 80.0 * 80.0).sqrt());
        assert_relative_eq!(m.wrist_span, (40.0f64 * 40.0 + 20.0 * 20.0).sqrt());
        assert_relative_eq!(m.thumb_y_delta, 50.0);
    }

    #[test]
    fn lookup_is_by_id_not_position() {
        let mut snap = upright_hand([50, 80, 90, 85, 70]);
        let expected = measure(&snap).unwrap();
        snap.points.reverse();
        assert_eq!(measure(&snap), Some(expected));
    }

    #[test]
    fn out_of_range_ids_are_ignored() {
        let mut snap = upright_hand([50, 80, 90, 85, 70]);
        snap.points.push(Landmark::new(99, 1000, 1000));
        assert!(measure(&snap).is_some());
    }
}
