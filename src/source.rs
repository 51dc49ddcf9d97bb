use serde::Deserialize;
use std::f64::consts::PI;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::types::{Landmark, LandmarkSnapshot, FINGER_TIPS, LANDMARK_COUNT, WRIST};

/// One tick worth of input: the hands seen plus any operator keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    pub hands: Vec<LandmarkSnapshot>,
    pub keys: String,
    /// Time since the start of the stream, when the source records it.
    pub at: Option<Duration>,
}

impl Frame {
    /// The requested hand, or an empty snapshot when it was not observed.
    pub fn hand(&self, index: usize) -> LandmarkSnapshot {
        self.hands.get(index).cloned().unwrap_or_default()
    }
}

pub trait LandmarkSource {
    fn name(&self) -> String;
    /// `Ok(None)` once the stream is exhausted.
    fn next_frame(&mut self) -> Result<Option<Frame>>;
}

#[derive(Debug, Deserialize)]
struct ReplayLine {
    #[serde(default)]
    at_ms: Option<u64>,
    #[serde(default)]
    hands: Vec<LandmarkSnapshot>,
    #[serde(default)]
    keys: String,
}

/// Reads frames from JSON lines such as
/// `{"at_ms": 33, "hands": [[[0, 640, 600], ...]], "keys": "o"}`.
/// Blank lines and lines starting with `#` are skipped.
pub struct ReplaySource<R: BufRead> {
    reader: R,
    label: String,
    line_no: usize,
}

impl<R: BufRead> ReplaySource<R> {
    pub fn new(reader: R, label: impl Into<String>) -> Self {
        Self {
            reader,
            label: label.into(),
            line_no: 0,
        }
    }
}

/// Replay over a file or standard input.
pub type ReplayFile = ReplaySource<Box<dyn BufRead>>;

impl ReplayFile {
    /// Opens a replay file, or standard input for `-`.
    pub fn open(path: &Path) -> Result<Self> {
        if path.as_os_str() == "-" {
            let stdin: Box<dyn BufRead> = Box::new(BufReader::new(io::stdin()));
            return Ok(Self::new(stdin, "stdin"));
        }
        let file = File::open(path)?;
        let reader: Box<dyn BufRead> = Box::new(BufReader::new(file));
        Ok(Self::new(reader, path.display().to_string()))
    }
}

impl<R: BufRead> LandmarkSource for ReplaySource<R> {
    fn name(&self) -> String {
        format!("replay ({})", self.label)
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if self.reader.read_until(b'\n', &mut buf)? == 0 {
                return Ok(None);
            }
            self.line_no += 1;
            let line = std::str::from_utf8(&buf)
                .map_err(|e| Error::Source(format!("{} line {}: {}", self.label, self.line_no, e)))?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let parsed: ReplayLine = serde_json::from_str(trimmed)
                .map_err(|e| Error::Source(format!("{} line {}: {}", self.label, self.line_no, e)))?;
            return Ok(Some(Frame {
                hands: parsed.hands,
                keys: parsed.keys,
                at: parsed.at_ms.map(Duration::from_millis),
            }));
        }
    }
}

/// Synthetic hand for running without a camera.
///
/// The first four phases hold a pose and press the matching calibration key
/// (open, close, wrist min, wrist max); afterwards the hand keeps opening,
/// closing and rotating.
pub struct SimulatedHand {
    frame_count: u64,
    width: f64,
    height: f64,
    interval: Duration,
    phase_frames: u64,
}

// Tip direction from vertical (radians) and open length as a fraction of frame height.
const TIP_LAYOUT: [(f64, f64); 5] = [(-0.9, 0.28), (-0.3, 0.38), (0.0, 0.42), (0.25, 0.39), (0.5, 0.32)];
const CLOSED_FRACTION: f64 = 0.45;
const SCRIPT: [(char, f64, f64); 4] = [('o', 1.0, 0.0), ('c', 0.0, 0.0), ('m', 1.0, 1.0), ('x', 1.0, 0.0)];

impl SimulatedHand {
    pub fn new(width: u32, height: u32, interval: Duration) -> Self {
        let interval = interval.max(Duration::from_millis(1));
        // Three seconds per scripted pose leaves room for the two second dwell.
        let phase_frames = (3000 / interval.as_millis().max(1) as u64).max(1);
        Self {
            frame_count: 0,
            width: f64::from(width),
            height: f64::from(height),
            interval,
            phase_frames,
        }
    }

    /// Openness in `[0, 1]` and wrist rotation in `[0, 1]` for a frame.
    fn pose(&self, frame: u64) -> (f64, f64, Option<char>) {
        let phase = (frame / self.phase_frames) as usize;
        if let Some(&(key, openness, rotation)) = SCRIPT.get(phase) {
            let key = (frame % self.phase_frames == 1).then_some(key);
            return (openness, rotation, key);
        }
        let t = frame as f64 * 0.05;
        (0.5 + 0.5 * t.sin(), 0.5 + 0.5 * (0.37 * t).sin(), None)
    }

    fn landmarks(&self, openness: f64, rotation: f64) -> LandmarkSnapshot {
        let cx = self.width / 2.0;
        let wrist = (cx, self.height * 0.85);
        // Rotating the wrist foreshortens the hand horizontally.
        let squeeze = 1.0 - 0.6 * rotation;
        let to_px = |x: f64, y: f64| ((cx + (x - cx) * squeeze).round() as i32, y.round() as i32);

        let mut points = Vec::with_capacity(LANDMARK_COUNT);
        let (wx, wy) = to_px(wrist.0, wrist.1);
        points.push(Landmark::new(WRIST, wx, wy));

        for (finger, (angle, open_len)) in TIP_LAYOUT.iter().enumerate() {
            let len = self.height * open_len * (CLOSED_FRACTION + (1.0 - CLOSED_FRACTION) * openness);
            let tip_id = FINGER_TIPS[finger];
            // Joints sit evenly along the wrist-to-tip line, tip last.
            for joint in 1..=4u32 {
                let f = f64::from(joint) / 4.0;
                let x = wrist.0 + angle.sin() * len * f;
                let y = wrist.1 - angle.cos() * len * f;
                let (px, py) = to_px(x, y);
                points.push(Landmark::new(tip_id - 4 + joint, px, py));
            }
        }
        LandmarkSnapshot::new(points)
    }
}

impl LandmarkSource for SimulatedHand {
    fn name(&self) -> String {
        "simulated hand".to_string()
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        let frame = self.frame_count;
        self.frame_count += 1;

        let (openness, rotation, key) = self.pose(frame);
        // Drop the hand for a moment now and then, as a real detector would.
        let visible = (frame as f64 * 0.01 * PI).cos() > -0.98;
        let hands = if visible {
            vec![self.landmarks(openness, rotation)]
        } else {
            Vec::new()
        };

        Ok(Some(Frame {
            hands,
            keys: key.map(String::from).unwrap_or_default(),
            at: Some(self.interval * frame as u32),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::measure;

    #[test]
    fn replay_parses_frames_and_skips_comments() {
        let input = "# recorded session\n\n\
                     {\"at_ms\": 0, \"keys\": \"o\"}\n\
                     {\"at_ms\": 40, \"hands\": [[[0, 1, 2], [4, 3, 4]]]}\n";
        let mut src = ReplaySource::new(input.as_bytes(), "inline");

        let first = src.next_frame().unwrap().unwrap();
        assert_eq!(first.keys, "o");
        assert!(first.hand(0).is_empty());
        assert_eq!(first.at, Some(Duration::ZERO));

        let second = src.next_frame().unwrap().unwrap();
        assert_eq!(second.hand(0).get(4), Some(Landmark::new(4, 3, 4)));
        assert!(second.hand(1).is_empty());

        assert!(src.next_frame().unwrap().is_none());
    }

    #[test]
    fn replay_reports_bad_lines() {
        let mut src = ReplaySource::new("{\"hands\": 5}\n".as_bytes(), "inline");
        let err = src.next_frame().unwrap_err();
        assert!(matches!(err, Error::Source(ref msg) if msg.contains("line 1")));
    }

    #[test]
    fn replay_skips_past_invalid_utf8() {
        let input: &[u8] = b"{\"keys\": \"\xff\"}\n{\"keys\": \"c\"}\n";
        let mut src = ReplaySource::new(input, "inline");

        let err = src.next_frame().unwrap_err();
        assert!(matches!(err, Error::Source(ref msg) if msg.contains("line 1")));

        let next = src.next_frame().unwrap().unwrap();
        assert_eq!(next.keys, "c");
    }

    #[test]
    fn simulated_hand_is_measurable() {
        let sim = SimulatedHand::new(1280, 720, Duration::from_millis(33));
        let m = measure(&sim.landmarks(1.0, 0.0)).unwrap();
        let closed = measure(&sim.landmarks(0.0, 0.0)).unwrap();
        for i in 0..5 {
            assert!(m.fingers.0[i] > closed.fingers.0[i]);
        }
        let rotated = measure(&sim.landmarks(1.0, 1.0)).unwrap();
        assert!(rotated.wrist_span < m.wrist_span);
    }

    #[test]
    fn simulated_script_presses_each_key_once() {
        let mut sim = SimulatedHand::new(640, 480, Duration::from_millis(100));
        let mut keys = String::new();
        for _ in 0..200 {
            keys.push_str(&sim.next_frame().unwrap().unwrap().keys);
        }
        assert_eq!(keys, "ocmx");
    }
}
