use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Number of landmarks the detector reports per hand.
pub const LANDMARK_COUNT: usize = 21;

pub const WRIST: u32 = 0;
pub const THUMB_TIP: u32 = 4;
pub const INDEX_TIP: u32 = 8;
pub const MIDDLE_TIP: u32 = 12;
pub const RING_TIP: u32 = 16;
pub const LITTLE_TIP: u32 = 20;

/// Digit tips in channel order, thumb to little.
pub const FINGER_TIPS: [u32; 5] = [THUMB_TIP, INDEX_TIP, MIDDLE_TIP, RING_TIP, LITTLE_TIP];

/// Servo angle used when a channel has nothing better to say.
pub const CENTER_ANGLE: f64 = 90.0;
pub const MAX_ANGLE: f64 = 180.0;

/// A single labeled point in pixel space. Serialized as `[id, x, y]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(u32, i32, i32)", into = "(u32, i32, i32)")]
pub struct Landmark {
    pub id: u32,
    pub x: i32,
    pub y: i32,
}

impl Landmark {
    pub fn new(id: u32, x: i32, y: i32) -> Self {
        Self { id, x, y }
    }
}

impl From<(u32, i32, i32)> for Landmark {
    fn from((id, x, y): (u32, i32, i32)) -> Self {
        Self { id, x, y }
    }
}

impl From<Landmark> for (u32, i32, i32) {
    fn from(lm: Landmark) -> Self {
        (lm.id, lm.x, lm.y)
    }
}

/// All landmarks of one observed hand in one frame. Empty means no hand.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LandmarkSnapshot {
    pub points: Vec<Landmark>,
}

impl LandmarkSnapshot {
    pub fn new(points: Vec<Landmark>) -> Self {
        Self { points }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Looks a landmark up by id rather than by position, so a detector that
    /// reorders or drops points cannot shift the anatomy.
    pub fn get(&self, id: u32) -> Option<Landmark> {
        self.points.iter().copied().find(|p| p.id == id)
    }
}

/// Wrist-to-tip distance per digit, thumb first.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FingerLengths(pub [f64; 5]);

impl FingerLengths {
    pub fn get(&self, channel: Channel) -> Option<f64> {
        channel.finger_index().map(|i| self.0[i])
    }
}

impl TryFrom<&[f64]> for FingerLengths {
    type Error = Error;

    fn try_from(values: &[f64]) -> Result<Self, Self::Error> {
        let arr: [f64; 5] = values.try_into().map_err(|_| {
            Error::MalformedRecord(format!("expected 5 finger lengths, got {}", values.len()))
        })?;
        Ok(Self(arr))
    }
}

/// One independently actuated degree of freedom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Thumb,
    Index,
    Middle,
    Ring,
    Little,
    Wrist,
}

impl Channel {
    pub const ALL: [Channel; 6] = [
        Channel::Thumb,
        Channel::Index,
        Channel::Middle,
        Channel::Ring,
        Channel::Little,
        Channel::Wrist,
    ];

    pub const FINGERS: [Channel; 5] = [
        Channel::Thumb,
        Channel::Index,
        Channel::Middle,
        Channel::Ring,
        Channel::Little,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Channel::Thumb => "thumb",
            Channel::Index => "index",
            Channel::Middle => "middle",
            Channel::Ring => "ring",
            Channel::Little => "little",
            Channel::Wrist => "wrist",
        }
    }

    /// Position in [`FingerLengths`], `None` for the wrist.
    pub fn finger_index(&self) -> Option<usize> {
        match self {
            Channel::Wrist => None,
            other => Some(*other as usize),
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Channel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Channel::ALL
            .iter()
            .copied()
            .find(|c| c.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnknownChannel(s.to_string()))
    }
}

/// Current commanded angle for each of the six channels, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServoAngleSet {
    angles: [f64; 6],
}

impl Default for ServoAngleSet {
    fn default() -> Self {
        Self {
            angles: [CENTER_ANGLE; 6],
        }
    }
}

impl ServoAngleSet {
    pub fn get(&self, channel: Channel) -> f64 {
        self.angles[channel as usize]
    }

    pub fn set(&mut self, channel: Channel, angle: f64) {
        self.angles[channel as usize] = angle;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Channel, f64)> + '_ {
        Channel::ALL.iter().map(move |c| (*c, self.get(*c)))
    }
}
