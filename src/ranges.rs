use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{Channel, FingerLengths};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CalibrationRanges {
    /// Closed-hand finger lengths.
    pub min: Option<FingerLengths>,
    /// Open-hand finger lengths.
    pub max: Option<FingerLengths>,
    pub wrist_min: Option<f64>,
    pub wrist_max: Option<f64>,
}

/// On-disk shape: `{"min": [..]|[], "max": [..]|[], "wrist": {"min_length", "max_length"}}`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct CalibrationRecord {
    min: Vec<f64>,
    max: Vec<f64>,
    wrist: WristRecord,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct WristRecord {
    min_length: Option<f64>,
    max_length: Option<f64>,
}

impl CalibrationRanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_min(&mut self, lengths: FingerLengths) {
        self.min = Some(lengths);
    }

    pub fn record_max(&mut self, lengths: FingerLengths) {
        self.max = Some(lengths);
    }

    pub fn record_wrist_min(&mut self, span: f64) {
        self.wrist_min = Some(span);
    }

    pub fn record_wrist_max(&mut self, span: f64) {
        self.wrist_max = Some(span);
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_finger_ready(&self) -> bool {
        self.min.is_some() && self.max.is_some()
    }

    pub fn is_wrist_ready(&self) -> bool {
        self.wrist_min.is_some() && self.wrist_max.is_some()
    }

    /// Both wrist bounds, if set.
    pub fn wrist_bounds(&self) -> Option<(f64, f64)> {
        Some((self.wrist_min?, self.wrist_max?))
    }

    /// Finger channels whose closed length is not below the open length.
    pub fn inverted_fingers(&self) -> Vec<Channel> {
        let (Some(min), Some(max)) = (self.min, self.max) else {
            return Vec::new();
        };
        Channel::FINGERS
            .into_iter()
            .filter(|&c| match (min.get(c), max.get(c)) {
                (Some(lo), Some(hi)) => lo >= hi,
                _ => false,
            })
            .collect()
    }

    pub fn is_wrist_inverted(&self) -> bool {
        matches!(self.wrist_bounds(), Some((lo, hi)) if lo >= hi)
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        let to_vec = |f: Option<FingerLengths>| f.map(|l| l.0.to_vec()).unwrap_or_default();
        let record = CalibrationRecord {
            min: to_vec(self.min),
            max: to_vec(self.max),
            wrist: WristRecord {
                min_length: self.wrist_min,
                max_length: self.wrist_max,
            },
        };
        Ok(serde_json::to_vec_pretty(&record)?)
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        let record: CalibrationRecord = serde_json::from_slice(bytes)
            .map_err(|e| Error::MalformedRecord(e.to_string()))?;

        let lengths = |values: &[f64], field: &str| -> Result<Option<FingerLengths>> {
            if values.is_empty() {
                return Ok(None);
            }
            if values.iter().any(|v| !v.is_finite()) {
                return Err(Error::MalformedRecord(format!("non-finite value in {field}")));
            }
            FingerLengths::try_from(values)
                .map(Some)
                .map_err(|e| Error::MalformedRecord(format!("{field}: {e}")))
        };
        let span = |value: Option<f64>, field: &str| -> Result<Option<f64>> {
            match value {
                Some(v) if !v.is_finite() => {
                    Err(Error::MalformedRecord(format!("non-finite {field}")))
                }
                other => Ok(other),
            }
        };

        Ok(Self {
            min: lengths(&record.min, "min")?,
            max: lengths(&record.max, "max")?,
            wrist_min: span(record.wrist.min_length, "wrist.min_length")?,
            wrist_max: span(record.wrist.max_length, "wrist.max_length")?,
        })
    }
}
