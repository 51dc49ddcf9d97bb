use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::geometry::HandMeasurement;
use crate::ranges::CalibrationRanges;
use crate::record::RecordStore;

/// Default settle time before a calibration sample is trusted.
pub const DEFAULT_DWELL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CalibrationTarget {
    /// Open hand, recorded as the maximum finger lengths.
    Open,
    /// Closed hand, recorded as the minimum finger lengths.
    Close,
    WristMin,
    WristMax,
}

impl CalibrationTarget {
    pub fn name(&self) -> &'static str {
        match self {
            CalibrationTarget::Open => "open",
            CalibrationTarget::Close => "close",
            CalibrationTarget::WristMin => "wrist_min",
            CalibrationTarget::WristMax => "wrist_max",
        }
    }

    pub fn instructions(&self) -> &'static str {
        match self {
            CalibrationTarget::Open => "Open your hand and hold steady",
            CalibrationTarget::Close => "Close your hand and hold steady",
            CalibrationTarget::WristMin => "Turn your wrist to the minimum position",
            CalibrationTarget::WristMax => "Turn your wrist to the maximum position",
        }
    }

    pub fn completion_message(&self) -> &'static str {
        match self {
            CalibrationTarget::Open => "Open hand calibration is complete",
            CalibrationTarget::Close => "Close hand calibration is complete",
            CalibrationTarget::WristMin => "Wrist minimum calibration is complete",
            CalibrationTarget::WristMax => "Wrist maximum calibration is complete",
        }
    }

    /// Writes the measurement into this target's slot of the range store.
    pub fn record(&self, m: &HandMeasurement, ranges: &mut CalibrationRanges) {
        match self {
            CalibrationTarget::Open => ranges.record_max(m.fingers),
            CalibrationTarget::Close => ranges.record_min(m.fingers),
            CalibrationTarget::WristMin => ranges.record_wrist_min(m.wrist_span),
            CalibrationTarget::WristMax => ranges.record_wrist_max(m.wrist_span),
        }
    }
}

impl fmt::Display for CalibrationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationState {
    Idle,
    /// Waiting for the first frame after the start command.
    Armed(CalibrationTarget),
    Dwelling {
        target: CalibrationTarget,
        armed_at: Instant,
    },
    /// Sample taken, record not yet persisted. Left within the same tick.
    Captured(CalibrationTarget),
}

impl CalibrationState {
    pub fn target(&self) -> Option<CalibrationTarget> {
        match *self {
            CalibrationState::Idle => None,
            CalibrationState::Armed(t) | CalibrationState::Captured(t) => Some(t),
            CalibrationState::Dwelling { target, .. } => Some(target),
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, CalibrationState::Idle)
    }
}

/// What happened to the session during one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalibrationEvent {
    Idle,
    DwellStarted(CalibrationTarget),
    Dwelling {
        target: CalibrationTarget,
        remaining: Duration,
    },
    /// Dwell is over but no hand was measured this tick.
    AwaitingHand(CalibrationTarget),
    Captured {
        target: CalibrationTarget,
        persisted: bool,
    },
}

/// Drives the idle → armed → dwell → captured cycle for one process run.
#[derive(Debug, Clone)]
pub struct CalibrationSession {
    state: CalibrationState,
    persisted_this_capture: bool,
    dwell: Duration,
}

impl Default for CalibrationSession {
    fn default() -> Self {
        Self::new(DEFAULT_DWELL)
    }
}

impl CalibrationSession {
    pub fn new(dwell: Duration) -> Self {
        Self {
            state: CalibrationState::Idle,
            persisted_this_capture: false,
            dwell,
        }
    }

    pub fn state(&self) -> CalibrationState {
        self.state
    }

    /// Arms a capture. Ignored unless idle; returns whether it was honored.
    pub fn start(&mut self, target: CalibrationTarget) -> bool {
        if !self.state.is_idle() {
            debug!(%target, state = ?self.state, "start ignored, calibration in progress");
            return false;
        }
        self.state = CalibrationState::Armed(target);
        self.persisted_this_capture = false;
        info!(%target, "calibration armed");
        true
    }

    /// Empties the ranges and the stored record, abandoning any capture.
    /// The in-memory reset always happens; the returned error is from the write.
    pub fn clear(
        &mut self,
        ranges: &mut CalibrationRanges,
        store: &mut dyn RecordStore,
    ) -> Result<()> {
        ranges.clear();
        self.state = CalibrationState::Idle;
        self.persisted_this_capture = false;
        info!("calibration cleared");
        store.save(ranges)
    }

    /// Advances the session by one frame.
    pub fn tick(
        &mut self,
        measurement: Option<&HandMeasurement>,
        now: Instant,
        ranges: &mut CalibrationRanges,
        store: &mut dyn RecordStore,
    ) -> CalibrationEvent {
        match self.state {
            CalibrationState::Idle => CalibrationEvent::Idle,
            CalibrationState::Armed(target) => {
                self.state = CalibrationState::Dwelling {
                    target,
                    armed_at: now,
                };
                debug!(%target, "dwell started");
                CalibrationEvent::DwellStarted(target)
            }
            CalibrationState::Dwelling { target, armed_at } => {
                let elapsed = now.saturating_duration_since(armed_at);
                if elapsed < self.dwell {
                    return CalibrationEvent::Dwelling {
                        target,
                        remaining: self.dwell - elapsed,
                    };
                }
                let Some(m) = measurement else {
                    return CalibrationEvent::AwaitingHand(target);
                };
                target.record(m, ranges);
                self.state = CalibrationState::Captured(target);
                info!(%target, elapsed_ms = elapsed.as_millis() as u64, "calibration sample captured");
                warn_if_inverted(target, ranges);
                self.finish_capture(target, ranges, store)
            }
            CalibrationState::Captured(target) => self.finish_capture(target, ranges, store),
        }
    }

    fn finish_capture(
        &mut self,
        target: CalibrationTarget,
        ranges: &CalibrationRanges,
        store: &mut dyn RecordStore,
    ) -> CalibrationEvent {
        if !self.persisted_this_capture {
            match store.save(ranges) {
                Ok(()) => self.persisted_this_capture = true,
                Err(e) => error!(%target, error = %e, "failed to persist calibration record"),
            }
        }
        self.state = CalibrationState::Idle;
        CalibrationEvent::Captured {
            target,
            persisted: self.persisted_this_capture,
        }
    }

    /// Operator prompt for the current state, if any.
    pub fn prompt(&self) -> Option<String> {
        let target = self.state.target()?;
        Some(format!(
            "{}\nCalibration will start in {} seconds",
            target.instructions(),
            self.dwell.as_secs_f64()
        ))
    }
}

/// Open and close, or the two wrist poses, captured the wrong way round
/// leave a range that maps to the center angle.
fn warn_if_inverted(target: CalibrationTarget, ranges: &CalibrationRanges) {
    match target {
        CalibrationTarget::Open | CalibrationTarget::Close => {
            let inverted = ranges.inverted_fingers();
            if !inverted.is_empty() {
                warn!(%target, channels = ?inverted, "closed length not below open length, fingers stay centered");
            }
        }
        CalibrationTarget::WristMin | CalibrationTarget::WristMax => {
            if ranges.is_wrist_inverted() {
                warn!(%target, bounds = ?ranges.wrist_bounds(), "wrist minimum not below maximum, wrist stays centered");
            }
        }
    }
}
