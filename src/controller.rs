use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::actuator::ActuatorSink;
use crate::calibration::{CalibrationEvent, CalibrationSession, CalibrationTarget, DEFAULT_DWELL};
use crate::command::OperatorCommand;
use crate::error::Result;
use crate::geometry::{self, HandMeasurement};
use crate::mapping::{AngleMapper, WristHold};
use crate::ranges::CalibrationRanges;
use crate::record::RecordStore;
use crate::source::Frame;
use crate::types::{Channel, LandmarkSnapshot, ServoAngleSet, CENTER_ANGLE};

#[derive(Debug, Clone, PartialEq)]
pub struct ControllerSettings {
    pub dwell: Duration,
    pub hold: WristHold,
    pub hand_index: usize,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            dwell: DEFAULT_DWELL,
            hold: WristHold::default(),
            hand_index: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Started(CalibrationTarget),
    /// Start command issued while a capture was already in progress.
    Ignored(CalibrationTarget),
    Cleared,
    Quit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub measurement: Option<HandMeasurement>,
    pub calibration: CalibrationEvent,
    /// Angles sent to the sink this tick, if finger mapping is ready.
    pub angles: Option<ServoAngleSet>,
    pub write_failures: usize,
}

/// Result of feeding one source frame through the controller.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub commands: Vec<CommandOutcome>,
    /// `None` when the frame carried a quit command.
    pub report: Option<TickReport>,
}

impl Step {
    pub fn quit(&self) -> bool {
        self.commands.contains(&CommandOutcome::Quit)
    }
}

pub struct HandController<S: ActuatorSink, R: RecordStore> {
    session: CalibrationSession,
    ranges: CalibrationRanges,
    mapper: AngleMapper,
    sink: S,
    store: R,
    hand_index: usize,
    released: bool,
}

impl<S: ActuatorSink, R: RecordStore> HandController<S, R> {
    /// Takes ownership of the sink and store; the stored record seeds the ranges.
    pub fn new(sink: S, store: R, settings: ControllerSettings, now: Instant) -> Self {
        let ranges = store.load();
        info!(
            sink = %sink.name(),
            fingers_ready = ranges.is_finger_ready(),
            wrist_ready = ranges.is_wrist_ready(),
            "controller ready"
        );
        Self {
            session: CalibrationSession::new(settings.dwell),
            ranges,
            mapper: AngleMapper::new(settings.hold, now),
            sink,
            store,
            hand_index: settings.hand_index,
            released: false,
        }
    }

    pub fn session(&self) -> &CalibrationSession {
        &self.session
    }

    pub fn ranges(&self) -> &CalibrationRanges {
        &self.ranges
    }

    pub fn angles(&self) -> ServoAngleSet {
        self.mapper.angles()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn store(&self) -> &R {
        &self.store
    }

    pub fn handle_command(&mut self, command: OperatorCommand, now: Instant) -> CommandOutcome {
        if let Some(target) = command.target() {
            return if self.session.start(target) {
                CommandOutcome::Started(target)
            } else {
                CommandOutcome::Ignored(target)
            };
        }
        match command {
            OperatorCommand::ClearCalibration => {
                if let Err(e) = self.session.clear(&mut self.ranges, &mut self.store) {
                    error!(error = %e, "failed to persist cleared calibration record");
                }
                self.mapper.reset(now);
                self.write_all(&ServoAngleSet::default());
                CommandOutcome::Cleared
            }
            _ => CommandOutcome::Quit,
        }
    }

    /// Runs one tick on a single hand snapshot.
    pub fn tick(&mut self, snapshot: &LandmarkSnapshot, now: Instant) -> TickReport {
        let measurement = geometry::measure(snapshot);
        if measurement.is_none() {
            debug!(points = snapshot.points.len(), "no usable hand this tick");
        }

        let was_ready = self.ranges.is_finger_ready();
        let calibration = self.session.tick(measurement.as_ref(), now, &mut self.ranges, &mut self.store);
        if !was_ready && self.ranges.is_finger_ready() {
            info!("finger ranges complete, servo mapping enabled");
        }

        if !self.ranges.is_finger_ready() {
            return TickReport {
                measurement,
                calibration,
                angles: None,
                write_failures: 0,
            };
        }

        let angles = match &measurement {
            Some(m) => self.mapper.update(m, &self.ranges, now),
            // Re-send the last angles so a failed write heals on the next tick.
            None => self.mapper.angles(),
        };
        let write_failures = self.write_all(&angles);

        TickReport {
            measurement,
            calibration,
            angles: Some(angles),
            write_failures,
        }
    }

    /// Applies a frame's keys in order, then ticks on the configured hand.
    /// Unknown keys are logged and skipped; a quit ends the frame early.
    pub fn step(&mut self, frame: &Frame, now: Instant) -> Step {
        let mut commands = Vec::new();
        for key in frame.keys.chars().filter(|c| !c.is_whitespace()) {
            let command = match OperatorCommand::from_key(key) {
                Ok(c) => c,
                Err(e) => {
                    warn!(error = %e, "rejected operator input");
                    continue;
                }
            };
            let outcome = self.handle_command(command, now);
            commands.push(outcome);
            if outcome == CommandOutcome::Quit {
                return Step {
                    commands,
                    report: None,
                };
            }
        }

        let report = self.tick(&frame.hand(self.hand_index), now);
        Step {
            commands,
            report: Some(report),
        }
    }

    /// Recenters every channel and releases the sink.
    pub fn shutdown(mut self) -> Result<()> {
        self.release()
    }

    fn write_all(&mut self, angles: &ServoAngleSet) -> usize {
        let mut failures = 0;
        for (channel, angle) in angles.iter() {
            if let Err(e) = self.sink.write(channel, angle) {
                failures += 1;
                warn!(%channel, angle, error = %e, "servo write failed");
            }
        }
        failures
    }

    fn release(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        for channel in Channel::ALL {
            if let Err(e) = self.sink.write(channel, CENTER_ANGLE) {
                warn!(%channel, error = %e, "could not recenter servo");
            }
        }
        self.sink.release()?;
        info!(sink = %self.sink.name(), "actuator released");
        Ok(())
    }
}

impl<S: ActuatorSink, R: RecordStore> Drop for HandController<S, R> {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            error!(error = %e, "actuator release failed");
        }
    }
}
