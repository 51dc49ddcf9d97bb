//! Maps tracked hand landmarks to servo angles for a prosthetic hand.
//!
//! A [`calibration::CalibrationSession`] learns the operator's open/closed
//! finger lengths and wrist rotation span; the [`mapping`] functions then turn
//! live measurements into six clamped servo angles, which a
//! [`controller::HandController`] forwards to an [`actuator::ActuatorSink`].

pub mod actuator;
pub mod calibration;
pub mod clock;
pub mod command;
pub mod config;
pub mod controller;
pub mod error;
pub mod geometry;
pub mod logging;
pub mod mapping;
pub mod ranges;
pub mod record;
pub mod source;
pub mod types;

pub use error::{Error, Result};
