use serde::{Deserialize, Serialize};
use std::io::Write;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::types::Channel;

/// Explicit handle to the servo transport, released once at shutdown.
/// Writes are fire-and-forget; the controller only logs their failures.
pub trait ActuatorSink {
    fn name(&self) -> String;

    fn write(&mut self, channel: Channel, angle: f64) -> Result<()>;

    /// Gives the hardware back. Called exactly once by the controller.
    fn release(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<S: ActuatorSink + ?Sized> ActuatorSink for Box<S> {
    fn name(&self) -> String {
        (**self).name()
    }

    fn write(&mut self, channel: Channel, angle: f64) -> Result<()> {
        (**self).write(channel, angle)
    }

    fn release(&mut self) -> Result<()> {
        (**self).release()
    }
}

/// Digital output pin driving each channel's servo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelPins {
    pub thumb: u8,
    pub index: u8,
    pub middle: u8,
    pub ring: u8,
    pub little: u8,
    pub wrist: u8,
}

impl Default for ChannelPins {
    fn default() -> Self {
        Self {
            thumb: 3,
            index: 5,
            middle: 6,
            ring: 9,
            little: 10,
            wrist: 11,
        }
    }
}

impl ChannelPins {
    pub fn pin(&self, channel: Channel) -> u8 {
        match channel {
            Channel::Thumb => self.thumb,
            Channel::Index => self.index,
            Channel::Middle => self.middle,
            Channel::Ring => self.ring,
            Channel::Little => self.little,
            Channel::Wrist => self.wrist,
        }
    }

    /// Firmata pin descriptor, e.g. `d:3:s` for a servo on digital pin 3.
    pub fn descriptor(&self, channel: Channel) -> String {
        format!("d:{}:s", self.pin(channel))
    }
}

/// Reports writes through `tracing` only. Useful without hardware attached.
#[derive(Debug, Clone, Default)]
pub struct LogSink {
    pins: ChannelPins,
    writes: u64,
}

impl LogSink {
    pub fn new(pins: ChannelPins) -> Self {
        Self { pins, writes: 0 }
    }
}

impl ActuatorSink for LogSink {
    fn name(&self) -> String {
        "log".to_string()
    }

    fn write(&mut self, channel: Channel, angle: f64) -> Result<()> {
        self.writes += 1;
        debug!(%channel, pin = %self.pins.descriptor(channel), angle, "servo write");
        Ok(())
    }

    fn release(&mut self) -> Result<()> {
        info!(writes = self.writes, "log sink released");
        Ok(())
    }
}

#[derive(Serialize)]
struct WriteLine<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    port: Option<&'a str>,
    channel: Channel,
    pin: u8,
    angle: f64,
}

/// Emits one JSON object per write, for a downstream servo bridge.
pub struct JsonLinesSink<W: Write> {
    out: W,
    pins: ChannelPins,
    port: Option<String>,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W, pins: ChannelPins, port: Option<String>) -> Self {
        Self { out, pins, port }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ActuatorSink for JsonLinesSink<W> {
    fn name(&self) -> String {
        match &self.port {
            Some(port) => format!("json ({port})"),
            None => "json".to_string(),
        }
    }

    fn write(&mut self, channel: Channel, angle: f64) -> Result<()> {
        let line = WriteLine {
            port: self.port.as_deref(),
            channel,
            pin: self.pins.pin(channel),
            angle,
        };
        let fail = |e: &dyn std::fmt::Display| Error::ActuatorWrite {
            channel: channel.to_string(),
            reason: e.to_string(),
        };
        serde_json::to_writer(&mut self.out, &line).map_err(|e| fail(&e))?;
        self.out.write_all(b"\n").map_err(|e| fail(&e))?;
        Ok(())
    }

    fn release(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}
